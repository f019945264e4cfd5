// Sequential script runner: owns ordering, loop bodies and stop conditions.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::broadcast;

use crate::config::{AppConfig, RunnerConfig};
use crate::device::channel_from_config;
use crate::engine::event_bus::EventBus;
use crate::engine::history::RunHistory;
use crate::engine::limits::RunGuard;
use crate::engine::state::{LoopPosition, RunEvent, RunReport, RunStatus, StepRecord};
use crate::executor::loop_marker::{is_loop_end, is_loop_start, loop_signal};
use crate::executor::{DeviceScreen, SmartExecutor, StepRouter};
use crate::step::{ExecutionResult, Step};

/// Caller-owned stop switch. Checked between steps; a step already in
/// flight runs to completion.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum Block<'a> {
    Single(&'a Step),
    Loop {
        start: &'a Step,
        body: Vec<Block<'a>>,
        end: Option<&'a Step>,
    },
}

enum Flow {
    Continue,
    Stop(RunStatus),
}

/// Pairs loop markers into nested blocks. A stray `loop_end` runs as a
/// plain checkpoint; an unclosed `loop_start` spans the rest of the script.
fn build_blocks<'a>(steps: &[&'a Step]) -> Vec<Block<'a>> {
    let mut open: Vec<(&'a Step, Vec<Block<'a>>)> = Vec::new();
    let mut top = Vec::new();

    for &step in steps {
        if is_loop_start(step) {
            open.push((step, Vec::new()));
            continue;
        }
        let block = if is_loop_end(step) {
            match open.pop() {
                Some((start, body)) => Block::Loop {
                    start,
                    body,
                    end: Some(step),
                },
                None => {
                    tracing::warn!(step_id = %step.id, "loop_end without loop_start");
                    Block::Single(step)
                }
            }
        } else {
            Block::Single(step)
        };
        push_block(&mut open, &mut top, block);
    }

    while let Some((start, body)) = open.pop() {
        tracing::warn!(step_id = %start.id, "loop_start without loop_end; body runs to end of script");
        push_block(
            &mut open,
            &mut top,
            Block::Loop {
                start,
                body,
                end: None,
            },
        );
    }
    top
}

fn push_block<'a>(open: &mut [(&'a Step, Vec<Block<'a>>)], top: &mut Vec<Block<'a>>, block: Block<'a>) {
    match open.last_mut() {
        Some((_, body)) => body.push(block),
        None => top.push(block),
    }
}

struct RunContext {
    run_id: String,
    device_id: String,
    guard: RunGuard,
    records: Vec<StepRecord>,
    history: Option<RunHistory>,
    position: Option<LoopPosition>,
    /// Set inside loops that tolerate body failures.
    continue_on_error: bool,
}

pub struct ScriptRunner {
    router: StepRouter,
    smart: Arc<dyn SmartExecutor>,
    screen: DeviceScreen,
    config: RunnerConfig,
    events: EventBus,
    abort: AbortHandle,
}

impl ScriptRunner {
    pub fn new(
        router: StepRouter,
        smart: Arc<dyn SmartExecutor>,
        screen: DeviceScreen,
        config: RunnerConfig,
    ) -> Self {
        Self {
            router,
            smart,
            screen,
            config,
            events: EventBus::new(),
            abort: AbortHandle::default(),
        }
    }

    /// ADB-backed runner using the configured screen and limits.
    pub fn from_config(config: &AppConfig, smart: Arc<dyn SmartExecutor>) -> Self {
        let router = StepRouter::new(channel_from_config(&config.device));
        Self::new(
            router,
            smart,
            config.device.default_screen(),
            config.runner.clone(),
        )
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    /// Runs enabled steps in `order` (ties keep input order) against one device.
    pub async fn run(&self, device_id: &str, steps: &[Step]) -> RunReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now();

        let mut ordered: Vec<&Step> = steps.iter().filter(|s| s.enabled).collect();
        ordered.sort_by_key(|s| s.order);
        let blocks = build_blocks(&ordered);
        tracing::info!(
            run_id = %run_id,
            device = device_id,
            total = ordered.len(),
            disabled = steps.len() - ordered.len(),
            "script run started"
        );
        self.events.publish(RunEvent::RunStarted {
            run_id: run_id.clone(),
            device_id: device_id.to_string(),
            total_steps: ordered.len(),
        });

        let history = if self.config.record_history {
            match RunHistory::new(&run_id, self.config.history_dir.as_deref()) {
                Ok(history) => Some(history),
                Err(e) => {
                    tracing::warn!(error = %e, "run history disabled");
                    None
                }
            }
        } else {
            None
        };

        let mut ctx = RunContext {
            run_id: run_id.clone(),
            device_id: device_id.to_string(),
            guard: RunGuard::from_config(&self.config),
            records: Vec::new(),
            history,
            position: None,
            continue_on_error: false,
        };
        let status = match self.run_blocks(&mut ctx, &blocks).await {
            Flow::Continue => RunStatus::Completed,
            Flow::Stop(status) => status,
        };

        tracing::info!(run_id = %run_id, ?status, steps = ctx.records.len(), "script run finished");
        self.events.publish(RunEvent::RunFinished {
            run_id: run_id.clone(),
            status: status.clone(),
        });
        RunReport {
            run_id,
            device_id: device_id.to_string(),
            status,
            records: ctx.records,
            started_at,
            finished_at: chrono::Utc::now(),
        }
    }

    fn run_blocks<'s, 'b: 's>(
        &'s self,
        ctx: &'s mut RunContext,
        blocks: &'s [Block<'b>],
    ) -> BoxFuture<'s, Flow> {
        async move {
            for block in blocks {
                let flow = match block {
                    Block::Single(step) => match self.run_step(ctx, step).await {
                        Ok(_) => Flow::Continue,
                        Err(status) => Flow::Stop(status),
                    },
                    Block::Loop { start, body, end } => self.run_loop(ctx, start, body, *end).await,
                };
                if let Flow::Stop(status) = flow {
                    return Flow::Stop(status);
                }
            }
            Flow::Continue
        }
        .boxed()
    }

    async fn run_loop(
        &self,
        ctx: &mut RunContext,
        start: &Step,
        body: &[Block<'_>],
        end: Option<&Step>,
    ) -> Flow {
        let started = match self.run_step(ctx, start).await {
            Ok(result) => result,
            Err(status) => return Flow::Stop(status),
        };
        let signal = started.loop_signal.unwrap_or_else(|| loop_signal(start));
        let (bound, total) = if signal.infinite {
            (self.config.max_infinite_iterations, None)
        } else {
            (signal.iterations, Some(signal.iterations))
        };

        let outer = ctx.position.take();
        let outer_tolerance = ctx.continue_on_error;
        ctx.continue_on_error = outer_tolerance || signal.continue_on_error;
        let mut flow = Flow::Continue;
        for iteration in 1..=bound {
            if self.abort.is_aborted() {
                flow = Flow::Stop(RunStatus::Aborted);
                break;
            }
            tracing::debug!(loop_id = %signal.loop_id, iteration, ?total, "loop iteration");
            self.events.publish(RunEvent::LoopIteration {
                run_id: ctx.run_id.clone(),
                loop_id: signal.loop_id.clone(),
                iteration,
                total,
            });
            ctx.position = Some(LoopPosition {
                loop_id: signal.loop_id.clone(),
                iteration,
            });
            if let Flow::Stop(status) = self.run_blocks(ctx, body).await {
                flow = Flow::Stop(status);
                break;
            }
            if let Some(ms) = signal.interval_ms.filter(|_| iteration < bound) {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
        }
        ctx.position = outer;
        ctx.continue_on_error = outer_tolerance;

        if let Flow::Stop(status) = flow {
            return Flow::Stop(status);
        }
        if signal.infinite {
            tracing::info!(loop_id = %signal.loop_id, bound, "unbounded loop stopped at iteration cap");
        }
        match end {
            Some(end) => match self.run_step(ctx, end).await {
                Ok(_) => Flow::Continue,
                Err(status) => Flow::Stop(status),
            },
            None => Flow::Continue,
        }
    }

    /// `Err` carries the status the run must stop with.
    async fn run_step(&self, ctx: &mut RunContext, step: &Step) -> Result<ExecutionResult, RunStatus> {
        if self.abort.is_aborted() {
            tracing::info!(step_id = %step.id, "run aborted before step");
            return Err(RunStatus::Aborted);
        }
        if let Some(reason) = ctx.guard.should_stop() {
            tracing::warn!(step_id = %step.id, reason = %reason, "run limit reached");
            return Err(RunStatus::LimitReached { reason });
        }

        self.events.publish(RunEvent::StepStarted {
            run_id: ctx.run_id.clone(),
            step_id: step.id.clone(),
            name: step.name.clone(),
        });
        let result = self
            .router
            .route(&ctx.device_id, step, self.smart.as_ref(), self.screen)
            .await;
        self.record(ctx, step, result.clone());

        if result.success {
            ctx.guard.record_success();
            return Ok(result);
        }
        ctx.guard.record_failure();
        if self.config.stop_on_failure && !ctx.continue_on_error {
            return Err(RunStatus::Failed {
                step_id: step.id.clone(),
                message: result.message,
            });
        }
        Ok(result)
    }

    fn record(&self, ctx: &mut RunContext, step: &Step, result: ExecutionResult) {
        let record = StepRecord {
            step_id: step.id.clone(),
            name: step.name.clone(),
            position: ctx.position.clone(),
            result,
        };
        if let Some(history) = &ctx.history {
            if let Err(e) = history.append(&ctx.device_id, &record) {
                tracing::warn!(error = %e, "history append failed");
            }
        }
        self.events.publish(RunEvent::StepFinished {
            run_id: ctx.run_id.clone(),
            record: record.clone(),
        });
        ctx.records.push(record);
    }
}
