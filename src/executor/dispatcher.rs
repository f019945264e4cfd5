// Step router: classify, dispatch to exactly one executor, normalize the result.
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::device::DeviceChannel;
use crate::executor::coordinator::DeviceScreen;
use crate::executor::traits::SmartExecutor;
use crate::executor::{click, long_press, loop_marker, scroll, system_key, text_input, wait};
use crate::inference::{CardLookup, InferenceAdapter, StepEnricher};
use crate::step::{classify_traced, ExecutionResult, Step, StepCategory};

pub struct StepRouter {
    channel: Arc<dyn DeviceChannel>,
    enricher: Option<StepEnricher>,
}

impl StepRouter {
    pub fn new(channel: Arc<dyn DeviceChannel>) -> Self {
        Self {
            channel,
            enricher: None,
        }
    }

    /// Enables runtime parameter inference on the click path.
    pub fn with_inference(
        mut self,
        lookup: Arc<dyn CardLookup>,
        adapter: Arc<dyn InferenceAdapter>,
    ) -> Self {
        self.enricher = Some(StepEnricher::new(lookup, adapter));
        self
    }

    /// Runs one step. Never fails: every outcome, including a panicking
    /// collaborator, comes back as an [`ExecutionResult`].
    pub async fn route(
        &self,
        device_id: &str,
        step: &Step,
        smart: &dyn SmartExecutor,
        screen: DeviceScreen,
    ) -> ExecutionResult {
        let classification = classify_traced(step);
        let category = classification.category;
        tracing::info!(
            step_id = %step.id,
            name = %step.name,
            declared = ?step.step_type,
            %category,
            rule = ?classification.rule,
            "routing step"
        );

        let started = std::time::Instant::now();
        let dispatched = self.dispatch(category, device_id, step, smart, screen);
        let mut result = match AssertUnwindSafe(dispatched).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!(step_id = %step.id, %category, reason = %reason, "executor panicked");
                ExecutionResult::failed(category, format!("executor panicked: {reason}"))
            }
        };

        result.executor_type = category.executor_type().to_string();
        result.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            step_id = %step.id,
            success = result.success,
            executor = %result.executor_type,
            duration_ms = result.duration_ms,
            msg = %result.message,
            "step routed"
        );
        result
    }

    async fn dispatch(
        &self,
        category: StepCategory,
        device_id: &str,
        step: &Step,
        smart: &dyn SmartExecutor,
        screen: DeviceScreen,
    ) -> ExecutionResult {
        let channel = self.channel.as_ref();
        match category {
            StepCategory::Scroll => scroll::run(channel, device_id, step, screen).await,
            StepCategory::SystemKey => system_key::run(channel, device_id, step).await,
            StepCategory::LongPress => long_press::run(channel, device_id, step).await,
            StepCategory::TextInput => text_input::run(channel, device_id, step).await,
            StepCategory::Wait => wait::run(step).await,
            StepCategory::Click => click::run(device_id, step, smart, self.enricher.as_ref()).await,
            StepCategory::LoopControl => loop_marker::run(step),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
