use std::time::Duration;

use crate::device::{DeviceChannel, DeviceCommand};
use crate::executor::coordinator::{compute_swipe, DeviceScreen};
use crate::executor::tables::direction_glyph;
use crate::step::params::ScrollParams;
use crate::step::{ExecutionResult, Step, StepCategory};

/// Issues `repeat_count` identical swipes, stopping at the first failure.
pub async fn run(
    channel: &dyn DeviceChannel,
    device_id: &str,
    step: &Step,
    screen: DeviceScreen,
) -> ExecutionResult {
    let params = ScrollParams::from_step(step);
    let coords = compute_swipe(params.direction, params.distance, screen);
    let (glyph, label) = direction_glyph(params.direction);
    let command = DeviceCommand::Swipe {
        start: coords.start,
        end: coords.end,
        duration_ms: params.duration_ms,
    };

    tracing::info!(
        step_id = %step.id,
        device = device_id,
        direction = label,
        distance = params.distance,
        repeat = params.repeat_count,
        start = ?coords.start,
        end = ?coords.end,
        "scroll"
    );

    let total = params.repeat_count;
    let mut executed = 0u32;
    let mut diagnostics = None;

    for attempt in 1..=total {
        match swipe_once(channel, device_id, &command).await {
            Ok(diag) => {
                executed += 1;
                diagnostics = diag;
            }
            Err(reason) => {
                tracing::warn!(step_id = %step.id, attempt, total, reason = %reason, "swipe failed; stopping");
                let message = if executed == 0 {
                    format!("scroll {glyph} {label} failed on attempt {attempt}/{total}: {reason}")
                } else {
                    format!(
                        "scroll {glyph} {label} partially done: attempt {attempt}/{total} failed after {executed} completed: {reason}"
                    )
                };
                return ExecutionResult::failed(StepCategory::Scroll, message)
                    .with_executed_count(executed)
                    .with_diagnostics(diagnostics);
            }
        }

        if params.wait_between && attempt < total {
            tokio::time::sleep(Duration::from_millis(params.wait_duration_ms)).await;
        }
    }

    ExecutionResult::ok(
        StepCategory::Scroll,
        format!("scrolled {glyph} {label} {}px x{executed}", params.distance),
    )
    .with_executed_count(executed)
    .with_diagnostics(diagnostics)
}

async fn swipe_once(
    channel: &dyn DeviceChannel,
    device_id: &str,
    command: &DeviceCommand,
) -> Result<Option<String>, String> {
    match channel.send(device_id, command).await {
        Ok(out) if out.success => Ok(out.diagnostics),
        Ok(out) => Err(out
            .diagnostics
            .unwrap_or_else(|| "device rejected swipe".to_string())),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::coordinator::Point;
    use crate::testing::{Failure, RecordingChannel};
    use serde_json::json;

    const PHONE: DeviceScreen = DeviceScreen {
        width: 1080,
        height: 2340,
    };

    fn scroll_step(params: serde_json::Value) -> Step {
        let mut step = Step::new("smart_scroll", "scroll feed").with_id("scroll-1");
        step.parameters = params.as_object().cloned().unwrap();
        step
    }

    #[tokio::test(start_paused = true)]
    async fn reference_scenario_two_swipes_with_pause() {
        let channel = RecordingChannel::new();
        let step = scroll_step(json!({
            "direction": "down", "distance": 600, "duration": 300,
            "repeat_count": 2, "wait_between": true, "wait_duration": 500
        }));

        let started = tokio::time::Instant::now();
        let result = run(&channel, "emulator-5554", &step, PHONE).await;
        let elapsed = started.elapsed();

        assert!(result.success, "{}", result.message);
        assert_eq!(result.executed_count, Some(2));
        assert_eq!(result.executor_type, "scroll_v2");
        let expected = DeviceCommand::Swipe {
            start: Point::new(540, 1638),
            end: Point::new(540, 1038),
            duration_ms: 300,
        };
        assert_eq!(channel.commands(), vec![expected.clone(), expected]);
        // One pause between two swipes, none after the last.
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn no_pause_without_wait_between() {
        let channel = RecordingChannel::new();
        let step = scroll_step(json!({ "repeat_count": 4 }));
        let started = tokio::time::Instant::now();
        let result = run(&channel, "d1", &step, PHONE).await;
        assert!(result.success);
        assert_eq!(result.executed_count, Some(4));
        assert_eq!(channel.count(), 4);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn second_of_three_failing_stops_the_loop() {
        let channel = RecordingChannel::failing_at(2, Failure::Rejected);
        let step = scroll_step(json!({ "repeat_count": 3 }));
        let result = run(&channel, "d1", &step, PHONE).await;
        assert!(!result.success);
        assert_eq!(result.executed_count, Some(1));
        assert_eq!(channel.count(), 2, "no third swipe may be attempted");
        assert!(result.message.contains("attempt 2/3"), "{}", result.message);
        assert!(result.message.contains("partially"), "{}", result.message);
    }

    #[tokio::test]
    async fn first_failure_is_a_full_failure() {
        let channel = RecordingChannel::failing_at(1, Failure::Transport);
        let step = scroll_step(json!({ "repeat_count": 3, "direction": "left" }));
        let result = run(&channel, "d1", &step, PHONE).await;
        assert!(!result.success);
        assert_eq!(result.executed_count, Some(0));
        assert_eq!(channel.count(), 1);
        assert!(result.message.contains("device offline"), "{}", result.message);
        assert!(!result.message.contains("partially"));
    }

    #[tokio::test]
    async fn defaults_give_a_single_downward_swipe() {
        let channel = RecordingChannel::new();
        let result = run(&channel, "d1", &scroll_step(json!({})), PHONE).await;
        assert!(result.success);
        assert_eq!(result.executed_count, Some(1));
        assert_eq!(
            channel.commands(),
            vec![DeviceCommand::Swipe {
                start: Point::new(540, 1638),
                end: Point::new(540, 1038),
                duration_ms: 300,
            }]
        );
    }
}
