use std::time::Duration;

use crate::step::params::{first_present, value_as_i64};
use crate::step::{ExecutionResult, Step, StepCategory};

pub const DEFAULT_WAIT_MS: u64 = 1000;

/// `duration_ms` first, then `wait_ms`, else one second.
pub fn wait_duration(step: &Step) -> Duration {
    let ms = first_present(&step.parameters, &["duration_ms", "wait_ms"])
        .and_then(value_as_i64)
        .and_then(|ms| u64::try_from(ms).ok())
        .unwrap_or(DEFAULT_WAIT_MS);
    Duration::from_millis(ms)
}

/// Suspends for the configured duration. Always succeeds.
pub async fn run(step: &Step) -> ExecutionResult {
    let duration = wait_duration(step);
    tracing::info!(step_id = %step.id, ms = duration.as_millis() as u64, "waiting");
    tokio::time::sleep(duration).await;
    ExecutionResult::ok(StepCategory::Wait, format!("waited {}ms", duration.as_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_exactly_one_second() {
        assert_eq!(wait_duration(&Step::new("wait", "Wait")), Duration::from_millis(1000));
    }

    #[test]
    fn first_non_null_name_wins() {
        let step = Step::new("wait", "Wait")
            .with_param("duration_ms", 250)
            .with_param("wait_ms", 900);
        assert_eq!(wait_duration(&step), Duration::from_millis(250));

        let step = Step::new("wait", "Wait")
            .with_param("duration_ms", serde_json::Value::Null)
            .with_param("wait_ms", "900");
        assert_eq!(wait_duration(&step), Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn suspends_for_the_full_duration() {
        let started = tokio::time::Instant::now();
        let result = run(&Step::new("delay", "Delay")).await;
        assert!(result.success);
        assert_eq!(result.executor_type, "wait");
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }
}
