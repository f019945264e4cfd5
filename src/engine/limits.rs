// Run-level stop conditions: elapsed time and consecutive failures.
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RunnerConfig;

pub struct RunGuard {
    started: Instant,
    consecutive_failures: u32,
    max_duration: Option<Duration>,
    max_consecutive_failures: Option<u32>,
}

impl RunGuard {
    pub fn new(max_duration: Option<Duration>, max_consecutive_failures: Option<u32>) -> Self {
        Self {
            started: Instant::now(),
            consecutive_failures: 0,
            max_duration,
            max_consecutive_failures,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        let max_duration = (config.max_duration_minutes > 0)
            .then(|| Duration::from_secs(u64::from(config.max_duration_minutes) * 60));
        let max_failures = (!config.stop_on_failure && config.max_consecutive_failures > 0)
            .then_some(config.max_consecutive_failures);
        Self::new(max_duration, max_failures)
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    /// Reason to stop, if any limit is hit.
    pub fn should_stop(&self) -> Option<String> {
        if let Some(max) = self.max_duration {
            if self.started.elapsed() >= max {
                return Some(format!("run exceeded {}s", max.as_secs()));
            }
        }
        if let Some(max) = self.max_consecutive_failures {
            if self.consecutive_failures >= max {
                return Some(format!("{max} consecutive failures"));
            }
        }
        None
    }
}
