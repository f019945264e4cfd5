pub mod config;
pub mod device;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod inference;
pub mod step;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use device::{DeviceChannel, DeviceCommand};
pub use engine::{AbortHandle, RunReport, ScriptRunner};
pub use errors::{DroidFlowError, DroidFlowResult};
pub use executor::{DeviceScreen, SmartExecutor, SmartOutcome, StepRouter};
pub use step::{classify, ExecutionResult, Step, StepCategory};

/// Installs the global fmt subscriber. `RUST_LOG` wins; defaults to `info`.
/// Safe to call more than once: later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_is_idempotent() {
        super::init_tracing();
        super::init_tracing();
    }
}
