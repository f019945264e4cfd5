pub mod adb;
pub mod timeout;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

pub use adb::AdbChannel;
pub use timeout::TimeoutChannel;
pub use traits::{CommandOutput, DeviceChannel, DeviceCommand};

use crate::config::DeviceConfig;

/// ADB channel, wrapped in a timeout when one is configured.
pub fn channel_from_config(config: &DeviceConfig) -> Arc<dyn DeviceChannel> {
    let adb: Arc<dyn DeviceChannel> = Arc::new(AdbChannel::from_config(config));
    match config.command_timeout_ms {
        Some(ms) if ms > 0 => Arc::new(TimeoutChannel::new(adb, Duration::from_millis(ms))),
        _ => adb,
    }
}
