use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::device::traits::{CommandOutput, DeviceChannel, DeviceCommand};
use crate::errors::{DroidFlowError, DroidFlowResult};

/// Bounds every command of the wrapped channel.
pub struct TimeoutChannel {
    inner: Arc<dyn DeviceChannel>,
    timeout: Duration,
}

impl TimeoutChannel {
    pub fn new(inner: Arc<dyn DeviceChannel>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl DeviceChannel for TimeoutChannel {
    async fn send(&self, device_id: &str, command: &DeviceCommand) -> DroidFlowResult<CommandOutput> {
        match tokio::time::timeout(self.timeout, self.inner.send(device_id, command)).await {
            Ok(result) => result,
            Err(_) => {
                let ms = self.timeout.as_millis() as u64;
                tracing::warn!(device = device_id, kind = command.kind(), timeout_ms = ms, "device command timed out");
                Err(DroidFlowError::DeviceTimeout(ms))
            }
        }
    }
}
