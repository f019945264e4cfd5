pub mod click;
pub mod coordinator;
pub mod dispatcher;
pub mod long_press;
pub mod loop_marker;
pub mod scroll;
pub mod system_key;
pub mod tables;
pub mod text_input;
pub mod traits;
pub mod wait;

pub use coordinator::{compute_swipe, DeviceScreen, Point, SwipeCoordinates};
pub use dispatcher::StepRouter;
pub use traits::{SmartExecutor, SmartOutcome};

use crate::device::{DeviceChannel, DeviceCommand};
use crate::step::{ExecutionResult, StepCategory};

/// Sends exactly one command and folds every outcome into a result. No retry.
pub(crate) async fn issue_once(
    channel: &dyn DeviceChannel,
    device_id: &str,
    category: StepCategory,
    command: DeviceCommand,
    done: String,
) -> ExecutionResult {
    match channel.send(device_id, &command).await {
        Ok(out) if out.success => ExecutionResult::ok(category, done).with_diagnostics(out.diagnostics),
        Ok(out) => {
            let detail = out.diagnostics.clone().unwrap_or_else(|| "no details".into());
            tracing::warn!(device = device_id, kind = command.kind(), detail = %detail, "device rejected command");
            ExecutionResult::failed(category, format!("{} rejected by device: {detail}", command.kind()))
                .with_diagnostics(out.diagnostics)
        }
        Err(e) => {
            tracing::warn!(device = device_id, kind = command.kind(), error = %e, "device command failed");
            ExecutionResult::failed(category, format!("{} failed: {e}", command.kind()))
        }
    }
}
