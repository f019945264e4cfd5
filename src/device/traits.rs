use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DroidFlowResult;
use crate::executor::coordinator::Point;

/// Device-level primitive issued by an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceCommand {
    Swipe {
        start: Point,
        end: Point,
        duration_ms: u64,
    },
    KeyEvent {
        key_code: u32,
    },
    LongPress {
        point: Point,
        duration_ms: u64,
    },
    InputText {
        text: String,
    },
}

impl DeviceCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceCommand::Swipe { .. } => "swipe",
            DeviceCommand::KeyEvent { .. } => "keyevent",
            DeviceCommand::LongPress { .. } => "long_press",
            DeviceCommand::InputText { .. } => "input_text",
        }
    }
}

/// What the device answered. `success == false` means the device refused or
/// reported an error; transport problems surface as `Err` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub success: bool,
    pub diagnostics: Option<String>,
}

impl CommandOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            diagnostics: None,
        }
    }

    pub fn failed(diagnostics: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostics: Some(diagnostics.into()),
        }
    }
}

/// Channel that delivers commands to a device (USB/network bridge, emulator...).
#[async_trait]
pub trait DeviceChannel: Send + Sync {
    async fn send(&self, device_id: &str, command: &DeviceCommand) -> DroidFlowResult<CommandOutput>;
}
