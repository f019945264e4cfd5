use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DroidFlowResult;
use crate::step::Step;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartOutcome {
    pub success: bool,
    pub message: String,
}

impl SmartOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Locates the step's target element on screen and interacts with it.
/// The matching strategy is entirely up to the implementation.
#[async_trait]
pub trait SmartExecutor: Send + Sync {
    async fn execute(&self, device_id: &str, step: &Step) -> DroidFlowResult<SmartOutcome>;
}
