use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DroidFlowResult;
use crate::inference::card::StructuralCard;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceStatus {
    Completed,
    Pending,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceOutcome {
    pub status: InferenceStatus,
    /// Structural-match plan; only meaningful when `status` is `Completed`.
    #[serde(default)]
    pub plan: Option<Value>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub elapsed_ms: u64,
}

/// Computes a structural-match plan for a card at run time.
#[async_trait]
pub trait InferenceAdapter: Send + Sync {
    async fn infer(&self, card: &StructuralCard) -> DroidFlowResult<InferenceOutcome>;
}
