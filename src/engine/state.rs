use serde::{Deserialize, Serialize};

use crate::step::ExecutionResult;

/// How a script run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed { step_id: String, message: String },
    Aborted,
    LimitReached { reason: String },
}

/// Innermost loop a step ran in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPosition {
    pub loop_id: String,
    /// 1-based.
    pub iteration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<LoopPosition>,
    pub result: ExecutionResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub device_id: String,
    pub status: RunStatus,
    pub records: Vec<StepRecord>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Completed && self.records.iter().all(|r| r.result.success)
    }

    pub fn failed_steps(&self) -> usize {
        self.records.iter().filter(|r| !r.result.success).count()
    }
}

/// Progress notifications published while a script runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: String,
        device_id: String,
        total_steps: usize,
    },
    StepStarted {
        run_id: String,
        step_id: String,
        name: String,
    },
    StepFinished {
        run_id: String,
        record: StepRecord,
    },
    LoopIteration {
        run_id: String,
        loop_id: String,
        iteration: u32,
        /// `None` for unbounded loops.
        total: Option<u32>,
    },
    RunFinished {
        run_id: String,
        status: RunStatus,
    },
}
