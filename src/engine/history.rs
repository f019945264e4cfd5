use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::engine::state::StepRecord;
use crate::errors::DroidFlowResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts: i64,
    pub run_id: String,
    pub device_id: String,
    pub record: StepRecord,
}

/// Append-only JSONL log of one run's step results.
pub struct RunHistory {
    pub run_id: String,
    file_path: PathBuf,
}

impl RunHistory {
    /// `dir` defaults to the per-user data dir.
    pub fn new(run_id: &str, dir: Option<&Path>) -> DroidFlowResult<Self> {
        let dir = match dir {
            Some(d) => d.to_path_buf(),
            None => data_dir_or_cwd(),
        };
        std::fs::create_dir_all(&dir)?;
        let file_path = dir.join(format!("run_{run_id}.jsonl"));
        Ok(Self {
            run_id: run_id.to_string(),
            file_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn append(&self, device_id: &str, record: &StepRecord) -> DroidFlowResult<()> {
        let entry = HistoryEntry {
            ts: chrono::Utc::now().timestamp_millis(),
            run_id: self.run_id.clone(),
            device_id: device_id.to_string(),
            record: record.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        writeln!(file, "{}", line)?;
        tracing::debug!(path = %self.file_path.display(), step_id = %record.step_id, "history entry appended");
        Ok(())
    }

    pub fn read_all(&self) -> DroidFlowResult<Vec<HistoryEntry>> {
        let content = std::fs::read_to_string(&self.file_path)?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(Into::into))
            .collect()
    }
}

/// `<data_local_dir>/droidflow/runs`, falling back to the working directory.
fn data_dir_or_cwd() -> PathBuf {
    if let Some(base) = dirs::data_local_dir() {
        return base.join("droidflow").join("runs");
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
