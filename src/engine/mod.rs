pub mod event_bus;
pub mod history;
pub mod limits;
pub mod runner;
pub mod state;

pub use event_bus::EventBus;
pub use history::{HistoryEntry, RunHistory};
pub use limits::RunGuard;
pub use runner::{AbortHandle, ScriptRunner};
pub use state::{LoopPosition, RunEvent, RunReport, RunStatus, StepRecord};
