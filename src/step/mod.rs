pub mod classifier;
pub mod params;
pub mod types;

pub use classifier::{classify, classify_traced, Classification, RuleKind};
pub use params::{Direction, ScrollParams};
pub use types::{ExecutionResult, LoopSignal, ParamBag, Step, StepCategory};
