//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::device::{CommandOutput, DeviceChannel, DeviceCommand};
use crate::errors::{DroidFlowError, DroidFlowResult};
use crate::executor::traits::{SmartExecutor, SmartOutcome};
use crate::inference::card::StructuralCard;
use crate::inference::traits::{InferenceAdapter, InferenceOutcome, InferenceStatus};
use crate::step::Step;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Device answers with `success: false`.
    Rejected,
    /// Channel returns `Err`.
    Transport,
}

/// Records every command; the n-th call (1-based) can be scripted to fail.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(String, DeviceCommand)>>,
    failures: HashMap<usize, Failure>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(call: usize, failure: Failure) -> Self {
        let mut channel = Self::default();
        channel.failures.insert(call, failure);
        channel
    }

    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.sent.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn devices(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(d, _)| d.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl DeviceChannel for RecordingChannel {
    async fn send(&self, device_id: &str, command: &DeviceCommand) -> DroidFlowResult<CommandOutput> {
        let call = {
            let mut sent = self.sent.lock().unwrap();
            sent.push((device_id.to_string(), command.clone()));
            sent.len()
        };
        match self.failures.get(&call) {
            Some(Failure::Rejected) => Ok(CommandOutput::failed("device said no")),
            Some(Failure::Transport) => Err(DroidFlowError::Device("device offline".into())),
            None => Ok(CommandOutput::ok()),
        }
    }
}

pub enum SmartBehavior {
    Succeed(String),
    Fail(String),
    Error(String),
    Panic,
}

/// Smart executor that records the steps it was handed.
pub struct ScriptedSmart {
    behavior: SmartBehavior,
    seen: Mutex<Vec<Step>>,
}

impl ScriptedSmart {
    pub fn new(behavior: SmartBehavior) -> Self {
        Self {
            behavior,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(SmartBehavior::Succeed("clicked".into()))
    }

    pub fn seen(&self) -> Vec<Step> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmartExecutor for ScriptedSmart {
    async fn execute(&self, _device_id: &str, step: &Step) -> DroidFlowResult<SmartOutcome> {
        self.seen.lock().unwrap().push(step.clone());
        match &self.behavior {
            SmartBehavior::Succeed(msg) => Ok(SmartOutcome::success(msg.clone())),
            SmartBehavior::Fail(msg) => Ok(SmartOutcome::failure(msg.clone())),
            SmartBehavior::Error(msg) => Err(DroidFlowError::Matching(msg.clone())),
            SmartBehavior::Panic => panic!("matcher blew up"),
        }
    }
}

pub enum InferenceBehavior {
    Complete(Value),
    Status(InferenceStatus),
    Error,
    Panic,
}

pub struct ScriptedInference {
    behavior: InferenceBehavior,
    calls: AtomicUsize,
}

impl ScriptedInference {
    pub fn new(behavior: InferenceBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceAdapter for ScriptedInference {
    async fn infer(&self, _card: &StructuralCard) -> DroidFlowResult<InferenceOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            InferenceBehavior::Complete(plan) => Ok(InferenceOutcome {
                status: InferenceStatus::Completed,
                plan: Some(plan.clone()),
                metadata: serde_json::json!({ "engine": "scripted" }),
                elapsed_ms: 42,
            }),
            InferenceBehavior::Status(status) => Ok(InferenceOutcome {
                status: status.clone(),
                plan: None,
                metadata: Value::Null,
                elapsed_ms: 7,
            }),
            InferenceBehavior::Error => Err(DroidFlowError::Inference("model unavailable".into())),
            InferenceBehavior::Panic => panic!("inference blew up"),
        }
    }
}
