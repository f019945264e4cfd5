use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open parameter bag carried by every step.
pub type ParamBag = Map<String, Value>;

/// One unit of an automation script, as handed over by the authoring tools.
///
/// `step_type` and `name` are advisory: the effective category is always
/// derived by [`crate::step::classifier::classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(default, alias = "type")]
    pub step_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: ParamBag,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_loop_id: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Step {
    /// Fresh enabled step with a random id and an empty parameter bag.
    pub fn new(step_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            step_type: Some(step_type.into()),
            name: name.into(),
            parameters: ParamBag::new(),
            enabled: true,
            order: 0,
            parent_loop_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn declared_type(&self) -> Option<&str> {
        self.step_type.as_deref()
    }
}

/// Resolved executable kind of a step. Exactly one per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCategory {
    Scroll,
    SystemKey,
    LongPress,
    TextInput,
    Wait,
    Click,
    LoopControl,
}

impl StepCategory {
    pub const ALL: [StepCategory; 7] = [
        StepCategory::Scroll,
        StepCategory::SystemKey,
        StepCategory::LongPress,
        StepCategory::TextInput,
        StepCategory::Wait,
        StepCategory::Click,
        StepCategory::LoopControl,
    ];

    /// Tag stamped on every result produced for this category.
    pub fn executor_type(self) -> &'static str {
        match self {
            StepCategory::Scroll => "scroll_v2",
            StepCategory::SystemKey => "keyevent_v2",
            StepCategory::LongPress => "longpress_v2",
            StepCategory::TextInput => "input_v2",
            StepCategory::Wait => "wait",
            StepCategory::Click => "click_v3",
            StepCategory::LoopControl => "loop_control",
        }
    }
}

impl std::fmt::Display for StepCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StepCategory::Scroll => "scroll",
            StepCategory::SystemKey => "system_key",
            StepCategory::LongPress => "long_press",
            StepCategory::TextInput => "text_input",
            StepCategory::Wait => "wait",
            StepCategory::Click => "click",
            StepCategory::LoopControl => "loop_control",
        };
        f.write_str(label)
    }
}

/// Returned by a `loop_start` marker: the caller must drive the loop body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSignal {
    pub loop_id: String,
    pub iterations: u32,
    /// Set when the loop has no iteration bound of its own.
    #[serde(default)]
    pub infinite: bool,
    /// Pause between two iterations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    /// Failures inside the body do not end the run.
    #[serde(default)]
    pub continue_on_error: bool,
}

/// Uniform outcome of routing one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    pub executor_type: String,
    /// Scroll only: how many swipes completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_count: Option<u32>,
    /// Loop-control only: present when the caller must drive a loop body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_signal: Option<LoopSignal>,
    /// Free-form diagnostics returned by the device channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ExecutionResult {
    pub fn ok(category: StepCategory, message: impl Into<String>) -> Self {
        Self::new(true, category, message)
    }

    pub fn failed(category: StepCategory, message: impl Into<String>) -> Self {
        Self::new(false, category, message)
    }

    fn new(success: bool, category: StepCategory, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            executor_type: category.executor_type().to_string(),
            executed_count: None,
            loop_signal: None,
            diagnostics: None,
            duration_ms: 0,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_executed_count(mut self, count: u32) -> Self {
        self.executed_count = Some(count);
        self
    }

    pub fn with_loop_signal(mut self, signal: LoopSignal) -> Self {
        self.loop_signal = Some(signal);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Option<String>) -> Self {
        self.diagnostics = diagnostics.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn needs_loop_execution(&self) -> bool {
        self.loop_signal.is_some()
    }
}
