//! Priority-ordered step classification.
//!
//! Rules are evaluated top to bottom and the first match wins:
//! declared type, then parameter shape, then name heuristics, then `Click`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::step::params::has_any;
use crate::step::types::{Step, StepCategory};

/// Which rule decided a step's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    DeclaredType,
    ParameterShape,
    NameHeuristic,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: StepCategory,
    pub rule: RuleKind,
}

const DECLARED_TYPES: &[(&str, StepCategory)] = &[
    ("loop_start", StepCategory::LoopControl),
    ("loop_end", StepCategory::LoopControl),
    ("smart_scroll", StepCategory::Scroll),
    ("swipe", StepCategory::Scroll),
    ("keyevent", StepCategory::SystemKey),
    ("system_key", StepCategory::SystemKey),
    ("long_press", StepCategory::LongPress),
    ("longpress", StepCategory::LongPress),
    ("input", StepCategory::TextInput),
    ("type", StepCategory::TextInput),
    ("wait", StepCategory::Wait),
    ("delay", StepCategory::Wait),
];

pub(crate) const KEY_CODE_FIELDS: &[&str] = &["key_code", "keycode", "keyCode", "key_event"];
pub(crate) const GESTURE_FIELDS: &[&str] = &["gesture_type", "gestureType"];
pub(crate) const INPUT_TEXT_FIELDS: &[&str] = &["input_text", "inputText", "text_input"];

const NAME_PATTERNS: &[(&str, StepCategory)] = &[
    (r"scroll|swipe|滚动|滑动", StepCategory::Scroll),
    (r"key|back|home|edge|返回|按键|主页", StepCategory::SystemKey),
    (r"long[\s_-]?press|长按", StepCategory::LongPress),
    (r"input|fill|输入|填写", StepCategory::TextInput),
    (r"wait|delay|等待|延时|延迟", StepCategory::Wait),
];

type Rule = fn(&Step) -> Option<StepCategory>;

const RULES: &[(RuleKind, Rule)] = &[
    (RuleKind::DeclaredType, by_declared_type),
    (RuleKind::ParameterShape, by_parameter_shape),
    (RuleKind::NameHeuristic, by_name),
];

fn by_declared_type(step: &Step) -> Option<StepCategory> {
    let declared = step.declared_type()?;
    DECLARED_TYPES
        .iter()
        .find(|(tag, _)| *tag == declared)
        .map(|(_, category)| *category)
}

fn by_parameter_shape(step: &Step) -> Option<StepCategory> {
    let params = &step.parameters;
    if has_any(params, KEY_CODE_FIELDS) || has_any(params, GESTURE_FIELDS) {
        return Some(StepCategory::SystemKey);
    }
    if has_any(params, INPUT_TEXT_FIELDS) {
        return Some(StepCategory::TextInput);
    }
    None
}

fn name_patterns() -> &'static [(Regex, StepCategory)] {
    static COMPILED: OnceLock<Vec<(Regex, StepCategory)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        NAME_PATTERNS
            .iter()
            .filter_map(|(pattern, category)| match Regex::new(&format!("(?i){pattern}")) {
                Ok(re) => Some((re, *category)),
                Err(e) => {
                    tracing::error!(pattern, error = %e, "invalid name pattern skipped");
                    None
                }
            })
            .collect()
    })
}

fn by_name(step: &Step) -> Option<StepCategory> {
    if step.name.trim().is_empty() {
        return None;
    }
    name_patterns()
        .iter()
        .find(|(re, _)| re.is_match(&step.name))
        .map(|(_, category)| *category)
}

/// Category plus the rule that produced it. Never fails.
pub fn classify_traced(step: &Step) -> Classification {
    for (rule, matcher) in RULES {
        if let Some(category) = matcher(step) {
            return Classification { category, rule: *rule };
        }
    }
    Classification {
        category: StepCategory::Click,
        rule: RuleKind::Default,
    }
}

pub fn classify(step: &Step) -> StepCategory {
    classify_traced(step).category
}
