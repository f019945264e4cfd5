// Literal text entry into the focused field.
// `adb shell input text` only types ASCII; CJK needs an IME-based injector.
use serde_json::Value;

use crate::device::{DeviceChannel, DeviceCommand};
use crate::executor::issue_once;
use crate::step::classifier::INPUT_TEXT_FIELDS;
use crate::step::params::first_present;
use crate::step::{ExecutionResult, ParamBag, Step, StepCategory};

const TEXT_FIELDS: &[&str] = &["text", "input_text", "content"];

/// Returns true if the text contains CJK (Chinese/Japanese/Korean) characters.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c)
        || ('\u{3040}'..='\u{309f}').contains(&c)
        || ('\u{30a0}'..='\u{30ff}').contains(&c)
        || ('\u{ac00}'..='\u{d7af}').contains(&c))
}

/// Text to type: `text`, `input_text`, `content`, then the camelCase and
/// legacy spellings the classifier also accepts.
pub fn text_payload(params: &ParamBag) -> Option<String> {
    let value = first_present(params, TEXT_FIELDS)
        .or_else(|| first_present(params, INPUT_TEXT_FIELDS))?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub async fn run(channel: &dyn DeviceChannel, device_id: &str, step: &Step) -> ExecutionResult {
    let text = match text_payload(&step.parameters) {
        Some(text) if !text.is_empty() => text,
        _ => {
            tracing::warn!(step_id = %step.id, "text input without text");
            return ExecutionResult::failed(StepCategory::TextInput, "no text to input");
        }
    };

    if contains_cjk(&text) || !text.is_ascii() {
        tracing::warn!(step_id = %step.id, "non-ASCII text; the device channel may not type it faithfully");
    }
    tracing::info!(step_id = %step.id, device = device_id, chars = text.chars().count(), "text input");

    let done = format!("typed {} characters", text.chars().count());
    issue_once(
        channel,
        device_id,
        StepCategory::TextInput,
        DeviceCommand::InputText { text },
        done,
    )
    .await
}
