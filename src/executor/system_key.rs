use serde_json::Value;

use crate::device::{DeviceChannel, DeviceCommand};
use crate::executor::issue_once;
use crate::executor::tables::{gesture_key_code, key_code_for, key_name, KEYCODE_BACK};
use crate::step::classifier::{GESTURE_FIELDS, KEY_CODE_FIELDS};
use crate::step::params::{first_present, get_str, value_as_i64};
use crate::step::{ExecutionResult, ParamBag, Step, StepCategory};

/// Key code for the step: explicit key code, then gesture type, then `key`
/// name. With no key parameters at all the step means BACK.
pub fn resolve_key_code(params: &ParamBag) -> Result<u32, String> {
    if let Some(raw) = first_present(params, KEY_CODE_FIELDS) {
        return match raw {
            Value::Number(n) => value_as_i64(raw)
                .and_then(|c| u32::try_from(c).ok())
                .ok_or_else(|| format!("invalid key code {n}")),
            Value::String(s) => key_code_for(s).ok_or_else(|| format!("unknown key '{s}'")),
            other => Err(format!("invalid key code {other}")),
        };
    }
    if let Some(gesture) = first_present(params, GESTURE_FIELDS) {
        let name = gesture.as_str().unwrap_or_default();
        return gesture_key_code(name).ok_or_else(|| format!("unsupported gesture '{gesture}'"));
    }
    if let Some(key) = get_str(params, "key") {
        return key_code_for(key).ok_or_else(|| format!("unknown key '{key}'"));
    }
    Ok(KEYCODE_BACK)
}

pub async fn run(channel: &dyn DeviceChannel, device_id: &str, step: &Step) -> ExecutionResult {
    let key_code = match resolve_key_code(&step.parameters) {
        Ok(code) => code,
        Err(reason) => {
            tracing::warn!(step_id = %step.id, reason = %reason, "system key not resolved");
            return ExecutionResult::failed(StepCategory::SystemKey, reason);
        }
    };

    let label = key_name(key_code)
        .map(|n| format!("{n} ({key_code})"))
        .unwrap_or_else(|| key_code.to_string());
    tracing::info!(step_id = %step.id, device = device_id, key_code, "key event");

    issue_once(
        channel,
        device_id,
        StepCategory::SystemKey,
        DeviceCommand::KeyEvent { key_code },
        format!("key {label} sent"),
    )
    .await
}
