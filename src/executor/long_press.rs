use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::device::{DeviceChannel, DeviceCommand};
use crate::executor::coordinator::Point;
use crate::executor::issue_once;
use crate::step::params::{first_present, get_i64, get_str, value_as_i64};
use crate::step::{ExecutionResult, ParamBag, Step, StepCategory};

pub const DEFAULT_LONG_PRESS_MS: u64 = 1000;

fn bounds_regex() -> Option<&'static Regex> {
    static BOUNDS: OnceLock<Option<Regex>> = OnceLock::new();
    BOUNDS
        .get_or_init(|| Regex::new(r"\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]").ok())
        .as_ref()
}

/// Center of an Android `bounds` string such as `[0,100][1080,300]`.
pub fn bounds_center(bounds: &str) -> Option<Point> {
    let caps = bounds_regex()?.captures(bounds.trim())?;
    let n = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<i32>().ok());
    let (left, top, right, bottom) = (n(1)?, n(2)?, n(3)?, n(4)?);
    Some(Point::new((left + right) / 2, (top + bottom) / 2))
}

fn point_from_object(value: &Value) -> Option<Point> {
    let x = value.get("x").and_then(value_as_i64)?;
    let y = value.get("y").and_then(value_as_i64)?;
    Some(Point::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
}

/// Press location: `x`/`y`, then a `target` object, then `bounds`.
pub fn resolve_target(params: &ParamBag) -> Option<Point> {
    if let (Some(x), Some(y)) = (get_i64(params, "x"), get_i64(params, "y")) {
        return Some(Point::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?));
    }
    if let Some(target) = params.get("target") {
        if let Some(point) = point_from_object(target) {
            return Some(point);
        }
        if let Some(bounds) = target.get("bounds").and_then(Value::as_str) {
            return bounds_center(bounds);
        }
    }
    get_str(params, "bounds").and_then(bounds_center)
}

pub fn press_duration_ms(params: &ParamBag) -> u64 {
    first_present(params, &["duration_ms", "duration"])
        .and_then(value_as_i64)
        .and_then(|ms| u64::try_from(ms).ok())
        .unwrap_or(DEFAULT_LONG_PRESS_MS)
}

pub async fn run(channel: &dyn DeviceChannel, device_id: &str, step: &Step) -> ExecutionResult {
    let Some(point) = resolve_target(&step.parameters) else {
        tracing::warn!(step_id = %step.id, "long press without a resolvable target");
        return ExecutionResult::failed(
            StepCategory::LongPress,
            "long press needs x/y, a target or bounds",
        );
    };
    let duration_ms = press_duration_ms(&step.parameters);
    tracing::info!(step_id = %step.id, device = device_id, x = point.x, y = point.y, duration_ms, "long press");

    issue_once(
        channel,
        device_id,
        StepCategory::LongPress,
        DeviceCommand::LongPress { point, duration_ms },
        format!("long pressed ({}, {}) for {duration_ms}ms", point.x, point.y),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingChannel;
    use serde_json::json;

    fn bag(v: Value) -> ParamBag {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn bounds_center_parses_android_format() {
        assert_eq!(bounds_center("[0,100][1080,300]"), Some(Point::new(540, 200)));
        assert_eq!(bounds_center("0,100,1080,300"), None);
    }

    #[test]
    fn target_sources_in_order() {
        assert_eq!(resolve_target(&bag(json!({ "x": "120", "y": 340 }))), Some(Point::new(120, 340)));
        assert_eq!(
            resolve_target(&bag(json!({ "target": { "x": 10, "y": 20 }, "bounds": "[0,0][100,100]" }))),
            Some(Point::new(10, 20))
        );
        assert_eq!(
            resolve_target(&bag(json!({ "target": { "bounds": "[100,200][300,400]" } }))),
            Some(Point::new(200, 300))
        );
        assert_eq!(resolve_target(&bag(json!({ "bounds": "[0,0][50,50]" }))), Some(Point::new(25, 25)));
        assert_eq!(resolve_target(&bag(json!({ "x": 5 }))), None);
    }

    #[test]
    fn duration_defaults_to_one_second() {
        assert_eq!(press_duration_ms(&bag(json!({}))), DEFAULT_LONG_PRESS_MS);
        assert_eq!(press_duration_ms(&bag(json!({ "duration": 1500 }))), 1500);
        assert_eq!(press_duration_ms(&bag(json!({ "duration_ms": 800, "duration": 1500 }))), 800);
    }

    #[tokio::test]
    async fn presses_resolved_point() {
        let channel = RecordingChannel::new();
        let step = Step::new("long_press", "Hold avatar").with_param("bounds", "[0,100][1080,300]");
        let result = run(&channel, "d1", &step).await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.executor_type, "longpress_v2");
        assert_eq!(
            channel.commands(),
            vec![DeviceCommand::LongPress {
                point: Point::new(540, 200),
                duration_ms: DEFAULT_LONG_PRESS_MS
            }]
        );
    }

    #[tokio::test]
    async fn missing_target_issues_nothing() {
        let channel = RecordingChannel::new();
        let result = run(&channel, "d1", &Step::new("longpress", "Hold")).await;
        assert!(!result.success);
        assert_eq!(channel.count(), 0);
    }
}
