//! Lenient accessors over a step's parameter bag.
//!
//! Steps come from several editors and from imported legacy scripts, so the
//! same field may arrive as a JSON number, a numeric string or a bool-ish
//! string. Every accessor treats `null` as absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::step::types::{ParamBag, Step};

fn present<'a>(params: &'a ParamBag, key: &str) -> Option<&'a Value> {
    params.get(key).filter(|v| !v.is_null())
}

/// First key among `keys` holding a non-null value.
pub fn first_present<'a>(params: &'a ParamBag, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| present(params, k))
}

pub fn has_any(params: &ParamBag, keys: &[&str]) -> bool {
    first_present(params, keys).is_some()
}

pub fn get_str<'a>(params: &'a ParamBag, key: &str) -> Option<&'a str> {
    present(params, key).and_then(Value::as_str)
}

pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        }
        _ => None,
    }
}

pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn get_i64(params: &ParamBag, key: &str) -> Option<i64> {
    present(params, key).and_then(value_as_i64)
}

/// Non-negative integer; negative values count as absent.
pub fn get_u64(params: &ParamBag, key: &str) -> Option<u64> {
    get_i64(params, key).and_then(|i| u64::try_from(i).ok())
}

pub fn get_u32(params: &ParamBag, key: &str) -> Option<u32> {
    get_u64(params, key).map(|v| v.min(u64::from(u32::MAX)) as u32)
}

pub fn get_bool(params: &ParamBag, key: &str) -> Option<bool> {
    present(params, key).and_then(value_as_bool)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

pub const DEFAULT_SCROLL_DISTANCE: u32 = 600;
pub const DEFAULT_SWIPE_DURATION_MS: u64 = 300;
pub const DEFAULT_REPEAT_COUNT: u32 = 1;
pub const DEFAULT_REPEAT_WAIT_MS: u64 = 500;

/// Scroll view over a step's parameter bag. Every field defaults independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollParams {
    pub direction: Direction,
    pub distance: u32,
    pub duration_ms: u64,
    /// Always at least 1.
    pub repeat_count: u32,
    pub wait_between: bool,
    pub wait_duration_ms: u64,
}

impl Default for ScrollParams {
    fn default() -> Self {
        Self {
            direction: Direction::Down,
            distance: DEFAULT_SCROLL_DISTANCE,
            duration_ms: DEFAULT_SWIPE_DURATION_MS,
            repeat_count: DEFAULT_REPEAT_COUNT,
            wait_between: false,
            wait_duration_ms: DEFAULT_REPEAT_WAIT_MS,
        }
    }
}

impl ScrollParams {
    pub fn from_step(step: &Step) -> Self {
        let p = &step.parameters;
        let defaults = Self::default();

        let direction = get_str(p, "direction").map(|raw| {
            Direction::parse(raw).unwrap_or_else(|| {
                tracing::warn!(step_id = %step.id, direction = raw, "unknown scroll direction, using down");
                Direction::Down
            })
        });

        Self {
            direction: direction.unwrap_or(defaults.direction),
            distance: get_u32(p, "distance").unwrap_or(defaults.distance),
            duration_ms: get_u64(p, "duration").unwrap_or(defaults.duration_ms),
            repeat_count: get_u32(p, "repeat_count")
                .unwrap_or(defaults.repeat_count)
                .max(1),
            wait_between: get_bool(p, "wait_between").unwrap_or(defaults.wait_between),
            wait_duration_ms: get_u64(p, "wait_duration").unwrap_or(defaults.wait_duration_ms),
        }
    }
}
