//! Loop boundary markers.
//!
//! Markers never execute a loop body. `loop_start` hands a [`LoopSignal`]
//! back to the caller, which owns iteration; `loop_end` is a checkpoint.

use serde_json::Value;

use crate::step::params::{first_present, get_bool, get_str, value_as_i64};
use crate::step::{ExecutionResult, LoopSignal, Step, StepCategory};

pub const LOOP_START: &str = "loop_start";
pub const LOOP_END: &str = "loop_end";

pub fn is_loop_start(step: &Step) -> bool {
    step.declared_type() == Some(LOOP_START)
}

pub fn is_loop_end(step: &Step) -> bool {
    step.declared_type() == Some(LOOP_END)
}

const ITERATION_KEYS: &[&str] = &["iterations", "max_iterations", "count", "loop_count"];

/// Loop settings carried by a `loop_start` step, read from a nested
/// `loop_config` object when present, otherwise from the top level.
pub fn loop_signal(step: &Step) -> LoopSignal {
    let top = &step.parameters;
    let config = top.get("loop_config").and_then(Value::as_object).unwrap_or(top);

    let loop_id = get_str(config, "loop_id")
        .or_else(|| get_str(top, "loop_id"))
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("loop_{}", step.id));

    let iterations = first_present(config, ITERATION_KEYS)
        .and_then(value_as_i64)
        .map(|n| n.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(1);
    let flagged = get_bool(config, "is_infinite").unwrap_or(false)
        || get_bool(config, "infinite").unwrap_or(false);
    let interval_ms = first_present(config, &["interval_ms", "interval"])
        .and_then(value_as_i64)
        .and_then(|ms| u64::try_from(ms).ok())
        .filter(|ms| *ms > 0);
    let continue_on_error = get_bool(config, "continue_on_error").unwrap_or(false);

    let infinite = flagged || iterations == 0;
    LoopSignal {
        loop_id,
        iterations: if infinite { 0 } else { iterations },
        infinite,
        interval_ms,
        continue_on_error,
    }
}

pub fn run(step: &Step) -> ExecutionResult {
    if is_loop_start(step) {
        let signal = loop_signal(step);
        tracing::info!(
            step_id = %step.id,
            loop_id = %signal.loop_id,
            iterations = signal.iterations,
            infinite = signal.infinite,
            "loop start; body is driven by the caller"
        );
        let message = if signal.infinite {
            format!("loop {} starts (unbounded)", signal.loop_id)
        } else {
            format!("loop {} starts ({} iterations)", signal.loop_id, signal.iterations)
        };
        return ExecutionResult::ok(StepCategory::LoopControl, message).with_loop_signal(signal);
    }

    tracing::debug!(step_id = %step.id, "loop end checkpoint");
    ExecutionResult::ok(StepCategory::LoopControl, "loop end reached")
}
