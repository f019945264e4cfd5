use crate::executor::traits::SmartExecutor;
use crate::inference::{Enrichment, SkipReason, StepEnricher};
use crate::step::{ExecutionResult, Step, StepCategory};

/// Best-effort enrichment, then delegation to the smart executor.
///
/// Inference problems never fail the click; only the smart executor's own
/// verdict decides the result.
pub async fn run(
    device_id: &str,
    step: &Step,
    smart: &dyn SmartExecutor,
    enricher: Option<&StepEnricher>,
) -> ExecutionResult {
    let enrichment = match enricher {
        Some(enricher) => enricher.enrich(step).await,
        None => Enrichment::WithoutPlan {
            step,
            reason: SkipReason::NotConfigured,
        },
    };
    if let Enrichment::WithoutPlan { reason, .. } = &enrichment {
        tracing::debug!(step_id = %step.id, ?reason, "click without runtime plan");
    }

    match smart.execute(device_id, enrichment.step()).await {
        Ok(outcome) if outcome.success => ExecutionResult::ok(StepCategory::Click, outcome.message),
        Ok(outcome) => {
            tracing::warn!(step_id = %step.id, message = %outcome.message, "smart click failed");
            ExecutionResult::failed(StepCategory::Click, outcome.message)
        }
        Err(e) => {
            tracing::warn!(step_id = %step.id, error = %e, "smart executor error");
            ExecutionResult::failed(StepCategory::Click, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::inference::enrich::PLAN_KEY;
    use crate::inference::{CardRegistry, StructuralCard};
    use crate::testing::{InferenceBehavior, ScriptedInference, ScriptedSmart, SmartBehavior};
    use serde_json::json;

    fn enricher_with_card(behavior: InferenceBehavior) -> StepEnricher {
        let registry = Arc::new(CardRegistry::new());
        registry.insert(StructuralCard::new("c1", json!({ "text": "Follow" })));
        StepEnricher::new(registry, Arc::new(ScriptedInference::new(behavior)))
    }

    fn step() -> Step {
        Step::new("smart_tap", "Tap follow").with_id("c1").with_param("text", "Follow")
    }

    #[tokio::test]
    async fn enriched_copy_reaches_the_matcher() {
        let smart = ScriptedSmart::succeeding();
        let enricher = enricher_with_card(InferenceBehavior::Complete(json!({ "strategy": "anchor" })));
        let original = step();
        let result = run("d1", &original, &smart, Some(&enricher)).await;

        assert!(result.success);
        assert_eq!(result.executor_type, "click_v3");
        let seen = smart.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].parameters[PLAN_KEY]["strategy"], "anchor");
        assert!(!original.parameters.contains_key(PLAN_KEY));
    }

    #[tokio::test]
    async fn inference_error_still_clicks_with_original_step() {
        let smart = ScriptedSmart::succeeding();
        let enricher = enricher_with_card(InferenceBehavior::Error);
        let original = step();
        let result = run("d1", &original, &smart, Some(&enricher)).await;

        assert!(result.success, "inference failure must not fail the click");
        assert_eq!(smart.seen(), vec![original]);
    }

    #[tokio::test]
    async fn matcher_verdict_is_reported() {
        let smart = ScriptedSmart::new(SmartBehavior::Fail("element not found".into()));
        let result = run("d1", &step(), &smart, None).await;
        assert!(!result.success);
        assert_eq!(result.message, "element not found");
    }

    #[tokio::test]
    async fn matcher_error_becomes_failed_result() {
        let smart = ScriptedSmart::new(SmartBehavior::Error("xml dump failed".into()));
        let result = run("d1", &step(), &smart, None).await;
        assert!(!result.success);
        assert!(result.message.contains("xml dump failed"));
    }
}
