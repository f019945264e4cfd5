use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::{json, Value};

use crate::inference::card::CardLookup;
use crate::inference::traits::{InferenceAdapter, InferenceStatus};
use crate::step::Step;

pub const PLAN_KEY: &str = "structure_match_plan";
pub const SOURCE_KEY: &str = "inference_source";
pub const METADATA_KEY: &str = "inference_metadata";
pub const ELAPSED_KEY: &str = "inference_elapsed_ms";
pub const RUNTIME_SOURCE: &str = "runtime_inference";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No inference adapter wired in.
    NotConfigured,
    NoCard,
    UpToDate,
    NotCompleted(InferenceStatus),
    MissingPlan,
    Failed(String),
}

/// Result of the best-effort enrichment pass. Never an error.
#[derive(Debug)]
pub enum Enrichment<'a> {
    /// Copy of the step carrying the inferred plan.
    WithPlan { step: Step, elapsed_ms: u64 },
    /// The caller's step, untouched.
    WithoutPlan { step: &'a Step, reason: SkipReason },
}

impl Enrichment<'_> {
    pub fn step(&self) -> &Step {
        match self {
            Enrichment::WithPlan { step, .. } => step,
            Enrichment::WithoutPlan { step, .. } => *step,
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self, Enrichment::WithPlan { .. })
    }
}

/// Attaches runtime structural-match plans to steps that have a card needing one.
pub struct StepEnricher {
    lookup: Arc<dyn CardLookup>,
    adapter: Arc<dyn InferenceAdapter>,
}

impl StepEnricher {
    pub fn new(lookup: Arc<dyn CardLookup>, adapter: Arc<dyn InferenceAdapter>) -> Self {
        Self { lookup, adapter }
    }

    pub async fn enrich<'a>(&self, step: &'a Step) -> Enrichment<'a> {
        let Some(card) = self.lookup.card_for_step(&step.id) else {
            return Enrichment::WithoutPlan {
                step,
                reason: SkipReason::NoCard,
            };
        };
        if !self.lookup.needs_inference(&card) {
            return Enrichment::WithoutPlan {
                step,
                reason: SkipReason::UpToDate,
            };
        }

        tracing::debug!(step_id = %step.id, card_id = %card.card_id, "running parameter inference");

        let outcome = match AssertUnwindSafe(self.adapter.infer(&card)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!(step_id = %step.id, error = %e, "inference failed; using original step");
                return Enrichment::WithoutPlan {
                    step,
                    reason: SkipReason::Failed(e.to_string()),
                };
            }
            Err(_) => {
                tracing::warn!(step_id = %step.id, "inference adapter panicked; using original step");
                return Enrichment::WithoutPlan {
                    step,
                    reason: SkipReason::Failed("inference adapter panicked".into()),
                };
            }
        };

        if outcome.status != InferenceStatus::Completed {
            tracing::warn!(step_id = %step.id, status = ?outcome.status, "inference not completed; using original step");
            return Enrichment::WithoutPlan {
                step,
                reason: SkipReason::NotCompleted(outcome.status),
            };
        }
        let Some(plan) = outcome.plan else {
            tracing::warn!(step_id = %step.id, "inference completed without a plan; using original step");
            return Enrichment::WithoutPlan {
                step,
                reason: SkipReason::MissingPlan,
            };
        };

        let mut enriched = step.clone();
        enriched.parameters.insert(PLAN_KEY.into(), plan);
        enriched.parameters.insert(SOURCE_KEY.into(), json!(RUNTIME_SOURCE));
        if !outcome.metadata.is_null() {
            enriched.parameters.insert(METADATA_KEY.into(), outcome.metadata);
        }
        enriched
            .parameters
            .insert(ELAPSED_KEY.into(), Value::from(outcome.elapsed_ms));

        tracing::info!(step_id = %step.id, elapsed_ms = outcome.elapsed_ms, "structural plan attached");
        Enrichment::WithPlan {
            step: enriched,
            elapsed_ms: outcome.elapsed_ms,
        }
    }
}
