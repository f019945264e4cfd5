use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    #[default]
    Pending,
    Ready,
    Stale,
    Failed,
}

/// Structural-match card produced by the analysis flow for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralCard {
    pub card_id: String,
    pub step_id: String,
    #[serde(default)]
    pub status: CardStatus,
    /// Plan computed by an earlier inference, if any.
    #[serde(default)]
    pub plan: Option<Value>,
    /// Raw targeting data the inference works from.
    #[serde(default)]
    pub payload: Value,
}

impl StructuralCard {
    pub fn new(step_id: impl Into<String>, payload: Value) -> Self {
        Self {
            card_id: uuid::Uuid::new_v4().to_string(),
            step_id: step_id.into(),
            status: CardStatus::Pending,
            plan: None,
            payload,
        }
    }
}

/// Read-only view of the step → card table.
pub trait CardLookup: Send + Sync {
    fn card_for_step(&self, step_id: &str) -> Option<StructuralCard>;

    fn needs_inference(&self, card: &StructuralCard) -> bool;
}

/// In-memory card table, filled by whatever analysis flow owns the cards.
#[derive(Debug, Default)]
pub struct CardRegistry {
    cards: RwLock<HashMap<String, StructuralCard>>,
}

impl CardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any card already registered for the same step.
    pub fn insert(&self, card: StructuralCard) -> Option<StructuralCard> {
        let mut cards = self.cards.write().unwrap_or_else(|e| e.into_inner());
        cards.insert(card.step_id.clone(), card)
    }

    pub fn remove(&self, step_id: &str) -> Option<StructuralCard> {
        let mut cards = self.cards.write().unwrap_or_else(|e| e.into_inner());
        cards.remove(step_id)
    }

    pub fn len(&self) -> usize {
        self.cards.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CardLookup for CardRegistry {
    fn card_for_step(&self, step_id: &str) -> Option<StructuralCard> {
        let cards = self.cards.read().unwrap_or_else(|e| e.into_inner());
        cards.get(step_id).cloned()
    }

    fn needs_inference(&self, card: &StructuralCard) -> bool {
        match card.status {
            CardStatus::Ready => card.plan.is_none(),
            CardStatus::Pending | CardStatus::Stale => true,
            CardStatus::Failed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_keys_cards_by_step() {
        let registry = CardRegistry::new();
        assert!(registry.is_empty());
        registry.insert(StructuralCard::new("s1", json!({ "text": "Follow" })));
        let replaced = registry.insert(StructuralCard::new("s1", json!({ "text": "Follow back" })));
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.card_for_step("s1").unwrap().payload["text"],
            "Follow back"
        );
        assert!(registry.card_for_step("s2").is_none());
        assert!(registry.remove("s1").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn inference_needed_only_without_a_fresh_plan() {
        let registry = CardRegistry::new();
        let mut card = StructuralCard::new("s1", json!({}));
        assert!(registry.needs_inference(&card));

        card.status = CardStatus::Ready;
        card.plan = Some(json!({ "strategy": "anchor" }));
        assert!(!registry.needs_inference(&card));

        card.status = CardStatus::Stale;
        assert!(registry.needs_inference(&card));

        card.status = CardStatus::Failed;
        assert!(!registry.needs_inference(&card));
    }
}
