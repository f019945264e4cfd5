pub mod card;
pub mod enrich;
pub mod traits;

pub use card::{CardLookup, CardRegistry, CardStatus, StructuralCard};
pub use enrich::{Enrichment, SkipReason, StepEnricher};
pub use traits::{InferenceAdapter, InferenceOutcome, InferenceStatus};
