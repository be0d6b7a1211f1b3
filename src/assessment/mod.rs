//! Dosha assessment — question catalog, scoring, and recommendations.

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod recommend;
pub mod scoring;

pub use catalog::{Catalog, Dosha, QuestionCategory, QuestionDefinition};
pub use recommend::{recommend, RecommendationSet, Therapy, TherapyTier};
pub use scoring::{score, Answer, Classification, DoshaBreakdown};

/// The full assessment outcome handed to clients and the report renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    pub dosha_results: Classification,
    pub panchakarma_recs: RecommendationSet,
}
