//! Flight Risk Assessment Tool: weighted checklist scoring and the per-leg assessment
//! lifecycle that freezes each assessment at departure.

pub mod catalog;
pub mod domain;
pub mod repository;
pub mod router;
pub mod score;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, ChecklistCatalog, ChecklistItem, ChecklistSection};
pub use domain::{
    AssessmentRecord, AssessmentStatus, AssessmentView, DepartureEvent, LegId, Selection,
};
pub use repository::AssessmentRepository;
pub use router::assessment_router;
pub use score::{
    mitigation_required, score, unrecognized_ids, RiskTier, ScoreAggregator, ScoreBreakdown,
    SectionSubtotal,
};
pub use service::{AssessmentError, AssessmentLifecycle};
