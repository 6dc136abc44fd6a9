use super::domain::{AssessmentRecord, AssessmentStatus, LegId};
use crate::workflows::lifecycle::RepositoryError;

/// Storage abstraction for per-leg assessments; the host owns durability.
///
/// Implementations must enforce one record per [`LegId`] on `insert` and must reject an
/// `update` whose `expected_revision` no longer matches the stored record.
pub trait AssessmentRepository: Send + Sync {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError>;
    fn update(
        &self,
        record: AssessmentRecord,
        expected_revision: u64,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, leg_id: &LegId) -> Result<Option<AssessmentRecord>, RepositoryError>;
    fn with_status(
        &self,
        status: AssessmentStatus,
    ) -> Result<Vec<AssessmentRecord>, RepositoryError>;
}
