use super::domain::{FuelRequestId, FuelRequestRecord, TripId};
use crate::workflows::lifecycle::RepositoryError;

/// Storage abstraction for fuel requests.
///
/// The store issues request ids, so every lifecycle sharing it draws from one sequence.
/// `insert_active` must check and insert atomically: a trip that already has an active
/// request yields [`RepositoryError::ActiveRecordExists`], a reused id yields
/// [`RepositoryError::Conflict`]. `update` must compare `expected_revision` before writing.
pub trait FuelRequestRepository: Send + Sync {
    fn next_id(&self) -> Result<FuelRequestId, RepositoryError>;
    fn insert_active(&self, record: FuelRequestRecord)
        -> Result<FuelRequestRecord, RepositoryError>;
    fn update(
        &self,
        record: FuelRequestRecord,
        expected_revision: u64,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &FuelRequestId) -> Result<Option<FuelRequestRecord>, RepositoryError>;
    fn active_for_trip(&self, trip_id: &TripId)
        -> Result<Option<FuelRequestRecord>, RepositoryError>;
    fn for_trip(&self, trip_id: &TripId) -> Result<Vec<FuelRequestRecord>, RepositoryError>;
}
