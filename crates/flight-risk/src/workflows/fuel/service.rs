use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{FuelOrder, FuelRequestId, FuelRequestRecord, FuelRequestStatus, TripId};
use super::repository::FuelRequestRepository;
use crate::clock::Clock;
use crate::workflows::lifecycle::{advance, LifecycleState, RepositoryError};
use crate::workflows::validation::ValidationError;

const MAX_CREATE_ATTEMPTS: usize = 4;

/// Drives fuel requests through `Pending -> Acknowledged -> SentToFarm -> Fueling -> Completed`,
/// with `Cancelled` reachable from every open status.
///
/// Every transition is caller-initiated. A trip holds at most one open request at a time.
pub struct FuelRequestLifecycle<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> FuelRequestLifecycle<R>
where
    R: FuelRequestRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Open a new `Pending` request for the order's trip.
    ///
    /// The request id is drawn from the repository. A clash on the id draws a fresh one; a
    /// concurrent creator opening the same trip is reported as
    /// [`FuelRequestError::ActiveRequestExists`].
    pub fn create(&self, order: FuelOrder) -> Result<FuelRequestRecord, FuelRequestError> {
        validate_order(&order)?;
        let trip_id = order.trip_id.clone();
        let mut contention = RepositoryError::Conflict;

        for _ in 0..MAX_CREATE_ATTEMPTS {
            if let Some(existing) = self.repository.active_for_trip(&trip_id)? {
                return Err(self.duplicate(&trip_id, existing.request_id().clone()));
            }

            let request_id = self.repository.next_id()?;
            let record = FuelRequestRecord::open(request_id, order.clone(), self.clock.now());
            match self.repository.insert_active(record) {
                Ok(stored) => {
                    info!(
                        request_id = %stored.request_id(),
                        trip_id = %trip_id,
                        priority = stored.priority().label(),
                        amount = stored.amount_requested(),
                        "fuel request created"
                    );
                    return Ok(stored);
                }
                // Another creator opened this trip between the check and the insert.
                Err(RepositoryError::ActiveRecordExists) => {
                    contention = RepositoryError::ActiveRecordExists;
                }
                Err(RepositoryError::Conflict) => {
                    warn!(trip_id = %trip_id, "fuel request id already taken; drawing another");
                    contention = RepositoryError::Conflict;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(contention.into())
    }

    pub fn get(&self, request_id: &FuelRequestId) -> Result<FuelRequestRecord, FuelRequestError> {
        self.repository
            .fetch(request_id)?
            .ok_or_else(|| FuelRequestError::NotFound {
                request_id: request_id.clone(),
            })
    }

    /// Move a request to `next`, which must be the following step or `Cancelled`.
    pub fn advance(
        &self,
        request_id: &FuelRequestId,
        next: FuelRequestStatus,
    ) -> Result<FuelRequestRecord, FuelRequestError> {
        let mut record = self.get(request_id)?;
        let current = record.status();
        advance(current, next).map_err(|rejected| {
            warn!(
                request_id = %request_id,
                from = rejected.from.label(),
                to = rejected.to.label(),
                "fuel request transition rejected"
            );
            FuelRequestError::InvalidTransition {
                request_id: request_id.clone(),
                from: rejected.from,
                to: rejected.to,
            }
        })?;

        let expected = record.revision();
        record.apply_status(next, self.clock.now());
        match self.repository.update(record.clone(), expected) {
            Ok(()) => {
                info!(
                    request_id = %request_id,
                    trip_id = %record.trip_id(),
                    from = current.label(),
                    to = next.label(),
                    "fuel request advanced"
                );
                Ok(record)
            }
            Err(RepositoryError::StaleRevision { found, .. }) => {
                warn!(request_id = %request_id, expected, found, "fuel request write lost a race");
                Err(FuelRequestError::ConcurrentModification {
                    request_id: request_id.clone(),
                    found,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    pub fn cancel(&self, request_id: &FuelRequestId) -> Result<FuelRequestRecord, FuelRequestError> {
        self.advance(request_id, FuelRequestStatus::Cancelled)
    }

    pub fn active_for_trip(
        &self,
        trip_id: &TripId,
    ) -> Result<Option<FuelRequestRecord>, FuelRequestError> {
        Ok(self.repository.active_for_trip(trip_id)?)
    }

    /// Every request raised for the trip, oldest first.
    pub fn history_for_trip(
        &self,
        trip_id: &TripId,
    ) -> Result<Vec<FuelRequestRecord>, FuelRequestError> {
        let mut records = self.repository.for_trip(trip_id)?;
        records.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.request_id().cmp(b.request_id()))
        });
        Ok(records)
    }

    fn duplicate(&self, trip_id: &TripId, existing: FuelRequestId) -> FuelRequestError {
        warn!(
            trip_id = %trip_id,
            existing = %existing,
            "fuel request rejected; trip already has an open request"
        );
        FuelRequestError::ActiveRequestExists {
            trip_id: trip_id.clone(),
            existing,
        }
    }
}

fn validate_order(order: &FuelOrder) -> Result<(), ValidationError> {
    if order.trip_id.0.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "trip_id" });
    }
    if order.amount_requested == 0 {
        return Err(ValidationError::out_of_range(
            "amount_requested",
            "greater than zero",
            order.amount_requested,
        ));
    }
    Ok(())
}

/// Error raised by the fuel request lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum FuelRequestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(
        "fuel request {request_id} is {}; cannot move to {}",
        .from.label(),
        .to.label()
    )]
    InvalidTransition {
        request_id: FuelRequestId,
        from: FuelRequestStatus,
        to: FuelRequestStatus,
    },
    #[error("trip {trip_id} already has an open fuel request ({existing})")]
    ActiveRequestExists {
        trip_id: TripId,
        existing: FuelRequestId,
    },
    #[error("no fuel request {request_id}")]
    NotFound { request_id: FuelRequestId },
    #[error("fuel request {request_id} changed concurrently (now at revision {found})")]
    ConcurrentModification {
        request_id: FuelRequestId,
        found: u64,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::FixedClock;
    use crate::workflows::fuel::domain::{FuelPriority, FuelUnit};

    #[derive(Default)]
    struct MemoryFuelRepository {
        records: Mutex<HashMap<FuelRequestId, FuelRequestRecord>>,
        sequence: AtomicU64,
    }

    impl FuelRequestRepository for MemoryFuelRepository {
        fn next_id(&self) -> Result<FuelRequestId, RepositoryError> {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            Ok(FuelRequestId::from_sequence(sequence))
        }

        fn insert_active(
            &self,
            record: FuelRequestRecord,
        ) -> Result<FuelRequestRecord, RepositoryError> {
            let mut records = self.records.lock().expect("repository mutex poisoned");
            if records.contains_key(record.request_id()) {
                return Err(RepositoryError::Conflict);
            }
            let occupied = records
                .values()
                .any(|existing| existing.trip_id() == record.trip_id() && existing.is_active());
            if occupied {
                return Err(RepositoryError::ActiveRecordExists);
            }
            records.insert(record.request_id().clone(), record.clone());
            Ok(record)
        }

        fn update(
            &self,
            record: FuelRequestRecord,
            expected_revision: u64,
        ) -> Result<(), RepositoryError> {
            let mut records = self.records.lock().expect("repository mutex poisoned");
            let stored = records
                .get_mut(record.request_id())
                .ok_or(RepositoryError::NotFound)?;
            if stored.revision() != expected_revision {
                return Err(RepositoryError::StaleRevision {
                    expected: expected_revision,
                    found: stored.revision(),
                });
            }
            *stored = record;
            Ok(())
        }

        fn fetch(&self, id: &FuelRequestId) -> Result<Option<FuelRequestRecord>, RepositoryError> {
            Ok(self.records.lock().expect("repository mutex poisoned").get(id).cloned())
        }

        fn active_for_trip(
            &self,
            trip_id: &TripId,
        ) -> Result<Option<FuelRequestRecord>, RepositoryError> {
            Ok(self
                .records
                .lock()
                .expect("repository mutex poisoned")
                .values()
                .find(|record| record.trip_id() == trip_id && record.is_active())
                .cloned())
        }

        fn for_trip(&self, trip_id: &TripId) -> Result<Vec<FuelRequestRecord>, RepositoryError> {
            Ok(self
                .records
                .lock()
                .expect("repository mutex poisoned")
                .values()
                .filter(|record| record.trip_id() == trip_id)
                .cloned()
                .collect())
        }
    }

    /// Lets a concurrent creator slip in: the open-request check misses the stored record for the
    /// first `hidden` lookups while the insert still sees it.
    #[derive(Default)]
    struct RacingFuelRepository {
        inner: MemoryFuelRepository,
        hidden: AtomicUsize,
    }

    impl FuelRequestRepository for RacingFuelRepository {
        fn next_id(&self) -> Result<FuelRequestId, RepositoryError> {
            self.inner.next_id()
        }

        fn insert_active(
            &self,
            record: FuelRequestRecord,
        ) -> Result<FuelRequestRecord, RepositoryError> {
            self.inner.insert_active(record)
        }

        fn update(
            &self,
            record: FuelRequestRecord,
            expected_revision: u64,
        ) -> Result<(), RepositoryError> {
            self.inner.update(record, expected_revision)
        }

        fn fetch(&self, id: &FuelRequestId) -> Result<Option<FuelRequestRecord>, RepositoryError> {
            self.inner.fetch(id)
        }

        fn active_for_trip(
            &self,
            trip_id: &TripId,
        ) -> Result<Option<FuelRequestRecord>, RepositoryError> {
            let hide = self
                .hidden
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if hide {
                return Ok(None);
            }
            self.inner.active_for_trip(trip_id)
        }

        fn for_trip(&self, trip_id: &TripId) -> Result<Vec<FuelRequestRecord>, RepositoryError> {
            self.inner.for_trip(trip_id)
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0)
                .single()
                .expect("valid timestamp"),
        ))
    }

    fn lifecycle() -> FuelRequestLifecycle<MemoryFuelRepository> {
        FuelRequestLifecycle::new(Arc::new(MemoryFuelRepository::default()), clock())
    }

    fn order(trip: &str) -> FuelOrder {
        FuelOrder {
            trip_id: TripId(trip.to_string()),
            priority: FuelPriority::Urgent,
            amount_requested: 400,
            unit: FuelUnit::Gallons,
            notes: Some("top off mains".to_string()),
        }
    }

    #[test]
    fn create_opens_pending_request_with_sequential_id() {
        let lifecycle = lifecycle();
        let first = lifecycle.create(order("TRIP-1")).expect("first request");
        let second = lifecycle.create(order("TRIP-2")).expect("second request");

        assert_eq!(first.status(), FuelRequestStatus::Pending);
        assert_eq!(first.request_id().0, "fuel-000001");
        assert_eq!(second.request_id().0, "fuel-000002");
        assert_eq!(first.created_at(), first.status_changed_at());
    }

    #[test]
    fn second_open_request_for_trip_is_rejected() {
        let lifecycle = lifecycle();
        let first = lifecycle.create(order("TRIP-1")).expect("first request");

        let error = lifecycle.create(order("TRIP-1")).expect_err("duplicate");
        match error {
            FuelRequestError::ActiveRequestExists { trip_id, existing } => {
                assert_eq!(trip_id.0, "TRIP-1");
                assert_eq!(&existing, first.request_id());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn insert_race_on_same_trip_reports_the_open_request() {
        let repository = Arc::new(RacingFuelRepository::default());
        let lifecycle = FuelRequestLifecycle::new(Arc::clone(&repository), clock());
        let first = lifecycle.create(order("TRIP-1")).expect("first request");

        repository.hidden.store(1, Ordering::SeqCst);
        let error = lifecycle.create(order("TRIP-1")).expect_err("racing duplicate");
        match error {
            FuelRequestError::ActiveRequestExists { trip_id, existing } => {
                assert_eq!(trip_id.0, "TRIP-1");
                assert_eq!(&existing, first.request_id());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(repository.hidden.load(Ordering::SeqCst), 0);
        assert_eq!(
            repository
                .for_trip(&TripId("TRIP-1".into()))
                .expect("history")
                .len(),
            1
        );
    }

    #[test]
    fn taken_id_is_replaced_with_a_fresh_one() {
        let repository = Arc::new(MemoryFuelRepository::default());
        let lifecycle = FuelRequestLifecycle::new(Arc::clone(&repository), clock());
        let first = lifecycle.create(order("TRIP-1")).expect("first request");

        // Rewind the counter so the next draw repeats an id already on file.
        repository.sequence.store(0, Ordering::SeqCst);
        let second = lifecycle.create(order("TRIP-2")).expect("second request");

        assert_eq!(first.request_id().0, "fuel-000001");
        assert_eq!(second.request_id().0, "fuel-000002");
        assert_eq!(second.status(), FuelRequestStatus::Pending);
    }

    #[test]
    fn new_request_allowed_after_previous_closes() {
        let lifecycle = lifecycle();
        let first = lifecycle.create(order("TRIP-1")).expect("first request");
        lifecycle.cancel(first.request_id()).expect("cancel");

        let replacement = lifecycle.create(order("TRIP-1")).expect("replacement");
        let history = lifecycle
            .history_for_trip(&TripId("TRIP-1".into()))
            .expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(
            lifecycle
                .active_for_trip(&TripId("TRIP-1".into()))
                .expect("lookup")
                .map(|record| record.request_id().clone()),
            Some(replacement.request_id().clone())
        );
    }

    #[test]
    fn full_chain_reaches_completed() {
        let lifecycle = lifecycle();
        let id = lifecycle
            .create(order("TRIP-1"))
            .expect("create")
            .request_id()
            .clone();

        for next in [
            FuelRequestStatus::Acknowledged,
            FuelRequestStatus::SentToFarm,
            FuelRequestStatus::Fueling,
            FuelRequestStatus::Completed,
        ] {
            let record = lifecycle.advance(&id, next).expect("advance");
            assert_eq!(record.status(), next);
        }

        let error = lifecycle.cancel(&id).expect_err("completed is terminal");
        assert!(matches!(
            error,
            FuelRequestError::InvalidTransition {
                from: FuelRequestStatus::Completed,
                to: FuelRequestStatus::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let lifecycle = lifecycle();
        let id = lifecycle
            .create(order("TRIP-1"))
            .expect("create")
            .request_id()
            .clone();

        let error = lifecycle
            .advance(&id, FuelRequestStatus::Fueling)
            .expect_err("skip");
        assert!(matches!(error, FuelRequestError::InvalidTransition { .. }));
        assert_eq!(
            lifecycle.get(&id).expect("stored").status(),
            FuelRequestStatus::Pending
        );
    }

    #[test]
    fn zero_amount_fails_validation() {
        let lifecycle = lifecycle();
        let mut zero = order("TRIP-1");
        zero.amount_requested = 0;

        let error = lifecycle.create(zero).expect_err("zero amount");
        assert!(matches!(
            error,
            FuelRequestError::Validation(ValidationError::OutOfRange {
                field: "amount_requested",
                ..
            })
        ));
    }

    #[test]
    fn unknown_request_is_not_found() {
        let error = lifecycle()
            .get(&FuelRequestId("fuel-999999".into()))
            .expect_err("missing");
        assert!(matches!(error, FuelRequestError::NotFound { .. }));
    }
}
