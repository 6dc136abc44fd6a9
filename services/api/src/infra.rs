use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use flight_risk::workflows::frat::{
    AssessmentRecord, AssessmentRepository, AssessmentStatus, LegId,
};
use flight_risk::workflows::fuel::{
    FuelRequestId, FuelRequestRecord, FuelRequestRepository, TripId,
};
use flight_risk::workflows::RepositoryError;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
}

/// Process-local assessment store; state is lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAssessmentRepository {
    records: Arc<Mutex<HashMap<LegId, AssessmentRecord>>>,
}

impl AssessmentRepository for InMemoryAssessmentRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(record.leg_id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.leg_id().clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        record: AssessmentRecord,
        expected_revision: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        let found = guard
            .get(record.leg_id())
            .map(AssessmentRecord::revision)
            .ok_or(RepositoryError::NotFound)?;
        if found != expected_revision {
            return Err(RepositoryError::StaleRevision {
                expected: expected_revision,
                found,
            });
        }
        guard.insert(record.leg_id().clone(), record);
        Ok(())
    }

    fn fetch(&self, leg_id: &LegId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(leg_id).cloned())
    }

    fn with_status(
        &self,
        status: AssessmentStatus,
    ) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| record.status() == status)
            .cloned()
            .collect())
    }
}

/// Process-local fuel request store. The open-request check and the insert share one lock.
#[derive(Default, Clone)]
pub(crate) struct InMemoryFuelRequestRepository {
    records: Arc<Mutex<HashMap<FuelRequestId, FuelRequestRecord>>>,
    sequence: Arc<AtomicU64>,
}

impl FuelRequestRepository for InMemoryFuelRequestRepository {
    fn next_id(&self) -> Result<FuelRequestId, RepositoryError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(FuelRequestId::from_sequence(sequence))
    }

    fn insert_active(
        &self,
        record: FuelRequestRecord,
    ) -> Result<FuelRequestRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(record.request_id()) {
            return Err(RepositoryError::Conflict);
        }
        let trip_busy = guard
            .values()
            .any(|existing| existing.trip_id() == record.trip_id() && existing.is_active());
        if trip_busy {
            return Err(RepositoryError::ActiveRecordExists);
        }
        guard.insert(record.request_id().clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        record: FuelRequestRecord,
        expected_revision: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        let found = guard
            .get(record.request_id())
            .map(FuelRequestRecord::revision)
            .ok_or(RepositoryError::NotFound)?;
        if found != expected_revision {
            return Err(RepositoryError::StaleRevision {
                expected: expected_revision,
                found,
            });
        }
        guard.insert(record.request_id().clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &FuelRequestId) -> Result<Option<FuelRequestRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn active_for_trip(
        &self,
        trip_id: &TripId,
    ) -> Result<Option<FuelRequestRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|record| record.trip_id() == trip_id && record.is_active())
            .cloned())
    }

    fn for_trip(&self, trip_id: &TripId) -> Result<Vec<FuelRequestRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| record.trip_id() == trip_id)
            .cloned()
            .collect())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
