#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use flight_risk::workflows::frat::{
    AssessmentRecord, AssessmentRepository, AssessmentStatus, LegId,
};
use flight_risk::workflows::fuel::{
    FuelRequestId, FuelRequestRecord, FuelRequestRepository, TripId,
};
use flight_risk::workflows::RepositoryError;
use serde_json::Value;

pub fn briefing_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[derive(Default, Clone)]
pub struct MemoryAssessments {
    records: Arc<Mutex<HashMap<LegId, AssessmentRecord>>>,
}

impl AssessmentRepository for MemoryAssessments {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(leg_id).cloned())
    }

    fn with_status(
        &self,
        status: AssessmentStatus,
    ) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.status() == status)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct MemoryFuelRequests {
    records: Arc<Mutex<HashMap<FuelRequestId, FuelRequestRecord>>>,
    sequence: Arc<AtomicU64>,
}

impl FuelRequestRepository for MemoryFuelRequests {
    fn next_id(&self) -> Result<FuelRequestId, RepositoryError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(FuelRequestId::from_sequence(sequence))
    }

    fn insert_active(
        &self,
        record: FuelRequestRecord,
    ) -> Result<FuelRequestRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn active_for_trip(
        &self,
        trip_id: &TripId,
    ) -> Result<Option<FuelRequestRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.trip_id() == trip_id && record.is_active())
            .cloned())
    }

    fn for_trip(&self, trip_id: &TripId) -> Result<Vec<FuelRequestRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.trip_id() == trip_id)
            .cloned()
            .collect())
    }
}

pub async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
