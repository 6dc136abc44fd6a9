use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::clock::FixedClock;
use crate::workflows::frat::catalog::{ChecklistCatalog, ChecklistItem, ChecklistSection};
use crate::workflows::frat::domain::{AssessmentRecord, AssessmentStatus, LegId, Selection};
use crate::workflows::frat::repository::AssessmentRepository;
use crate::workflows::frat::service::AssessmentLifecycle;
use crate::workflows::lifecycle::RepositoryError;

pub(super) fn departure_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 13, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn leg() -> LegId {
    LegId("N650GX-KTEB-KPBI-0314".to_string())
}

fn item(id: &str, weight: u32) -> ChecklistItem {
    ChecklistItem {
        id: id.to_string(),
        label: format!("{id} label"),
        weight,
    }
}

pub(super) fn catalog() -> Arc<ChecklistCatalog> {
    let catalog = ChecklistCatalog::new(vec![
        ChecklistSection {
            title: "Weather".to_string(),
            items: vec![item("w1", 5), item("w2", 3), item("w3", 2)],
        },
        ChecklistSection {
            title: "Pilot Qualifications".to_string(),
            items: vec![item("p1", 4), item("p2", 3), item("p_third", 0)],
        },
    ])
    .expect("valid catalog");
    Arc::new(catalog)
}

/// w1 + w2 = 8, a Low tier selection.
pub(super) fn low_selection() -> Selection {
    Selection::from_iter([("w1", true), ("w2", true), ("w3", false)])
}

/// w1 + w2 + p1 + p2 = 15, a Medium tier selection.
pub(super) fn medium_selection() -> Selection {
    Selection::from_iter([("w1", true), ("w2", true), ("p1", true), ("p2", true)])
}

pub(super) fn build_lifecycle() -> (
    AssessmentLifecycle<MemoryAssessmentRepository>,
    Arc<MemoryAssessmentRepository>,
) {
    let repository = Arc::new(MemoryAssessmentRepository::default());
    let lifecycle = AssessmentLifecycle::new(
        repository.clone(),
        catalog(),
        Arc::new(FixedClock(departure_time())),
    );
    (lifecycle, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryAssessmentRepository {
    pub(super) records: Arc<Mutex<HashMap<LegId, AssessmentRecord>>>,
}

impl AssessmentRepository for MemoryAssessmentRepository {
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
        let stored = guard
            .get(record.leg_id())
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision() != expected_revision {
            return Err(RepositoryError::StaleRevision {
                expected: expected_revision,
                found: stored.revision(),
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

/// Lands a departure lock between the service's read and its write, once.
#[derive(Default, Clone)]
pub(super) struct DepartureRaceRepository {
    pub(super) inner: MemoryAssessmentRepository,
    fired: Arc<AtomicBool>,
}

impl AssessmentRepository for DepartureRaceRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(
        &self,
        record: AssessmentRecord,
        expected_revision: u64,
    ) -> Result<(), RepositoryError> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            let mut stored = self
                .inner
                .fetch(record.leg_id())?
                .ok_or(RepositoryError::NotFound)?;
            let current = stored.revision();
            stored.apply_lock(departure_time());
            stored.bump_revision();
            self.inner.update(stored, current)?;
        }
        self.inner.update(record, expected_revision)
    }

    fn fetch(&self, leg_id: &LegId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        self.inner.fetch(leg_id)
    }

    fn with_status(
        &self,
        status: AssessmentStatus,
    ) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        self.inner.with_status(status)
    }
}

/// Lands a competing edit before each of the next `races` updates, so those writes go stale.
#[derive(Default, Clone)]
pub(super) struct EditRaceRepository {
    pub(super) inner: MemoryAssessmentRepository,
    races: Arc<AtomicUsize>,
}

impl EditRaceRepository {
    pub(super) fn arm(&self, races: usize) {
        self.races.store(races, Ordering::SeqCst);
    }
}

impl AssessmentRepository for EditRaceRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(
        &self,
        record: AssessmentRecord,
        expected_revision: u64,
    ) -> Result<(), RepositoryError> {
        if self.races.load(Ordering::SeqCst) > 0 {
            self.races.fetch_sub(1, Ordering::SeqCst);
            let mut stored = self
                .inner
                .fetch(record.leg_id())?
                .ok_or(RepositoryError::NotFound)?;
            let current = stored.revision();
            stored.bump_revision();
            self.inner.update(stored, current)?;
        }
        self.inner.update(record, expected_revision)
    }

    fn fetch(&self, leg_id: &LegId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        self.inner.fetch(leg_id)
    }

    fn with_status(
        &self,
        status: AssessmentStatus,
    ) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        self.inner.with_status(status)
    }
}

pub(super) struct UnavailableRepository;

impl AssessmentRepository for UnavailableRepository {
    fn insert(&self, _record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _record: AssessmentRecord,
        _expected_revision: u64,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _leg_id: &LegId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn with_status(
        &self,
        _status: AssessmentStatus,
    ) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
