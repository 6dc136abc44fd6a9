use std::sync::Arc;

use tracing::{info, warn};

use super::catalog::ChecklistCatalog;
use super::domain::{AssessmentRecord, AssessmentStatus, DepartureEvent, LegId, Selection};
use super::repository::AssessmentRepository;
use super::score::ScoreAggregator;
use crate::clock::Clock;
use crate::workflows::lifecycle::{advance, LifecycleState, RepositoryError};
use crate::workflows::validation::ValidationError;

pub const MAX_LOCK_ATTEMPTS: usize = 8;

/// Drives per-leg risk assessments through `NotStarted -> Draft -> Submitted -> Locked`.
///
/// Writes are compare-and-swap on the record revision. A write that loses to a departure lock
/// fails with [`AssessmentError::InvalidTransition`]; a lock that loses to an edit is reapplied
/// on the fresh record.
pub struct AssessmentLifecycle<R> {
    repository: Arc<R>,
    scorer: ScoreAggregator,
    clock: Arc<dyn Clock>,
}

impl<R> AssessmentLifecycle<R>
where
    R: AssessmentRepository + 'static,
{
    pub fn new(repository: Arc<R>, catalog: Arc<ChecklistCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            scorer: ScoreAggregator::new(catalog),
            clock,
        }
    }

    pub fn scorer(&self) -> &ScoreAggregator {
        &self.scorer
    }

    /// Return the leg's assessment, creating it as `NotStarted` on first sight.
    pub fn observe(&self, leg_id: &LegId) -> Result<AssessmentRecord, AssessmentError> {
        if let Some(existing) = self.repository.fetch(leg_id)? {
            return Ok(existing);
        }

        match self.repository.insert(AssessmentRecord::new(leg_id.clone())) {
            Ok(record) => {
                info!(leg_id = %leg_id, "risk assessment opened");
                Ok(record)
            }
            // Another caller observed the leg first; theirs is the one record.
            Err(RepositoryError::Conflict) => self.get(leg_id),
            Err(other) => Err(other.into()),
        }
    }

    pub fn get(&self, leg_id: &LegId) -> Result<AssessmentRecord, AssessmentError> {
        self.repository
            .fetch(leg_id)?
            .ok_or_else(|| AssessmentError::NotFound {
                leg_id: leg_id.clone(),
            })
    }

    /// Save checklist answers. Drafts stay drafts; editing a submitted record resubmits it.
    pub fn edit(
        &self,
        leg_id: &LegId,
        selection: Selection,
    ) -> Result<AssessmentRecord, AssessmentError> {
        let mut record = self.get(leg_id)?;
        let next = match record.status() {
            AssessmentStatus::Submitted => AssessmentStatus::Submitted,
            _ => AssessmentStatus::Draft,
        };
        self.ensure_transition(&record, next)?;
        self.warn_unrecognized(leg_id, &selection);

        let now = self.clock.now();
        let breakdown = self.scorer.score(&selection);
        record.apply_edit(next, selection, breakdown.total, now);
        if next == AssessmentStatus::Submitted {
            record.apply_submission(now);
        }

        let stored = self.commit(record, next)?;
        info!(
            leg_id = %leg_id,
            status = stored.status().label(),
            total = stored.total_score(),
            tier = stored.tier().label(),
            "risk assessment edited"
        );
        Ok(stored)
    }

    /// Submit the assessment, snapshotting the score at submission time.
    ///
    /// `selection` replaces the stored answers when given. Submission needs answers from one
    /// of the two sources; mitigation notes are never required.
    pub fn submit(
        &self,
        leg_id: &LegId,
        selection: Option<Selection>,
    ) -> Result<AssessmentRecord, AssessmentError> {
        let mut record = self.get(leg_id)?;
        self.ensure_transition_or_draft(&record, AssessmentStatus::Submitted)?;

        let selection = match selection.or_else(|| record.selection().cloned()) {
            Some(selection) => selection,
            None => {
                return Err(ValidationError::MissingField { field: "selection" }.into());
            }
        };
        self.warn_unrecognized(leg_id, &selection);

        let now = self.clock.now();
        let breakdown = self.scorer.score(&selection);
        let edited_status = match record.status() {
            AssessmentStatus::NotStarted => AssessmentStatus::Draft,
            current => current,
        };
        record.apply_edit(edited_status, selection, breakdown.total, now);
        record.apply_submission(now);

        let stored = self.commit(record, AssessmentStatus::Submitted)?;
        info!(
            leg_id = %leg_id,
            total = stored.total_score(),
            tier = stored.tier().label(),
            mitigation_required = stored.mitigation_required(),
            "risk assessment submitted"
        );
        if stored.mitigation_required() && stored.mitigation_notes().is_none() {
            info!(leg_id = %leg_id, "submitted without mitigation notes");
        }
        Ok(stored)
    }

    /// Attach or clear mitigation notes while the record is still editable.
    pub fn record_mitigation(
        &self,
        leg_id: &LegId,
        notes: Option<String>,
    ) -> Result<AssessmentRecord, AssessmentError> {
        let mut record = self.get(leg_id)?;
        let status = record.status();
        if status.is_terminal() {
            warn!(leg_id = %leg_id, "mitigation notes rejected on locked assessment");
            return Err(AssessmentError::Frozen {
                leg_id: leg_id.clone(),
            });
        }

        let notes = notes.filter(|text| !text.trim().is_empty());
        record.apply_mitigation_notes(notes, self.clock.now());
        self.commit(record, status)
    }

    /// Freeze the assessment for audit. Locking a locked record is a no-op.
    ///
    /// Each lost compare-and-swap re-reads the record and tries again. After
    /// `MAX_LOCK_ATTEMPTS` consecutive losses to other writers the lock gives up with
    /// [`AssessmentError::ConcurrentModification`]; the departure feed is expected to redeliver.
    pub fn lock(&self, leg_id: &LegId) -> Result<AssessmentRecord, AssessmentError> {
        for _ in 0..MAX_LOCK_ATTEMPTS {
            let mut record = self.get(leg_id)?;
            if record.is_locked() {
                return Ok(record);
            }

            let expected = record.revision();
            advance(record.status(), AssessmentStatus::Locked)
                .map_err(|rejected| self.rejected(leg_id, rejected.from, rejected.to))?;
            record.apply_lock(self.clock.now());
            record.bump_revision();

            match self.repository.update(record.clone(), expected) {
                Ok(()) => {
                    info!(
                        leg_id = %leg_id,
                        total = record.total_score(),
                        tier = record.tier().label(),
                        "risk assessment locked"
                    );
                    return Ok(record);
                }
                Err(RepositoryError::StaleRevision { .. }) => continue,
                Err(other) => return Err(other.into()),
            }
        }

        let found = self.get(leg_id)?.revision();
        Err(AssessmentError::ConcurrentModification {
            leg_id: leg_id.clone(),
            found,
        })
    }

    /// Apply an OOOI departure signal; only `departed == true` locks.
    pub fn record_departure(
        &self,
        event: &DepartureEvent,
    ) -> Result<AssessmentRecord, AssessmentError> {
        if event.departed {
            self.lock(&event.leg_id)
        } else {
            self.get(&event.leg_id)
        }
    }

    /// Assessments still awaiting submission.
    pub fn pending(&self) -> Result<Vec<AssessmentRecord>, AssessmentError> {
        let mut records = self.repository.with_status(AssessmentStatus::NotStarted)?;
        records.extend(self.repository.with_status(AssessmentStatus::Draft)?);
        records.sort_by(|a, b| a.leg_id().cmp(b.leg_id()));
        Ok(records)
    }

    fn ensure_transition(
        &self,
        record: &AssessmentRecord,
        next: AssessmentStatus,
    ) -> Result<(), AssessmentError> {
        advance(record.status(), next)
            .map(|_| ())
            .map_err(|rejected| self.rejected(record.leg_id(), rejected.from, rejected.to))
    }

    // Submitting straight from NotStarted passes through Draft.
    fn ensure_transition_or_draft(
        &self,
        record: &AssessmentRecord,
        next: AssessmentStatus,
    ) -> Result<(), AssessmentError> {
        if record.status() == AssessmentStatus::NotStarted {
            self.ensure_transition(record, AssessmentStatus::Draft)
        } else {
            self.ensure_transition(record, next)
        }
    }

    fn commit(
        &self,
        mut record: AssessmentRecord,
        attempted: AssessmentStatus,
    ) -> Result<AssessmentRecord, AssessmentError> {
        let expected = record.revision();
        record.bump_revision();

        match self.repository.update(record.clone(), expected) {
            Ok(()) => Ok(record),
            Err(RepositoryError::StaleRevision { found, .. }) => {
                let current = self.get(record.leg_id())?;
                if current.is_locked() {
                    Err(self.rejected(record.leg_id(), AssessmentStatus::Locked, attempted))
                } else {
                    warn!(
                        leg_id = %record.leg_id(),
                        expected,
                        found,
                        "risk assessment write lost a race"
                    );
                    Err(AssessmentError::ConcurrentModification {
                        leg_id: record.leg_id().clone(),
                        found: current.revision(),
                    })
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    fn rejected(
        &self,
        leg_id: &LegId,
        from: AssessmentStatus,
        attempted: AssessmentStatus,
    ) -> AssessmentError {
        warn!(
            leg_id = %leg_id,
            from = from.label(),
            attempted = attempted.label(),
            "risk assessment transition rejected"
        );
        AssessmentError::InvalidTransition {
            leg_id: leg_id.clone(),
            from,
            attempted,
        }
    }

    fn warn_unrecognized(&self, leg_id: &LegId, selection: &Selection) {
        let unknown = self.scorer.unrecognized_ids(selection);
        if !unknown.is_empty() {
            warn!(leg_id = %leg_id, ids = ?unknown, "selection references unknown checklist ids");
        }
    }
}

/// Error raised by the assessment lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(
        "assessment for leg {leg_id} is {}; cannot move to {}",
        .from.label(),
        .attempted.label()
    )]
    InvalidTransition {
        leg_id: LegId,
        from: AssessmentStatus,
        attempted: AssessmentStatus,
    },
    #[error("assessment for leg {leg_id} is locked; mitigation notes can no longer change")]
    Frozen { leg_id: LegId },
    #[error("no assessment recorded for leg {leg_id}")]
    NotFound { leg_id: LegId },
    #[error("assessment for leg {leg_id} changed concurrently (now at revision {found})")]
    ConcurrentModification { leg_id: LegId, found: u64 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
