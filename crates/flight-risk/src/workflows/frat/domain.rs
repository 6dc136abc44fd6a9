use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::score::RiskTier;
use crate::workflows::lifecycle::LifecycleState;

/// Opaque key of a scheduled flight leg.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegId(pub String);

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checklist answers keyed by item id. Missing ids read as not selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<String, bool>);

impl Selection {
    pub fn set(&mut self, id: impl Into<String>, selected: bool) {
        self.0.insert(id.into(), selected);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.0.get(id).copied().unwrap_or(false)
    }

    /// Every id mentioned, selected or not.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(id, _)| id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for Selection {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(id, selected)| (id.into(), selected))
                .collect(),
        )
    }
}

/// Status of a per-leg risk assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    NotStarted,
    Draft,
    Submitted,
    Locked,
}

impl AssessmentStatus {
    pub const fn display_label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Locked => "Locked",
        }
    }
}

impl LifecycleState for AssessmentStatus {
    fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Locked => "locked",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        use AssessmentStatus::*;
        matches!(
            (self, next),
            (NotStarted, Draft)
                | (Draft, Draft)
                | (Draft, Submitted)
                | (Submitted, Submitted)
                | (NotStarted, Locked)
                | (Draft, Locked)
                | (Submitted, Locked)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// Risk assessment for one flight leg.
///
/// Score fields are derived from `selection` on every mutation and timestamps are written by
/// transitions only, so the fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    leg_id: LegId,
    status: AssessmentStatus,
    selection: Option<Selection>,
    total_score: u64,
    mitigation_notes: Option<String>,
    submitted_total: Option<u64>,
    submitted_at: Option<DateTime<Utc>>,
    last_edited_at: Option<DateTime<Utc>>,
    locked_at: Option<DateTime<Utc>>,
    revision: u64,
}

impl AssessmentRecord {
    pub fn new(leg_id: LegId) -> Self {
        Self {
            leg_id,
            status: AssessmentStatus::NotStarted,
            selection: None,
            total_score: 0,
            mitigation_notes: None,
            submitted_total: None,
            submitted_at: None,
            last_edited_at: None,
            locked_at: None,
            revision: 0,
        }
    }

    pub fn leg_id(&self) -> &LegId {
        &self.leg_id
    }

    pub fn status(&self) -> AssessmentStatus {
        self.status
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn total_score(&self) -> u64 {
        self.total_score
    }

    pub fn tier(&self) -> RiskTier {
        RiskTier::from_total(self.total_score)
    }

    pub fn mitigation_required(&self) -> bool {
        super::score::mitigation_required(self.total_score)
    }

    pub fn mitigation_notes(&self) -> Option<&str> {
        self.mitigation_notes.as_deref()
    }

    pub fn submitted_total(&self) -> Option<u64> {
        self.submitted_total
    }

    pub fn submitted_tier(&self) -> Option<RiskTier> {
        self.submitted_total.map(RiskTier::from_total)
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn last_edited_at(&self) -> Option<DateTime<Utc>> {
        self.last_edited_at
    }

    pub fn locked_at(&self) -> Option<DateTime<Utc>> {
        self.locked_at
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_locked(&self) -> bool {
        self.status == AssessmentStatus::Locked
    }

    pub(crate) fn apply_edit(
        &mut self,
        status: AssessmentStatus,
        selection: Selection,
        total_score: u64,
        at: DateTime<Utc>,
    ) {
        self.status = status;
        self.selection = Some(selection);
        self.total_score = total_score;
        self.last_edited_at = Some(at);
    }

    pub(crate) fn apply_submission(&mut self, at: DateTime<Utc>) {
        self.status = AssessmentStatus::Submitted;
        self.submitted_total = Some(self.total_score);
        self.submitted_at = Some(at);
    }

    pub(crate) fn apply_lock(&mut self, at: DateTime<Utc>) {
        self.status = AssessmentStatus::Locked;
        self.locked_at = Some(at);
    }

    pub(crate) fn apply_mitigation_notes(&mut self, notes: Option<String>, at: DateTime<Utc>) {
        self.mitigation_notes = notes;
        self.last_edited_at = Some(at);
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }

    pub fn view(&self) -> AssessmentView {
        AssessmentView {
            leg_id: self.leg_id.clone(),
            status: self.status,
            status_label: self.status.display_label(),
            total_score: self.total_score,
            tier: self.tier(),
            tier_label: self.tier().label(),
            mitigation_required: self.mitigation_required(),
            mitigation_notes: self.mitigation_notes.clone(),
            submitted_total: self.submitted_total,
            submitted_tier: self.submitted_tier(),
            submitted_at: self.submitted_at,
            last_edited_at: self.last_edited_at,
            locked_at: self.locked_at,
            selected_items: self
                .selection
                .as_ref()
                .map(|selection| selection.selected_ids().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }
}

/// Presentation snapshot of an assessment for badges and exports.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentView {
    pub leg_id: LegId,
    pub status: AssessmentStatus,
    pub status_label: &'static str,
    pub total_score: u64,
    pub tier: RiskTier,
    pub tier_label: &'static str,
    pub mitigation_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_tier: Option<RiskTier>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub last_edited_at: Option<DateTime<Utc>>,
    pub locked_at: Option<DateTime<Utc>>,
    pub selected_items: Vec<String>,
}

/// OOOI-derived departure signal for one leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureEvent {
    pub leg_id: LegId,
    pub departed: bool,
}
