use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::lifecycle::LifecycleState;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub String);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuelRequestId(pub String);

impl FuelRequestId {
    /// Canonical id for the `sequence`-th request issued by a store, e.g. `fuel-000042`.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("fuel-{sequence:06}"))
    }
}

impl fmt::Display for FuelRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelRequestStatus {
    Pending,
    Acknowledged,
    SentToFarm,
    Fueling,
    Completed,
    Cancelled,
}

impl FuelRequestStatus {
    pub const fn display_label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Acknowledged => "Acknowledged",
            Self::SentToFarm => "Sent to Fuel Farm",
            Self::Fueling => "Fueling",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Active requests count against the one-per-trip limit.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

impl LifecycleState for FuelRequestStatus {
    fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Acknowledged => "acknowledged",
            Self::SentToFarm => "sent_to_farm",
            Self::Fueling => "fueling",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        use FuelRequestStatus::*;
        match (self, next) {
            (Pending, Acknowledged)
            | (Acknowledged, SentToFarm)
            | (SentToFarm, Fueling)
            | (Fueling, Completed) => true,
            (current, Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelPriority {
    Normal,
    Urgent,
    Critical,
}

impl FuelPriority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Urgent => "Urgent",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelUnit {
    Gallons,
    Pounds,
}

/// Caller input for a new fuel request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelOrder {
    pub trip_id: TripId,
    #[serde(default = "default_priority")]
    pub priority: FuelPriority,
    pub amount_requested: u32,
    #[serde(default = "default_unit")]
    pub unit: FuelUnit,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_priority() -> FuelPriority {
    FuelPriority::Normal
}

fn default_unit() -> FuelUnit {
    FuelUnit::Gallons
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelRequestRecord {
    request_id: FuelRequestId,
    trip_id: TripId,
    status: FuelRequestStatus,
    priority: FuelPriority,
    amount_requested: u32,
    unit: FuelUnit,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    status_changed_at: DateTime<Utc>,
    revision: u64,
}

impl FuelRequestRecord {
    pub(crate) fn open(request_id: FuelRequestId, order: FuelOrder, at: DateTime<Utc>) -> Self {
        Self {
            request_id,
            trip_id: order.trip_id,
            status: FuelRequestStatus::Pending,
            priority: order.priority,
            amount_requested: order.amount_requested,
            unit: order.unit,
            notes: order.notes.filter(|text| !text.trim().is_empty()),
            created_at: at,
            status_changed_at: at,
            revision: 0,
        }
    }

    pub fn request_id(&self) -> &FuelRequestId {
        &self.request_id
    }

    pub fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    pub fn status(&self) -> FuelRequestStatus {
        self.status
    }

    pub fn priority(&self) -> FuelPriority {
        self.priority
    }

    pub fn amount_requested(&self) -> u32 {
        self.amount_requested
    }

    pub fn unit(&self) -> FuelUnit {
        self.unit
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status_changed_at(&self) -> DateTime<Utc> {
        self.status_changed_at
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub(crate) fn apply_status(&mut self, status: FuelRequestStatus, at: DateTime<Utc>) {
        self.status = status;
        self.status_changed_at = at;
        self.revision += 1;
    }

    pub fn view(&self) -> FuelRequestView {
        FuelRequestView {
            request_id: self.request_id.clone(),
            trip_id: self.trip_id.clone(),
            status: self.status,
            status_label: self.status.display_label(),
            priority: self.priority,
            priority_label: self.priority.label(),
            amount_requested: self.amount_requested,
            unit: self.unit,
            notes: self.notes.clone(),
            created_at: self.created_at,
            status_changed_at: self.status_changed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FuelRequestView {
    pub request_id: FuelRequestId,
    pub trip_id: TripId,
    pub status: FuelRequestStatus,
    pub status_label: &'static str,
    pub priority: FuelPriority,
    pub priority_label: &'static str,
    pub amount_requested: u32,
    pub unit: FuelUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
}
