//! Crew currency and duty/rest classification.
//!
//! Everything here is a pure function of its inputs; the reference date is always passed in.

pub mod credentials;
pub mod duty;
pub mod report;
pub mod roster;
pub mod router;

pub use credentials::{
    classify, classify_date, classify_window, CredentialClassification, CredentialKind,
    CredentialStatus, CredentialWindow, DUE_SOON_WINDOW_DAYS, EXPIRING_WINDOW_DAYS,
};
pub use duty::{assess_duty, DutyAssessment, DutyRecord, FatigueBand};
pub use report::{
    AlertSeverity, ComplianceAlert, CredentialFinding, CrewComplianceReport, CrewMember,
};
pub use roster::{RosterImportError, RosterImporter};
pub use router::crew_router;
