//! Shared skeleton for the per-key record lifecycles.
//!
//! Both the risk assessment and the fuel request lifecycles are small status enums with a
//! fixed transition table. Each status type declares its table through [`LifecycleState`];
//! services call [`advance`] so that every rejected move carries the same context.
//!
//! Records are versioned: repositories compare the stored revision before every write, which
//! is how a departure lock supersedes an edit that read the record before the lock landed.

use std::fmt::Debug;

/// Status enum driving a record lifecycle.
pub trait LifecycleState: Copy + Eq + Debug {
    /// Stable machine label used in views and error payloads.
    fn label(self) -> &'static str;

    /// Whether `self -> next` appears in the transition table.
    fn can_transition_to(self, next: Self) -> bool;

    /// Terminal states absorb every transition attempt.
    fn is_terminal(self) -> bool;
}

/// A transition the table does not permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRejected<S> {
    pub from: S,
    pub to: S,
}

/// Validate `current -> next` against the table of `S`.
pub fn advance<S: LifecycleState>(current: S, next: S) -> Result<S, TransitionRejected<S>> {
    if current.can_transition_to(next) {
        Ok(next)
    } else {
        Err(TransitionRejected {
            from: current,
            to: next,
        })
    }
}

/// Storage failures shared by the lifecycle repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("another active record already holds this key")]
    ActiveRecordExists,
    #[error("record not found")]
    NotFound,
    #[error("stale revision (expected {expected}, stored {found})")]
    StaleRevision { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
