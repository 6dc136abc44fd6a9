//! Flight risk and compliance engine.
//!
//! The workflow modules are storage-agnostic: hosts inject repositories and a clock, and
//! receive plain records back. The HTTP routers are thin adapters over the same services.

pub mod clock;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
