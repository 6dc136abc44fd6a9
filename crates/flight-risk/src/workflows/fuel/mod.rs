//! Fuel load requests: one active request per trip, advanced by ground and flight crews.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    FuelOrder, FuelPriority, FuelRequestId, FuelRequestRecord, FuelRequestStatus,
    FuelRequestView, FuelUnit, TripId,
};
pub use repository::FuelRequestRepository;
pub use router::fuel_router;
pub use service::{FuelRequestError, FuelRequestLifecycle};
