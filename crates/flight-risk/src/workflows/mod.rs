pub mod crew;
pub mod frat;
pub mod fuel;
pub mod lifecycle;
pub mod validation;

pub use lifecycle::RepositoryError;
pub use validation::ValidationError;
