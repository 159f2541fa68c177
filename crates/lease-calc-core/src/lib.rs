pub mod costing;
pub mod error;
pub mod pricing;
pub mod ranking;
pub mod rules;
pub mod types;

#[cfg(feature = "catalog")]
pub mod catalog;

pub use error::LeasingError;
pub use types::*;

/// Standard result type for all leasing calculator operations
pub type LeasingResult<T> = Result<T, LeasingError>;
