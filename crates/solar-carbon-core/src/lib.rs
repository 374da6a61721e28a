pub mod config;
pub mod energy;
pub mod error;
pub mod pricing;
pub mod proposal;
pub mod revenue;
pub mod shares;
pub mod types;
pub mod units;

pub use error::CarbonError;
pub use types::*;

/// Standard result type for all solar-carbon operations
pub type CarbonResult<T> = Result<T, CarbonError>;
