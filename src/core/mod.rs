//! Core business logic: snapshots, rebasing, comparison and rendering

pub mod comparison;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod query;
pub mod rates;
pub mod report;
pub mod usage;

// Re-export main types for cleaner imports
pub use comparison::{ComparisonRow, Direction, compare};
pub use currency::RateProvider;
pub use error::FxError;
pub use rates::{CurrencyCatalog, RateSnapshot};
pub use usage::{UsageHealth, UsageInfo};
