//! Input analysis.
//!
//! Validation of the complaint table and aggregation into per-group
//! company counts.

pub mod aggregator;
pub mod validate;

pub use aggregator::*;
