//! Hourly series regularization
//!
//! Sums raw readings into hour buckets and reindexes them onto a
//! contiguous hourly grid, forward-filling the hours nobody reported.

pub mod buckets;
pub mod builder;

pub use buckets::*;
pub use builder::*;

use parkcast_core::Timestamp;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("No usable readings to build a series from")]
    EmptySeries,

    #[error("Hourly point {0} is not on the hour")]
    OffHour(Timestamp),

    #[error("Hourly points must be strictly ascending, got {hour} after {previous}")]
    Unordered { previous: Timestamp, hour: Timestamp },

    #[error("Invalid series: {0}")]
    Invalid(#[from] parkcast_core::CoreError),
}

pub type SeriesResult<T> = Result<T, SeriesError>;
