//! Core data types, hour bucketing and pipeline seams for parkcast
//!
//! This crate provides the shapes shared by the collector and the trainer:
//! raw parking readings, the regular hourly series built from them, and the
//! forecast results written back to the warehouse.

pub mod pipeline;
pub mod rollups;
pub mod types;

pub use pipeline::*;
pub use rollups::*;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("Series has no points")]
    EmptySeries,

    #[error("Series start {0} is not aligned to the hour")]
    MisalignedStart(Timestamp),

    #[error("Length mismatch: {values} values, {observed} observation flags")]
    LengthMismatch { values: usize, observed: usize },
}
