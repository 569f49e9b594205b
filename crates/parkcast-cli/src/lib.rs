//! Batch jobs behind the `parkcast` binary
//!
//! Both jobs are written against the seams in `parkcast-core`, so they run
//! the same over the Postgres warehouse and over in-memory stores.

pub mod collect;
pub mod train;

pub use collect::{CollectJob, CollectOutcome};
pub use train::{TrainJob, TrainSettings};
