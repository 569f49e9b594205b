//! File artifacts written by the jobs: the staged CSV, raw document dumps,
//! the filesystem blob store and the monitoring log.

pub mod blob;
pub mod monitoring;
pub mod staging;

pub use blob::FsBlobStore;
pub use monitoring::MetricsLog;
pub use staging::*;
