use std::path::Path;

use anyhow::Result;

use crate::{ForecastResult, HourlyTotal, RawReading, Timestamp};

/// Idempotent create-if-missing for every destination the jobs write to
#[async_trait::async_trait]
pub trait Provisioner: Send + Sync {
    async fn ensure_schema(&self) -> Result<()>;
}

/// Append-only store of raw readings
#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    /// Append rows, returning how many were written
    async fn append_readings(&self, rows: &[RawReading]) -> Result<u64>;

    /// Free spaces summed per hour bucket, optionally only from `since` on
    async fn hourly_totals(&self, since: Option<Timestamp>) -> Result<Vec<HourlyTotal>>;
}

/// Append-only store of training results
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    async fn append_result(&self, result: &ForecastResult) -> Result<()>;
}

/// Object storage for staged files
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a local file under `dest`, returning the object URI
    async fn upload(&self, local: &Path, dest: &str) -> Result<String>;

    async fn download(&self, uri: &str) -> Result<Vec<u8>>;
}
