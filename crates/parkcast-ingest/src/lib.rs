//! Upstream document sources and record normalization
//!
//! A [`DocumentSource`] yields the raw JSON published by the open-data
//! endpoint; [`normalize`] turns whatever shape it has into fixed-shape
//! [`RawReading`](parkcast_core::RawReading) rows.

pub mod fetcher;
pub mod fields;
pub mod file_source;
pub mod normalize;
pub mod numeric;

pub use fetcher::*;
pub use file_source::*;
pub use normalize::*;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Fetch from {url} failed after {attempts} attempts: {last}")]
    Fetch {
        url: String,
        attempts: u32,
        #[source]
        last: AttemptError,
    },

    #[error("Invalid source configuration: {0}")]
    InvalidSource(String),

    #[error("Could not read document {path}: {reason}")]
    Document { path: String, reason: String },
}

/// Why a single fetch attempt failed
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("body is not JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Anything that can produce the upstream JSON document
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    /// Source name/identifier for logs
    fn name(&self) -> &str;

    /// Retrieve one document
    async fn fetch(&self) -> IngestResult<Value>;
}
