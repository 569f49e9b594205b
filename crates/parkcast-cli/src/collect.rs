//! Collector job: fetch, normalize, stage, upload and load

use anyhow::{Context, Result};
use parkcast_core::{truncate_to_second, BlobStore, Provisioner, ReadingStore, Timestamp};
use parkcast_ingest::{normalize, DocumentSource};
use parkcast_sinks::{dump_raw, read_csv, run_stamp, stage_readings, staged_object_key};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// What a collector run left behind
#[derive(Debug, Clone, PartialEq)]
pub enum CollectOutcome {
    /// Rows were staged, uploaded to `uri` and loaded
    Loaded { rows: u64, uri: String },
    /// Nothing normalized; the document was kept at this path
    RawDumped(PathBuf),
}

pub struct CollectJob {
    source: Arc<dyn DocumentSource>,
    provisioner: Arc<dyn Provisioner>,
    store: Arc<dyn ReadingStore>,
    blobs: Arc<dyn BlobStore>,
    data_dir: PathBuf,
}

impl CollectJob {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        provisioner: Arc<dyn Provisioner>,
        store: Arc<dyn ReadingStore>,
        blobs: Arc<dyn BlobStore>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            provisioner,
            store,
            blobs,
            data_dir: data_dir.into(),
        }
    }

    /// One collection pass; every row is stamped with `now`
    pub async fn run(&self, now: Timestamp) -> Result<CollectOutcome> {
        let observed_at = truncate_to_second(now);
        let stamp = run_stamp(observed_at);

        // Destination must exist even when this run loads nothing
        self.provisioner.ensure_schema().await?;

        let document = self
            .source
            .fetch()
            .await
            .with_context(|| format!("Failed to fetch from {}", self.source.name()))?;

        let rows = normalize(&document, observed_at);
        if rows.is_empty() {
            let path = dump_raw(&self.data_dir, &stamp, &document)?;
            warn!(path = %path.display(), "no rows normalized, kept raw document");
            return Ok(CollectOutcome::RawDumped(path));
        }

        let local = stage_readings(&self.data_dir, &stamp, &rows)?;
        let uri = self
            .blobs
            .upload(&local, &staged_object_key(&stamp))
            .await?;

        let staged = read_csv(&self.blobs.download(&uri).await?)
            .with_context(|| format!("Failed to read back {uri}"))?;
        let loaded = self.store.append_readings(&staged).await?;

        info!(rows = loaded, %uri, "collection loaded");
        Ok(CollectOutcome::Loaded { rows: loaded, uri })
    }
}
