//! Replays a saved document from disk (raw dumps, fixtures)

use crate::{DocumentSource, IngestError, IngestResult};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn document_error(&self, reason: impl ToString) -> IngestError {
        IngestError::Document {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl DocumentSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> IngestResult<Value> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.document_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| self.document_error(e))
    }
}
