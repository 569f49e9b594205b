use anyhow::{anyhow, bail, Context, Result};
use parkcast_core::BlobStore;
use std::fs::create_dir_all;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use url::Url;

/// Blob store backed by a local directory; objects are addressed by
/// `file://` URIs under that directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        create_dir_all(root)
            .with_context(|| format!("Failed to create bucket directory {}", root.display()))?;
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object key, rejecting keys that escape the root
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            bail!("invalid object key {key:?}");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, local: &Path, dest: &str) -> Result<String> {
        let target = self.object_path(dest)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local, &target)
            .await
            .with_context(|| format!("Failed to upload {}", local.display()))?;

        let uri = Url::from_file_path(&target)
            .map_err(|_| anyhow!("{} has no file URI", target.display()))?;
        debug!(%uri, "uploaded object");
        Ok(uri.to_string())
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        let url = Url::parse(uri).with_context(|| format!("Invalid object URI {uri}"))?;
        if url.scheme() != "file" {
            bail!("unsupported object URI scheme {}", url.scheme());
        }
        let path = url
            .to_file_path()
            .map_err(|_| anyhow!("{uri} is not a local path"))?;
        if !path.starts_with(&self.root) {
            bail!("{uri} is outside the bucket");
        }
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to download {uri}"))
    }
}
