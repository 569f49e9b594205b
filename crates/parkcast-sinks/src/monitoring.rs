use anyhow::{Context, Result};
use parkcast_core::{format_timestamp, ForecastResult};
use std::fs::{create_dir_all, OpenOptions};
use std::path::{Path, PathBuf};

const HEADER: [&str; 4] = ["run_at", "train_points", "mae", "model_desc"];

/// Append-only CSV of per-run training metrics
pub struct MetricsLog {
    file: PathBuf,
}

impl MetricsLog {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        create_dir_all(dir)?;
        Ok(Self {
            file: dir.join("metrics.csv"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Append one line for `result`; an undefined MAE is left empty
    pub fn append(&self, result: &ForecastResult) -> Result<()> {
        let is_new = !self.file.exists();
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)
            .with_context(|| format!("Failed to open {}", self.file.display()))?;

        let mut csv = csv::WriterBuilder::new().has_headers(false).from_writer(f);
        if is_new {
            csv.write_record(HEADER)?;
        }
        let mae = if result.mae.is_finite() {
            result.mae.to_string()
        } else {
            String::new()
        };
        csv.write_record([
            format_timestamp(&result.run_at),
            result.train_points.to_string(),
            mae,
            result.model_desc.clone(),
        ])?;
        csv.flush()?;
        Ok(())
    }
}
