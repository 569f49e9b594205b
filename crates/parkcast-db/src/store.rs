use anyhow::{Context, Result};
use parkcast_core::{
    ForecastResult, HourlyTotal, Provisioner, RawReading, ReadingStore, ResultStore, Timestamp,
};

use crate::DbClient;

#[async_trait::async_trait]
impl Provisioner for DbClient {
    async fn ensure_schema(&self) -> Result<()> {
        DbClient::ensure_schema(self)
            .await
            .with_context(|| format!("Failed to provision schema {}", self.tables().schema()))
    }
}

#[async_trait::async_trait]
impl ReadingStore for DbClient {
    async fn append_readings(&self, rows: &[RawReading]) -> Result<u64> {
        self.insert_readings(rows)
            .await
            .with_context(|| format!("Failed to load rows into {}", self.tables().raw()))
    }

    async fn hourly_totals(&self, since: Option<Timestamp>) -> Result<Vec<HourlyTotal>> {
        DbClient::hourly_totals(self, since)
            .await
            .with_context(|| format!("Failed to query {}", self.tables().raw()))
    }
}

#[async_trait::async_trait]
impl ResultStore for DbClient {
    async fn append_result(&self, result: &ForecastResult) -> Result<()> {
        self.insert_result(result)
            .await
            .context("Failed to store training results")
    }
}
