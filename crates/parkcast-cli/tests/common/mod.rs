#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use parkcast_core::{
    truncate_to_hour, ForecastResult, HourlyTotal, Provisioner, RawReading, ReadingStore,
    ResultStore, Timestamp,
};
use parkcast_ingest::{AttemptError, DocumentSource, IngestError, IngestResult};
use serde_json::Value;

/// Warehouse stand-in keeping everything in memory
#[derive(Default)]
pub struct MemoryWarehouse {
    pub provisioned: AtomicU32,
    pub rows: Mutex<Vec<RawReading>>,
    pub results: Mutex<Vec<ForecastResult>>,
}

impl MemoryWarehouse {
    pub fn with_rows(rows: Vec<RawReading>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn provision_count(&self) -> u32 {
        self.provisioned.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<RawReading> {
        self.rows.lock().unwrap().clone()
    }

    pub fn results(&self) -> Vec<ForecastResult> {
        self.results.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provisioner for MemoryWarehouse {
    async fn ensure_schema(&self) -> Result<()> {
        self.provisioned.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReadingStore for MemoryWarehouse {
    async fn append_readings(&self, rows: &[RawReading]) -> Result<u64> {
        self.rows.lock().unwrap().extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    async fn hourly_totals(&self, since: Option<Timestamp>) -> Result<Vec<HourlyTotal>> {
        let mut totals: BTreeMap<Timestamp, i64> = BTreeMap::new();
        for row in self.rows.lock().unwrap().iter() {
            if since.map_or(false, |s| row.observed_at < s) {
                continue;
            }
            if let Some(free) = row.free_spaces {
                *totals.entry(truncate_to_hour(row.observed_at)).or_default() += free;
            }
        }
        Ok(totals
            .into_iter()
            .map(|(hour, total_free)| HourlyTotal { hour, total_free })
            .collect())
    }
}

#[async_trait::async_trait]
impl ResultStore for MemoryWarehouse {
    async fn append_result(&self, result: &ForecastResult) -> Result<()> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Serves a fixed document
pub struct StaticSource(pub Value);

#[async_trait::async_trait]
impl DocumentSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> IngestResult<Value> {
        Ok(self.0.clone())
    }
}

/// Fails like an endpoint that never answers with JSON
pub struct BrokenSource;

#[async_trait::async_trait]
impl DocumentSource for BrokenSource {
    fn name(&self) -> &str {
        "broken"
    }

    async fn fetch(&self) -> IngestResult<Value> {
        let decode = serde_json::from_str::<Value>("<html>").unwrap_err();
        Err(IngestError::Fetch {
            url: "http://upstream.invalid".into(),
            attempts: 3,
            last: AttemptError::Decode(decode),
        })
    }
}

pub fn at(day: u32, hour: u32, minute: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

pub fn reading(observed_at: Timestamp, id: &str, free: i64) -> RawReading {
    RawReading {
        free_spaces: Some(free),
        facility_id: Some(id.to_string()),
        ..RawReading::empty(observed_at)
    }
}
