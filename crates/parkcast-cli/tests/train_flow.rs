mod common;

use std::f64::consts::PI;
use std::sync::Arc;

use chrono::Duration;
use common::{at, reading, MemoryWarehouse};
use parkcast_cli::{TrainJob, TrainSettings};
use parkcast_core::RawReading;
use parkcast_forecast::BASELINE_DESC;
use parkcast_sinks::MetricsLog;

fn job(warehouse: &Arc<MemoryWarehouse>, monitoring: &std::path::Path, settings: TrainSettings) -> TrainJob {
    TrainJob::new(
        warehouse.clone(),
        warehouse.clone(),
        warehouse.clone(),
        MetricsLog::new(monitoring).unwrap(),
        settings,
    )
}

/// Two facilities reporting every hour for `hours` hours from March 1st
fn hourly_history(hours: i64) -> Vec<RawReading> {
    let start = at(1, 0, 0);
    (0..hours)
        .flat_map(|h| {
            let observed_at = start + Duration::hours(h) + Duration::minutes(5);
            let cycle = (2.0 * PI * h as f64 / 24.0).sin();
            let a = 300 + (100.0 * cycle).round() as i64;
            [reading(observed_at, "A", a), reading(observed_at, "B", 50)]
        })
        .collect()
}

#[tokio::test]
async fn sparse_history_uses_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = Arc::new(MemoryWarehouse::with_rows(hourly_history(10)));
    let job = job(&warehouse, dir.path(), TrainSettings::default());

    let run_at = at(1, 12, 0);
    let result = job.run(run_at).await.unwrap();
    assert_eq!(result.model_desc, BASELINE_DESC);
    assert_eq!(result.train_points, 10);
    assert_eq!(result.forecast_points.len(), 24);
    assert_eq!(result.forecast_points[0].at, at(1, 10, 0));
    assert!(result.forecast_points.iter().all(|p| p.value.is_some()));

    assert_eq!(warehouse.provision_count(), 1);
    assert_eq!(warehouse.results(), vec![result]);

    let metrics = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
    let lines: Vec<&str> = metrics.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "run_at,train_points,mae,model_desc");
    assert!(lines[1].starts_with("2024-03-01T12:00:00Z,10,"));
    assert!(lines[1].ends_with(",hour_of_day_mean"));
}

#[tokio::test]
async fn long_history_uses_seasonal_model() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = Arc::new(MemoryWarehouse::with_rows(hourly_history(24 * 7)));
    let settings = TrainSettings {
        horizon: 12,
        ..TrainSettings::default()
    };
    let job = job(&warehouse, dir.path(), settings);

    let result = job.run(at(8, 0, 0)).await.unwrap();
    assert_eq!(result.model_desc, "SARIMAX(1,1,1)(1,1,1,24)");
    assert_eq!(result.train_points, 24 * 7);
    assert_eq!(result.forecast_points.len(), 12);
    assert!(result.mae.is_finite());
}

#[tokio::test]
async fn lookback_limits_history() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = Arc::new(MemoryWarehouse::with_rows(hourly_history(24 * 7)));
    let settings = TrainSettings {
        lookback: Some(Duration::hours(6)),
        ..TrainSettings::default()
    };
    let job = job(&warehouse, dir.path(), settings);

    let result = job.run(at(8, 0, 0)).await.unwrap();
    assert_eq!(result.model_desc, BASELINE_DESC);
    // Readings at 18:05 .. 23:05 on March 7th
    assert_eq!(result.train_points, 6);
}

#[tokio::test]
async fn lookback_keeps_partial_first_hour() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = Arc::new(MemoryWarehouse::with_rows(hourly_history(24 * 7)));
    let settings = TrainSettings {
        lookback: Some(Duration::hours(6)),
        ..TrainSettings::default()
    };
    let job = job(&warehouse, dir.path(), settings);

    // Cutoff 18:00:30 admits the 18:05 reading, so its hour stays
    let result = job.run(at(8, 0, 0) + Duration::seconds(30)).await.unwrap();
    assert_eq!(result.train_points, 6);
}

#[tokio::test]
async fn gaps_are_filled_but_not_counted() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![
        reading(at(1, 0, 10), "A", 150),
        reading(at(1, 3, 10), "A", 80),
    ];
    let warehouse = Arc::new(MemoryWarehouse::with_rows(rows));
    let job = job(&warehouse, dir.path(), TrainSettings::default());

    let result = job.run(at(1, 4, 0)).await.unwrap();
    assert_eq!(result.train_points, 2);
    assert_eq!(result.forecast_points[0].at, at(1, 4, 0));
}

#[tokio::test]
async fn empty_history_fails_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = Arc::new(MemoryWarehouse::default());
    let job = job(&warehouse, dir.path(), TrainSettings::default());

    let err = job.run(at(1, 12, 0)).await.unwrap_err();
    assert!(format!("{err:#}").contains("No readings to train on"));
    assert!(warehouse.results().is_empty());
    assert!(!dir.path().join("metrics.csv").exists());
}
