use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Open-data endpoint publishing the Donostia parking occupancy
pub const DEFAULT_SOURCE_URL: &str =
    "https://www.donostia.eus/info/ciudadano/camaras_trafico.nsf/getParkings.xsp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            max_retries: 3,
            timeout_secs: 20,
            backoff_secs: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub database_url: Option<String>,
    pub project: String,
    pub dataset: String,
    pub raw_table: String,
    pub metrics_table: String,
    pub predictions_table: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            project: "parkcast".to_string(),
            dataset: "mlops_reto4".to_string(),
            raw_table: "raw_parking".to_string(),
            metrics_table: "model_metrics".to_string(),
            predictions_table: "predictions".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket_dir: PathBuf,
    pub data_dir: PathBuf,
    pub monitoring_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket_dir: PathBuf::from("bucket"),
            data_dir: PathBuf::from("data"),
            monitoring_dir: PathBuf::from("monitoring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Hours to forecast
    pub horizon: usize,
    /// Days of history the trainer reads
    pub lookback_days: u32,
    /// Effective points needed before the seasonal model is tried
    pub min_seasonal_points: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 24,
            lookback_days: 7,
            min_seasonal_points: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub warehouse: WarehouseConfig,
    pub storage: StorageConfig,
    pub forecast: ForecastConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

impl AppConfig {
    /// Load from the TOML file at PARKCAST_CONFIG (default `parkcast.toml`,
    /// skipped when absent), then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("PARKCAST_CONFIG").unwrap_or_else(|_| "parkcast.toml".to_string());
        let text = if Path::new(&path).exists() {
            Some(fs::read_to_string(&path)?)
        } else {
            None
        };
        Self::from_sources(text.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build from optional TOML text and an environment lookup
    pub fn from_sources<F>(toml_text: Option<&str>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match toml_text {
            Some(text) => toml::from_str::<AppConfig>(text)?,
            None => AppConfig::default(),
        };
        cfg.apply_env(|key| env(key).filter(|v| !v.trim().is_empty()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = &mut self.source;
        set_string(&env, "PARKCAST_SOURCE_URL", &mut source.url);
        set_parsed(&env, "PARKCAST_FETCH_RETRIES", &mut source.max_retries)?;
        set_parsed(&env, "PARKCAST_FETCH_TIMEOUT_SECS", &mut source.timeout_secs)?;
        set_parsed(&env, "PARKCAST_FETCH_BACKOFF_SECS", &mut source.backoff_secs)?;

        let warehouse = &mut self.warehouse;
        if let Some(url) = env("DATABASE_URL") {
            warehouse.database_url = Some(url);
        }
        set_string(&env, "PARKCAST_PROJECT", &mut warehouse.project);
        set_string(&env, "PARKCAST_DATASET", &mut warehouse.dataset);
        set_string(&env, "PARKCAST_TABLE_RAW", &mut warehouse.raw_table);
        set_string(&env, "PARKCAST_TABLE_METRICS", &mut warehouse.metrics_table);
        set_string(&env, "PARKCAST_TABLE_PRED", &mut warehouse.predictions_table);

        let storage = &mut self.storage;
        set_parsed(&env, "PARKCAST_BUCKET_DIR", &mut storage.bucket_dir)?;
        set_parsed(&env, "PARKCAST_DATA_DIR", &mut storage.data_dir)?;
        set_parsed(&env, "PARKCAST_MONITORING_DIR", &mut storage.monitoring_dir)?;

        let forecast = &mut self.forecast;
        set_parsed(&env, "PARKCAST_HORIZON", &mut forecast.horizon)?;
        set_parsed(&env, "PARKCAST_LOOKBACK_DAYS", &mut forecast.lookback_days)?;
        set_parsed(
            &env,
            "PARKCAST_MIN_SEASONAL_POINTS",
            &mut forecast.min_seasonal_points,
        )?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = url::Url::parse(&self.source.url) {
            return Err(ConfigError::InvalidValue {
                key: "source.url",
                value: self.source.url.clone(),
                reason: e.to_string(),
            });
        }
        if self.forecast.horizon == 0 {
            return Err(ConfigError::InvalidValue {
                key: "forecast.horizon",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Connection string for the warehouse; required by collect and train
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.warehouse
            .database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}

fn set_string<F>(env: &F, key: &str, slot: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env(key) {
        *slot = value;
    }
}

fn set_parsed<F, T>(env: &F, key: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    if let Some(value) = env(key) {
        let parsed: Result<T, T::Err> = value.trim().parse();
        match parsed {
            Ok(v) => *slot = v,
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: e.to_string(),
                    value,
                })
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let cfg = AppConfig::from_sources(None, env(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.source.url, DEFAULT_SOURCE_URL);
        assert_eq!(cfg.source.max_retries, 3);
        assert_eq!(cfg.forecast.horizon, 24);
        assert_eq!(cfg.forecast.min_seasonal_points, 24);
        assert_eq!(cfg.storage.monitoring_dir, PathBuf::from("monitoring"));
        assert!(matches!(cfg.database_url(), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn toml_sections_are_partial() {
        let text = r#"
            [forecast]
            horizon = 12

            [warehouse]
            dataset = "staging"
        "#;
        let cfg = AppConfig::from_sources(Some(text), env(&[])).unwrap();
        assert_eq!(cfg.forecast.horizon, 12);
        assert_eq!(cfg.forecast.lookback_days, 7);
        assert_eq!(cfg.warehouse.dataset, "staging");
        assert_eq!(cfg.warehouse.project, "parkcast");
    }

    #[test]
    fn env_overrides_file() {
        let text = "[forecast]\nhorizon = 12\n";
        let cfg = AppConfig::from_sources(
            Some(text),
            env(&[
                ("PARKCAST_HORIZON", "6"),
                ("DATABASE_URL", "postgres://localhost/parkcast"),
                ("PARKCAST_DATA_DIR", "/var/lib/parkcast/data"),
                ("PARKCAST_TABLE_PRED", "preds"),
                ("PARKCAST_PROJECT", ""),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.forecast.horizon, 6);
        assert_eq!(cfg.database_url().unwrap(), "postgres://localhost/parkcast");
        assert_eq!(cfg.storage.data_dir, PathBuf::from("/var/lib/parkcast/data"));
        assert_eq!(cfg.warehouse.predictions_table, "preds");
        assert_eq!(cfg.warehouse.project, "parkcast");
    }

    #[test]
    fn invalid_number_is_rejected() {
        let err = AppConfig::from_sources(None, env(&[("PARKCAST_FETCH_RETRIES", "three")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "PARKCAST_FETCH_RETRIES");
                assert_eq!(value, "three");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_url_and_horizon_are_rejected() {
        assert!(matches!(
            AppConfig::from_sources(None, env(&[("PARKCAST_SOURCE_URL", "not a url")])),
            Err(ConfigError::InvalidValue { key: "source.url", .. })
        ));
        assert!(matches!(
            AppConfig::from_sources(None, env(&[("PARKCAST_HORIZON", "0")])),
            Err(ConfigError::InvalidValue { key: "forecast.horizon", .. })
        ));
    }

    #[test]
    fn bad_toml_is_reported() {
        assert!(matches!(
            AppConfig::from_sources(Some("[forecast\n"), env(&[])),
            Err(ConfigError::Toml(_))
        ));
    }
}
