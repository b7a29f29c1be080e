use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use session_energy::EngineConfig;

use crate::pipeline::Debounce;

pub const CONFIG_ENV: &str = "RECONCILIATION_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "reconciliation-config.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSourceConfig {
    pub http_bind_addr: String,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default)]
    pub auth_bearer_token: Option<String>,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_channel_capacity() -> usize {
    16
}

fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// The store pushes full subtrees to an HTTP endpoint.
    Http(HttpSourceConfig),
    /// Replay of recorded snapshots, one JSON document per line.
    File { path: PathBuf },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomsConfig {
    /// CSV (`name,building,floor`) or JSON array of room metadata.
    #[serde(default)]
    pub metadata_path: Option<PathBuf>,
    /// Rooms to reconcile on every snapshot; empty means every room seen.
    #[serde(default)]
    pub watch: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind_addr: String,
    #[serde(default = "default_window_hours")]
    pub default_window_hours: f64,
}

fn default_window_hours() -> f64 {
    12.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub rooms: RoomsConfig,
    /// Quiet period before a burst of snapshots is reconciled; 0 disables it.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Longest a snapshot is held back while newer ones keep arriving.
    #[serde(default = "default_debounce_max_wait_ms")]
    pub debounce_max_wait_ms: u64,
    pub api: Option<ApiConfig>,
    pub metrics: Option<MetricsConfig>,
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_debounce_max_wait_ms() -> u64 {
    2_000
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_path(config_path())
    }

    pub fn from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(contents)?;
        validate_engine(&cfg.engine)?;
        Ok(cfg)
    }

    pub fn debounce(&self) -> Option<Debounce> {
        (self.debounce_ms > 0).then(|| Debounce {
            quiet: Duration::from_millis(self.debounce_ms),
            max_wait: Duration::from_millis(self.debounce_max_wait_ms.max(self.debounce_ms)),
        })
    }
}

fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Engine settings for the one-shot tools: the `[engine]` table of the config
/// file when one exists, defaults otherwise.
pub fn engine_config() -> Result<EngineConfig, ConfigError> {
    #[derive(Deserialize)]
    struct EngineOnly {
        #[serde(default)]
        engine: EngineConfig,
    }

    let path = config_path();
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed: EngineOnly = toml::from_str(&contents)?;
    validate_engine(&parsed.engine)?;
    Ok(parsed.engine)
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if !engine.tariff_per_kwh.is_finite() || engine.tariff_per_kwh < 0.0 {
        return Err(ConfigError::Invalid(format!(
            "engine.tariff_per_kwh must be a non-negative number, got {}",
            engine.tariff_per_kwh
        )));
    }
    if !engine.scale_factor.is_finite() || engine.scale_factor < 0.0 {
        return Err(ConfigError::Invalid(format!(
            "engine.scale_factor must be a non-negative number, got {}",
            engine.scale_factor
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_energy::engine::DurationStrategy;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [source]
            kind = "file"
            path = "snapshots.ndjson"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.engine, EngineConfig::default());
        assert_eq!(cfg.engine.tariff_per_kwh, 14.0);
        assert_eq!(cfg.engine.scale_factor, 20.0);
        assert_eq!(
            cfg.debounce(),
            Some(Debounce {
                quiet: Duration::from_millis(250),
                max_wait: Duration::from_millis(2_000),
            })
        );
        assert!(cfg.rooms.watch.is_empty());
        assert!(matches!(cfg.source, SourceConfig::File { .. }));
    }

    #[test]
    fn full_config() {
        let cfg = AppConfig::from_toml_str(
            r#"
            debounce_ms = 0

            [engine]
            tariff_per_kwh = 11.5
            scale_factor = 25
            duration_strategy = "log_pair"
            fallback_duration_minutes = 90

            [source]
            kind = "http"
            http_bind_addr = "0.0.0.0:8080"
            auth_bearer_token = "secret"

            [rooms]
            metadata_path = "rooms.csv"
            watch = ["705", "706"]

            [api]
            bind_addr = "0.0.0.0:8081"

            [metrics]
            bind_addr = "0.0.0.0:9000"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.engine.duration_strategy, DurationStrategy::LogPair);
        assert_eq!(cfg.engine.fallback_duration_minutes, 90);
        assert_eq!(cfg.debounce(), None);
        assert_eq!(cfg.rooms.watch, vec!["705", "706"]);
        match cfg.source {
            SourceConfig::Http(http) => {
                assert_eq!(http.channel_capacity, 16);
                assert_eq!(http.auth_bearer_token.as_deref(), Some("secret"));
            }
            other => panic!("unexpected source {other:?}"),
        }
        assert_eq!(cfg.api.map(|a| a.default_window_hours), Some(12.0));
    }

    #[test]
    fn debounce_max_wait_is_never_shorter_than_quiet() {
        let cfg = AppConfig::from_toml_str(
            r#"
            debounce_ms = 500
            debounce_max_wait_ms = 100

            [source]
            kind = "file"
            path = "x"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.debounce().map(|d| d.max_wait), Some(Duration::from_millis(500)));
    }

    #[test]
    fn negative_tariff_is_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [engine]
            tariff_per_kwh = -1.0

            [source]
            kind = "file"
            path = "x"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
