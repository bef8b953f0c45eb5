//! Application configuration and logging setup
//!
//! Loaded from YAML; every field has a default so a partial (or absent) file works:
//!
//! ```yaml
//! ingest:
//!   batch_size: 100
//!   workers: 10
//!   topic_count: 5
//!   deleted_author: "[deleted]"
//!   reset: false
//! storage:
//!   data_path: ./data
//! community:
//!   resolution: 1.0
//!   seed: 42
//!   max_passes: 100
//! logging:
//!   filter: info
//! ```

use serde::{Deserialize, Serialize};
use socialgraph_graph_algorithms::LouvainConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "SOCIALGRAPH_CONFIG";
/// Environment variable naming the RocksDB data directory
pub const DATA_ENV: &str = "SOCIALGRAPH_DATA";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ingest: IngestConfig,
    pub storage: StorageConfig,
    pub community: CommunityConfig,
    pub logging: LoggingConfig,
}

/// Ingestion pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Records per batch
    pub batch_size: usize,
    /// Concurrent records within a batch
    pub workers: usize,
    /// Topics extracted per post
    pub topic_count: usize,
    /// Author name marking a deleted account; never becomes a node
    pub deleted_author: String,
    /// Clear the graph before ingesting
    pub reset: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            workers: 10,
            topic_count: crate::extract::DEFAULT_TOPIC_COUNT,
            deleted_author: "[deleted]".to_string(),
            reset: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// RocksDB directory; `None` keeps the graph in memory
    pub data_path: Option<PathBuf>,
}

/// Louvain settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    pub resolution: f64,
    pub seed: Option<u64>,
    pub max_passes: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        let defaults = LouvainConfig::default();
        Self {
            resolution: defaults.resolution,
            seed: defaults.seed,
            max_passes: defaults.max_passes,
        }
    }
}

impl CommunityConfig {
    pub fn louvain(&self) -> LouvainConfig {
        LouvainConfig {
            resolution: self.resolution,
            seed: self.seed,
            max_passes: self.max_passes,
            ..LouvainConfig::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate YAML text
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // An empty document is the default config
        let config: AppConfig = if raw.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.batch_size == 0 {
            return Err(ConfigError::Invalid("ingest.batch_size must be at least 1".into()));
        }
        if self.ingest.workers == 0 {
            return Err(ConfigError::Invalid("ingest.workers must be at least 1".into()));
        }
        if self.ingest.topic_count == 0 {
            return Err(ConfigError::Invalid("ingest.topic_count must be at least 1".into()));
        }
        if !(self.community.resolution > 0.0) {
            return Err(ConfigError::Invalid("community.resolution must be positive".into()));
        }
        Ok(())
    }
}

/// Install the global fmt subscriber on stderr. `RUST_LOG` wins over `default_filter`.
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.ingest.batch_size, 100);
        assert_eq!(config.ingest.workers, 10);
        assert_eq!(config.ingest.topic_count, 5);
        assert_eq!(config.ingest.deleted_author, "[deleted]");
        assert_eq!(config.community.resolution, 1.0);
        assert_eq!(config.logging.filter, "info");
        assert!(config.storage.data_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = AppConfig::from_yaml("ingest:\n  workers: 4\ncommunity:\n  seed: 7\n").unwrap();
        assert_eq!(config.ingest.workers, 4);
        assert_eq!(config.ingest.batch_size, 100);
        assert_eq!(config.community.louvain().seed, Some(7));
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            AppConfig::from_yaml("ingest:\n  batch_size: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("community:\n  resolution: -1.0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("community:\n  resolution: 0\n"),
            Err(ConfigError::Invalid(_))
        ));

        let mut config = AppConfig::default();
        config.community.resolution = 0.0;
        assert!(config.validate().is_err());
        assert!(matches!(
            AppConfig::from_yaml("ingest: [1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/socialgraph.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
