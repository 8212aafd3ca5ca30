use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::aggregate::DEFAULT_TIMEOUT;
use crate::error::{Result, ShopError};
use crate::filter::ResultFilter;
use crate::product::{Source, WeightVector};

/// Global shopcmp configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Ranking weights used when the command line does not override them
    #[serde(default)]
    pub weights: WeightVector,

    /// Network behaviour of the store adapters
    #[serde(default)]
    pub fetch: FetchSettings,

    /// Stores to search, in the order their results are joined
    #[serde(default = "default_sources")]
    pub sources: Vec<Source>,

    /// Default result filters
    #[serde(default)]
    pub filters: ResultFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Per-store timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum listings taken from each store
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Extra attempts for stores that retry (Flipkart)
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Initial backoff between retries in milliseconds, doubled each attempt
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_max_results() -> usize {
    10
}

fn default_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_sources() -> Vec<Source> {
    Source::ALL.to_vec()
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_results: default_max_results(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weights: WeightVector::default(),
            fetch: FetchSettings::default(),
            sources: default_sources(),
            filters: ResultFilter::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        if self.fetch.timeout_secs == 0 {
            return Err(ShopError::ConfigError(
                "fetch.timeout_secs must be greater than zero".into(),
            ));
        }

        self.filters.validate()?;

        let mut seen = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            if seen.contains(source) {
                return Err(ShopError::ConfigError(format!(
                    "source '{}' is listed more than once",
                    source.as_str()
                )));
            }
            seen.push(*source);
        }

        Ok(())
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ShopError::ConfigError(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "shopcmp")
            .ok_or_else(|| ShopError::ConfigError("Could not determine config directory".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "shopcmp")
            .ok_or_else(|| ShopError::ConfigError("Could not determine data directory".into()))?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the search history database path
    ///
    /// Supports SHOPCMP_DB environment variable for test isolation
    pub fn db_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SHOPCMP_DB") {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::data_dir()?.join("history.db"))
    }
}
