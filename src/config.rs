use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_COUNTRIES, DEFAULT_CUISINES, DEFAULT_HIGH_RATING, DEFAULT_LOW_RATING,
    DEFAULT_PROCESSED_PATH, DEFAULT_RAW_PATH, DEFAULT_TOP_N, TOP_N_RANGE,
};
use crate::error::{InsightsError, Result};

/// Environment variable naming the TOML config file.
pub const CONFIG_ENV: &str = "INSIGHTS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub filters: FilterConfig,
    pub thresholds: ThresholdConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub raw_path: PathBuf,
    pub processed_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from(DEFAULT_RAW_PATH),
            processed_path: PathBuf::from(DEFAULT_PROCESSED_PATH),
        }
    }
}

/// Default dashboard selection.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub countries: Vec<String>,
    pub cuisines: Vec<String>,
    pub top_n: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            countries: DEFAULT_COUNTRIES.iter().map(|s| s.to_string()).collect(),
            cuisines: DEFAULT_CUISINES.iter().map(|s| s.to_string()).collect(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Rating bounds for the cities page's "most restaurants above/below" charts.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    pub high_rating: f64,
    pub low_rating: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_rating: DEFAULT_HIGH_RATING,
            low_rating: DEFAULT_LOW_RATING,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            InsightsError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml(&config_content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// `$INSIGHTS_CONFIG` if set, else `config.toml` if present, else built-in defaults.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load(default_path);
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if !TOP_N_RANGE.contains(&self.filters.top_n) {
            return Err(InsightsError::Config(format!(
                "filters.top_n must be between {} and {}, got {}",
                TOP_N_RANGE.start(),
                TOP_N_RANGE.end(),
                self.filters.top_n
            )));
        }
        for (name, value) in [
            ("thresholds.high_rating", self.thresholds.high_rating),
            ("thresholds.low_rating", self.thresholds.low_rating),
        ] {
            if !(0.0..=5.0).contains(&value) {
                return Err(InsightsError::Config(format!(
                    "{} must be between 0.0 and 5.0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
