//! Engine configuration.
//!
//! Loaded from YAML, with `EVAC_SECTION__KEY` environment overrides when
//! read through [`EngineConfig::load`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::HazardLayerSource;
use crate::error::ConfigError;
use crate::navigation::MonitorOptions;
use crate::ors::OrsConfig;
use crate::session::{DEFAULT_EVACUATION_CATEGORY, SessionOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub routing: OrsConfig,
    pub navigation: MonitorOptions,
    pub datasets: DatasetPaths,
    /// Destination category used for nearest-point evacuation.
    pub evacuation_category: String,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            routing: OrsConfig::default(),
            navigation: MonitorOptions::default(),
            datasets: DatasetPaths::default(),
            evacuation_category: DEFAULT_EVACUATION_CATEGORY.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetPaths {
    pub hazards: Vec<HazardLayerSource>,
    pub destinations: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `evac_router=debug`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads `path` and applies `EVAC_`-prefixed environment overrides,
    /// e.g. `EVAC_ROUTING__API_KEY`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(true))
            .add_source(
                config::Environment::with_prefix("EVAC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let nav = &self.navigation;
        if !is_positive(nav.trim_radius_m) {
            return Err(invalid("navigation.trim_radius_m", "must be positive"));
        }
        if !is_positive(nav.deviation_threshold_m) {
            return Err(invalid("navigation.deviation_threshold_m", "must be positive"));
        }
        if nav.trim_radius_m >= nav.deviation_threshold_m {
            return Err(invalid(
                "navigation.trim_radius_m",
                "must be smaller than navigation.deviation_threshold_m",
            ));
        }
        if nav.arrival_min_points == 0 {
            return Err(invalid("navigation.arrival_min_points", "must be at least 1"));
        }
        if self.routing.timeout_secs == 0 {
            return Err(invalid("routing.timeout_secs", "must be non-zero"));
        }
        if self.routing.base_url.trim().is_empty() {
            return Err(invalid("routing.base_url", "must not be empty"));
        }
        if self.evacuation_category.trim().is_empty() {
            return Err(invalid("evacuation_category", "must not be empty"));
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            monitor: self.navigation.clone(),
            evacuation_category: self.evacuation_category.clone(),
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
