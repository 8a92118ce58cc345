//! Error types for the evacuation route engine.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by a route request.
///
/// Every variant is recovered at the session boundary and recorded in
/// [`crate::session::NavigationState`]; none of them leaves a partially
/// installed route behind.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum RouteError {
    /// The selector found no candidate, or no explicit destination is set.
    #[error("no feasible evacuation destination")]
    NoFeasibleDestination,

    /// Network/provider error, or malformed or missing geometry.
    #[error("routing provider failure: {0}")]
    ProviderFailure(String),

    /// The provider returned a path crossing an active hazard zone.
    #[error("route crosses an active hazard zone")]
    HazardValidationFailure,

    /// No location sample has been received yet.
    #[error("no location fix available")]
    LocationUnavailable,
}

/// Transport-level failure of a routing provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("routing provider rejected request: {0}")]
    Rejected(String),
}

impl From<ProviderError> for RouteError {
    fn from(err: ProviderError) -> Self {
        RouteError::ProviderFailure(err.to_string())
    }
}

/// Malformed encoded polyline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("invalid polyline character {byte:#04x} at offset {offset}")]
    InvalidCharacter { byte: u8, offset: usize },

    #[error("polyline truncated at offset {offset}")]
    Truncated { offset: usize },

    #[error("polyline value overflow at offset {offset}")]
    Overflow { offset: usize },
}

impl From<PolylineError> for RouteError {
    fn from(err: PolylineError) -> Self {
        RouteError::ProviderFailure(format!("undecodable geometry: {}", err))
    }
}

/// Errors while loading the static hazard and destination datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("feature {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

/// Configuration load and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration format: {0}")]
    Format(#[from] serde_yaml::Error),

    #[error("invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// The session driver task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session driver has stopped")]
pub struct DriverClosed;
