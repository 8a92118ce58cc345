//! Static hazard and destination datasets.
//!
//! Hazard layers are GeoJSON FeatureCollections of (Multi)Polygons, as
//! published by municipal risk offices. Destinations are a plain JSON array.
//! Both are loaded once and shared read-only for the process lifetime.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use geojson::{Feature, GeoJson};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DatasetError;
use crate::model::{Coordinate, Destination, HazardKind, HazardPolygon, Severity, TravelProfile};

/// One hazard layer file. `kind` applies to features that do not name one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardLayerSource {
    pub path: PathBuf,
    #[serde(default)]
    pub kind: Option<HazardKind>,
}

/// Every hazard polygon known to the process.
#[derive(Debug, Clone, Default)]
pub struct HazardDataset {
    polygons: Vec<Arc<HazardPolygon>>,
}

impl HazardDataset {
    pub fn new(polygons: Vec<HazardPolygon>) -> Self {
        Self {
            polygons: polygons.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn polygons(&self) -> &[Arc<HazardPolygon>] {
        &self.polygons
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Loads and concatenates several layers, in order.
    pub fn load_layers(sources: &[HazardLayerSource]) -> Result<Self, DatasetError> {
        let mut dataset = Self::default();
        for source in sources {
            let layer = Self::from_file(&source.path, source.kind)?;
            tracing::info!(path = %source.path.display(), polygons = layer.len(), "loaded hazard layer");
            dataset.polygons.extend(layer.polygons);
        }
        Ok(dataset)
    }

    pub fn from_file(path: impl AsRef<Path>, layer_kind: Option<HazardKind>) -> Result<Self, DatasetError> {
        Self::from_geojson_str(&read(path.as_ref())?, layer_kind)
    }

    pub fn from_geojson_str(json: &str, layer_kind: Option<HazardKind>) -> Result<Self, DatasetError> {
        let features = match json.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
        };
        let mut polygons = Vec::new();

        for (index, feature) in features.into_iter().enumerate() {
            let Some(geometry) = feature.geometry else {
                continue;
            };
            let rings = outer_rings(geometry.value, index)?;
            if rings.is_empty() {
                continue;
            }

            let properties = feature.properties.unwrap_or_default();
            let kind = match text_property(&properties, &["kind", "reason"]) {
                Some(value) => parse_kind(value).ok_or_else(|| invalid(index, format!("unknown hazard kind {:?}", value)))?,
                None => layer_kind.ok_or_else(|| invalid(index, "no hazard kind".to_string()))?,
            };
            let severity = match text_property(&properties, &["severity", "Categoria"]) {
                Some(value) => parse_severity(value).ok_or_else(|| invalid(index, format!("unknown severity {:?}", value)))?,
                None => Severity::High,
            };
            let profile = match text_property(&properties, &["profile"]) {
                Some(value) => Some(
                    serde_json::from_value::<TravelProfile>(Value::String(value.to_string()))
                        .map_err(|_| invalid(index, format!("unknown travel profile {:?}", value)))?,
                ),
                None => None,
            };

            polygons.extend(rings.into_iter().map(|ring| {
                Arc::new(HazardPolygon {
                    ring,
                    kind,
                    severity,
                    profile,
                })
            }));
        }

        Ok(Self { polygons })
    }
}

/// The read-only destination catalog.
#[derive(Debug, Clone, Default)]
pub struct DestinationCatalog {
    destinations: Vec<Destination>,
}

impl DestinationCatalog {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        Self::from_json_str(&read(path.as_ref())?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        Ok(Self {
            destinations: serde_json::from_str(json)?,
        })
    }

    pub fn all(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn of_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Destination> {
        self.destinations
            .iter()
            .filter(move |destination| destination.category == category)
    }

    pub fn by_id(&self, id: u32) -> Option<&Destination> {
        self.destinations.iter().find(|destination| destination.id == id)
    }
}

fn read(path: &Path) -> Result<String, DatasetError> {
    fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn invalid(index: usize, reason: String) -> DatasetError {
    DatasetError::InvalidFeature { index, reason }
}

/// Outer rings of a Polygon or MultiPolygon; other geometry types yield none.
fn outer_rings(value: geojson::Value, index: usize) -> Result<Vec<Vec<Coordinate>>, DatasetError> {
    let polygons = match value {
        geojson::Value::Polygon(rings) => vec![rings],
        geojson::Value::MultiPolygon(polygons) => polygons,
        _ => {
            tracing::debug!(index, "skipping non-polygon hazard feature");
            return Ok(Vec::new());
        }
    };

    polygons
        .into_iter()
        .filter_map(|rings| rings.into_iter().next())
        .map(|ring| {
            ring.into_iter()
                .map(|position| match position.as_slice() {
                    [lng, lat, ..] => Ok(Coordinate::new(*lat, *lng)),
                    _ => Err(invalid(index, "position with fewer than two values".to_string())),
                })
                .collect()
        })
        .collect()
}

fn text_property<'a>(properties: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| properties.get(*key).and_then(Value::as_str))
}

fn parse_kind(value: &str) -> Option<HazardKind> {
    match value.to_lowercase().as_str() {
        "flood" | "inundacion" => Some(HazardKind::Flood),
        "landslide" | "derrumbe" => Some(HazardKind::Landslide),
        _ => None,
    }
}

fn parse_severity(value: &str) -> Option<Severity> {
    match value.to_lowercase().as_str() {
        "medium" | "media" => Some(Severity::Medium),
        "high" | "alta" => Some(Severity::High),
        _ => None,
    }
}
