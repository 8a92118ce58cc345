//! Core data model shared by every engine component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a coordinate from a GeoJSON-ordered `[lng, lat]` pair.
    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self::new(pair[1], pair[0])
    }

    /// GeoJSON / provider ordering.
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// A candidate evacuation destination from the static catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: u32,
    pub name: String,
    pub category: String,
    #[serde(flatten)]
    pub location: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Flood,
    Landslide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
}

/// How the traveler moves. Hazard polygons may be restricted to one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelProfile {
    #[default]
    #[serde(alias = "foot-walking")]
    Walk,
    #[serde(alias = "cycling-regular")]
    Bicycle,
    #[serde(alias = "driving-car")]
    Drive,
}

impl TravelProfile {
    /// Profile identifier understood by OpenRouteService.
    pub fn provider_name(self) -> &'static str {
        match self {
            TravelProfile::Walk => "foot-walking",
            TravelProfile::Bicycle => "cycling-regular",
            TravelProfile::Drive => "driving-car",
        }
    }
}

/// The emergency currently declared. `None` disables every hazard zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyKind {
    #[default]
    None,
    Flood,
    Landslide,
}

impl EmergencyKind {
    pub fn hazard_kind(self) -> Option<HazardKind> {
        match self {
            EmergencyKind::None => None,
            EmergencyKind::Flood => Some(HazardKind::Flood),
            EmergencyKind::Landslide => Some(HazardKind::Landslide),
        }
    }
}

/// A closed ring flagged as unsafe for one hazard kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardPolygon {
    pub ring: Vec<Coordinate>,
    pub kind: HazardKind,
    pub severity: Severity,
    /// When set, the polygon only applies to this travel profile.
    pub profile: Option<TravelProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartMode {
    #[default]
    DeviceLocation,
    ManualPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationMode {
    #[default]
    Explicit,
    Nearest,
}

/// One reading from the device location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coordinate: Coordinate,
    /// Horizontal accuracy in meters, when the provider reports it.
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            accuracy_m: None,
            timestamp,
        }
    }

    pub fn now(coordinate: Coordinate) -> Self {
        Self::new(coordinate, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lng_lat_round_trip_order() {
        let coord = Coordinate::from_lng_lat([-75.51, 5.07]);
        assert_eq!(coord.latitude, 5.07);
        assert_eq!(coord.longitude, -75.51);
        assert_eq!(coord.to_lng_lat(), [-75.51, 5.07]);
    }

    #[test]
    fn test_emergency_none_has_no_hazard_kind() {
        assert_eq!(EmergencyKind::None.hazard_kind(), None);
        assert_eq!(EmergencyKind::Flood.hazard_kind(), Some(HazardKind::Flood));
        assert_eq!(EmergencyKind::Landslide.hazard_kind(), Some(HazardKind::Landslide));
    }

    #[test]
    fn test_profile_accepts_provider_names() {
        let profile: TravelProfile = serde_json::from_str("\"cycling-regular\"").unwrap();
        assert_eq!(profile, TravelProfile::Bicycle);
        let profile: TravelProfile = serde_json::from_str("\"drive\"").unwrap();
        assert_eq!(profile.provider_name(), "driving-car");
    }

    #[test]
    fn test_destination_flattens_location() {
        let json = r#"{"id":3,"name":"Parque","category":"meeting_point","latitude":5.06,"longitude":-75.5}"#;
        let destination: Destination = serde_json::from_str(json).unwrap();
        assert_eq!(destination.location, Coordinate::new(5.06, -75.5));
    }
}
