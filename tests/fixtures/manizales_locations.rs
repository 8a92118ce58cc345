//! Manizales locations and hazard zones for realistic fixtures.
//!
//! Points sit within a couple of kilometers of the city center, where the
//! planar nearest-point ranking is accurate.

use std::sync::Arc;

use evac_router::dataset::{DestinationCatalog, HazardDataset};
use evac_router::model::{HazardKind, HazardPolygon, Severity};
use evac_router::session::{RouteSession, SessionOptions};
use evac_router::{Coordinate, Destination, TravelProfile};

/// Traveler's home, a few blocks south-west of Parque Caldas.
pub const HOME: Coordinate = Coordinate::new(5.06800, -75.51500);

pub const PARQUE_CALDAS: Coordinate = Coordinate::new(5.07000, -75.51300);
pub const ESTADIO_PALOGRANDE: Coordinate = Coordinate::new(5.05600, -75.48800);
pub const HOSPITAL_SANTA_SOFIA: Coordinate = Coordinate::new(5.06900, -75.51400);

pub fn destinations() -> Vec<Destination> {
    vec![
        destination(1, "Parque Caldas", "meeting_point", PARQUE_CALDAS),
        destination(2, "Estadio Palogrande", "meeting_point", ESTADIO_PALOGRANDE),
        destination(3, "Hospital Santa Sofia", "hospital", HOSPITAL_SANTA_SOFIA),
    ]
}

pub fn destination(id: u32, name: &str, category: &str, location: Coordinate) -> Destination {
    Destination {
        id,
        name: name.to_string(),
        category: category.to_string(),
        location,
    }
}

/// Walking route from [`HOME`] to Parque Caldas, ~78 m between points.
pub fn home_to_parque() -> Vec<Coordinate> {
    vec![
        Coordinate::new(5.06800, -75.51500),
        Coordinate::new(5.06850, -75.51450),
        Coordinate::new(5.06900, -75.51400),
        Coordinate::new(5.06950, -75.51350),
        Coordinate::new(5.07000, -75.51300),
    ]
}

/// ~80 m north-west of [`home_to_parque`]'s second point.
pub const DETOUR: Coordinate = Coordinate::new(5.06900, -75.51500);

/// Route from [`DETOUR`] back to Parque Caldas.
pub fn detour_to_parque() -> Vec<Coordinate> {
    vec![
        DETOUR,
        Coordinate::new(5.06950, -75.51450),
        Coordinate::new(5.07000, -75.51400),
        Coordinate::new(5.07000, -75.51350),
        Coordinate::new(5.07000, -75.51300),
    ]
}

pub fn rectangle(south: f64, west: f64, north: f64, east: f64) -> Vec<Coordinate> {
    vec![
        Coordinate::new(south, west),
        Coordinate::new(south, east),
        Coordinate::new(north, east),
        Coordinate::new(north, west),
        Coordinate::new(south, west),
    ]
}

pub fn zone(ring: Vec<Coordinate>, kind: HazardKind, profile: Option<TravelProfile>) -> HazardPolygon {
    HazardPolygon {
        ring,
        kind,
        severity: Severity::High,
        profile,
    }
}

/// Flood zone around [`HOME`].
pub fn home_flood_zone() -> HazardPolygon {
    zone(rectangle(5.06700, -75.51600, 5.06840, -75.51400), HazardKind::Flood, None)
}

/// Flood zone south of [`HOME`], clear of every fixture route.
pub fn southern_flood_zone() -> HazardPolygon {
    zone(rectangle(5.06000, -75.52000, 5.06500, -75.51500), HazardKind::Flood, None)
}

/// Landslide zone straddling [`home_to_parque`]'s middle point.
pub fn ridge_landslide_zone(profile: Option<TravelProfile>) -> HazardPolygon {
    zone(rectangle(5.06880, -75.51450, 5.06920, -75.51350), HazardKind::Landslide, profile)
}

pub fn session_with(hazards: Vec<HazardPolygon>) -> RouteSession {
    RouteSession::new(
        Arc::new(HazardDataset::new(hazards)),
        Arc::new(DestinationCatalog::new(destinations())),
        SessionOptions::default(),
    )
}
