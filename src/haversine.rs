//! Great-circle distances for live position tracking.
//!
//! Good to well under a meter at city scale, which is all the navigation
//! thresholds need.

use crate::model::Coordinate;

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points in meters.
pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Smallest distance in meters from `point` to any vertex of `path`.
///
/// Returns `None` for an empty path.
pub fn min_distance_m(point: Coordinate, path: &[Coordinate]) -> Option<f64> {
    path.iter()
        .map(|vertex| haversine_m(point, *vertex))
        .min_by(f64::total_cmp)
}
