//! Nearest evacuation destination selection.

use crate::model::{Coordinate, Destination};

/// Picks the candidate closest to `reference`.
///
/// Ranks by squared planar difference in degrees, which is only meaningful
/// over a few kilometers. Ties go to the first candidate. Candidates whose
/// distance is not finite are never picked. Callers filter the candidates to
/// the relevant category beforehand.
pub fn nearest<'a, I>(reference: Coordinate, candidates: I) -> Option<&'a Destination>
where
    I: IntoIterator<Item = &'a Destination>,
{
    let mut best: Option<(&Destination, f64)> = None;

    for candidate in candidates {
        let distance = planar_distance_sq(reference, candidate.location);
        if !distance.is_finite() {
            tracing::debug!(destination = candidate.id, "skipping destination with invalid location");
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best.map(|(destination, _)| destination)
}

fn planar_distance_sq(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = b.latitude - a.latitude;
    let d_lng = b.longitude - a.longitude;
    d_lat * d_lat + d_lng * d_lng
}
