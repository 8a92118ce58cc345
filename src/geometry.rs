//! Planar geometry over latitude/longitude degrees.
//!
//! Hazard polygons are small relative to the Earth's curvature, so
//! degrees are treated as a flat plane. Polygons are simple rings;
//! holes are not supported.

use std::sync::Arc;

use rayon::prelude::*;

use crate::model::{Coordinate, HazardPolygon};

/// Anything that exposes a polygon ring.
///
/// Rings may be closed (first vertex repeated at the end) or open; the
/// closing edge is implied for open rings.
pub trait Ring {
    fn ring(&self) -> &[Coordinate];
}

impl Ring for [Coordinate] {
    fn ring(&self) -> &[Coordinate] {
        self
    }
}

impl Ring for Vec<Coordinate> {
    fn ring(&self) -> &[Coordinate] {
        self
    }
}

impl Ring for HazardPolygon {
    fn ring(&self) -> &[Coordinate] {
        &self.ring
    }
}

impl<T: Ring + ?Sized> Ring for &T {
    fn ring(&self) -> &[Coordinate] {
        (**self).ring()
    }
}

impl<T: Ring + ?Sized> Ring for Arc<T> {
    fn ring(&self) -> &[Coordinate] {
        (**self).ring()
    }
}

/// Orientation test: true when `a`, `b`, `c` turn counter-clockwise.
fn ccw(a: Coordinate, b: Coordinate, c: Coordinate) -> bool {
    (c.latitude - a.latitude) * (b.longitude - a.longitude)
        > (b.latitude - a.latitude) * (c.longitude - a.longitude)
}

/// Proper-crossing test between segments `p1-p2` and `q1-q2`.
///
/// Collinear overlap and shared endpoints are not special-cased and
/// generally report no crossing.
pub fn segments_intersect(p1: Coordinate, p2: Coordinate, q1: Coordinate, q2: Coordinate) -> bool {
    ccw(p1, q1, q2) != ccw(p2, q1, q2) && ccw(p1, p2, q1) != ccw(p1, p2, q2)
}

/// Ray-casting parity test over a single ring.
pub fn point_in_polygon(point: Coordinate, ring: &[Coordinate]) -> bool {
    let mut inside = false;
    if ring.len() < 3 {
        return inside;
    }

    let x = point.longitude;
    let y = point.latitude;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].longitude, ring[i].latitude);
        let (xj, yj) = (ring[j].longitude, ring[j].latitude);
        let crosses = (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// True iff `point` lies inside at least one of `polygons`.
pub fn point_in_any_polygon<R: Ring>(point: Coordinate, polygons: &[R]) -> bool {
    polygons
        .iter()
        .any(|polygon| point_in_polygon(point, polygon.ring()))
}

/// Edges of a ring, including the closing edge when the ring is open.
pub fn ring_edges(ring: &[Coordinate]) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
    let closing = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 2 && first != last => Some((*last, *first)),
        _ => None,
    };
    ring.windows(2).map(|edge| (edge[0], edge[1])).chain(closing)
}

/// True iff any consecutive pair of `path` crosses any edge of any polygon.
///
/// Cost is O(|path| x total ring vertices); polygons are checked in
/// parallel since a hazard layer can hold a few thousand of them.
pub fn path_intersects_any<R: Ring + Sync>(path: &[Coordinate], polygons: &[R]) -> bool {
    if path.len() < 2 {
        return false;
    }
    polygons.par_iter().any(|polygon| {
        let ring = polygon.ring();
        path.windows(2).any(|segment| {
            ring_edges(ring).any(|(q1, q2)| segments_intersect(segment[0], segment[1], q1, q2))
        })
    })
}
