//! Active hazard zone selection.

use std::sync::Arc;

use serde::Serialize;

use crate::geometry::point_in_any_polygon;
use crate::model::{Coordinate, EmergencyKind, HazardPolygon, Severity, TravelProfile};

/// The hazard polygons relevant to the current emergency and travel profile.
///
/// Holds shared references into the loaded dataset; the dataset itself is
/// never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActiveHazardSet {
    polygons: Vec<Arc<HazardPolygon>>,
}

impl ActiveHazardSet {
    pub fn empty() -> Self {
        Self::default()
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

    pub fn iter(&self) -> impl Iterator<Item = &HazardPolygon> {
        self.polygons.iter().map(|polygon| polygon.as_ref())
    }

    /// Polygons of one severity, for layered rendering.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &HazardPolygon> {
        self.iter().filter(move |polygon| polygon.severity == severity)
    }

    /// True iff `point` lies inside any active polygon.
    pub fn contains(&self, point: Coordinate) -> bool {
        point_in_any_polygon(point, &self.polygons)
    }

    /// Rings of every active polygon, in dataset order.
    pub fn rings(&self) -> Vec<Vec<Coordinate>> {
        self.polygons.iter().map(|polygon| polygon.ring.clone()).collect()
    }
}

/// Derives the active hazard set.
///
/// Pure: the result depends only on the arguments. `EmergencyKind::None`
/// always yields an empty set.
pub fn compute_active(
    source: &[Arc<HazardPolygon>],
    emergency: EmergencyKind,
    profile: TravelProfile,
) -> ActiveHazardSet {
    let Some(kind) = emergency.hazard_kind() else {
        return ActiveHazardSet::empty();
    };

    let polygons = source
        .iter()
        .filter(|polygon| polygon.kind == kind)
        .filter(|polygon| polygon.profile.is_none_or(|restricted| restricted == profile))
        .cloned()
        .collect();

    ActiveHazardSet { polygons }
}
