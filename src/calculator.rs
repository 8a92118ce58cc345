//! Single route computation against the routing provider.

use std::sync::Arc;

use crate::error::RouteError;
use crate::geometry::path_intersects_any;
use crate::hazard::ActiveHazardSet;
use crate::model::{Coordinate, Destination, TravelProfile};
use crate::polyline::Polyline;
use crate::traits::{RouteRequest, RoutingProvider};

/// Requests a route, applies hazard avoidance and validates the result.
///
/// Stateless apart from the provider handle; cheap to clone into tasks.
#[derive(Clone)]
pub struct RouteCalculator {
    provider: Arc<dyn RoutingProvider>,
}

impl std::fmt::Debug for RouteCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteCalculator").finish_non_exhaustive()
    }
}

impl RouteCalculator {
    pub fn new(provider: Arc<dyn RoutingProvider>) -> Self {
        Self { provider }
    }

    /// Builds the provider request.
    ///
    /// Avoidance is omitted when `start` lies inside an active hazard: the
    /// traveler has to leave the zone, and asking the provider to avoid it
    /// would leave no feasible route.
    pub fn build_request(
        start: Coordinate,
        end: Coordinate,
        profile: TravelProfile,
        hazards: &ActiveHazardSet,
    ) -> RouteRequest {
        let avoid_polygons = if hazards.is_empty() || hazards.contains(start) {
            None
        } else {
            Some(hazards.rings())
        };

        RouteRequest {
            start,
            end,
            profile,
            avoid_polygons,
        }
    }

    /// Computes a hazard-free path from `start` to `destination`.
    ///
    /// No retries: a failed attempt is reported and the caller decides
    /// whether a later event warrants another one.
    pub async fn compute_route(
        &self,
        start: Coordinate,
        destination: &Destination,
        profile: TravelProfile,
        hazards: &ActiveHazardSet,
    ) -> Result<Vec<Coordinate>, RouteError> {
        let request = Self::build_request(start, destination.location, profile, hazards);
        tracing::debug!(
            destination = destination.id,
            profile = profile.provider_name(),
            avoided = request.avoid_polygons.as_ref().map_or(0, Vec::len),
            "requesting route"
        );

        let response = self.provider.route(&request).await.map_err(|err| {
            tracing::warn!(error = %err, "routing provider failed");
            RouteError::from(err)
        })?;

        let encoded = response
            .geometry
            .ok_or_else(|| RouteError::ProviderFailure("response has no geometry".to_string()))?;
        let path = Polyline::decode(&encoded, response.precision)?.into_points();
        if path.is_empty() {
            return Err(RouteError::ProviderFailure("response geometry is empty".to_string()));
        }

        if path_intersects_any(&path, hazards.polygons()) {
            tracing::warn!(points = path.len(), "provider route crosses an active hazard zone");
            return Err(RouteError::HazardValidationFailure);
        }

        Ok(path)
    }
}
