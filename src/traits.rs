//! Seams to the external collaborators of the route engine.
//!
//! The engine never talks to a concrete routing service directly; it goes
//! through [`RoutingProvider`].

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ProviderError;
use crate::model::{Coordinate, TravelProfile};

/// An outbound route request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    pub profile: TravelProfile,
    /// Rings the provider should route around. `None` means no avoidance.
    pub avoid_polygons: Option<Vec<Vec<Coordinate>>>,
}

/// Raw provider answer, still in the provider's compact encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    /// Encoded polyline of the first route, if the provider returned one.
    pub geometry: Option<String>,
    /// Decimal precision of `geometry`.
    pub precision: u32,
}

/// Provides path geometry between two coordinates.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn route(&self, request: &RouteRequest) -> Result<RouteResponse, ProviderError>;
}
