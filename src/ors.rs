//! OpenRouteService HTTP adapter for route geometry.

use async_trait::async_trait;
use geojson::{Geometry, Value};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::model::Coordinate;
use crate::polyline::DEFAULT_PRECISION;
use crate::traits::{RouteRequest, RouteResponse, RoutingProvider};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrsConfig {
    pub base_url: String,
    /// Sent verbatim in the `Authorization` header.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org/v2/directions".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url_for(&self, request: &RouteRequest) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            request.profile.provider_name()
        )
    }
}

#[async_trait]
impl RoutingProvider for OrsClient {
    async fn route(&self, request: &RouteRequest) -> Result<RouteResponse, ProviderError> {
        let mut builder = self
            .client
            .post(self.url_for(request))
            .header(ACCEPT, "application/json")
            .json(&DirectionsBody::from_request(request));
        if let Some(key) = &self.config.api_key {
            builder = builder.header(AUTHORIZATION, key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "openrouteservice rejected route request");
            return Err(ProviderError::Rejected(format!("{}: {}", status, body)));
        }

        let body = response.json::<DirectionsResponse>().await?;
        Ok(RouteResponse {
            geometry: body.routes.into_iter().next().and_then(|route| route.geometry),
            precision: DEFAULT_PRECISION,
        })
    }
}

#[derive(Debug, Serialize)]
struct DirectionsBody {
    coordinates: [[f64; 2]; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<DirectionsOptions>,
}

#[derive(Debug, Serialize)]
struct DirectionsOptions {
    avoid_polygons: Geometry,
}

impl DirectionsBody {
    fn from_request(request: &RouteRequest) -> Self {
        let options = request
            .avoid_polygons
            .as_ref()
            .filter(|rings| !rings.is_empty())
            .map(|rings| DirectionsOptions {
                avoid_polygons: Geometry::new(Value::MultiPolygon(
                    rings.iter().map(|ring| vec![closed_ring(ring)]).collect(),
                )),
            });

        Self {
            coordinates: [request.start.to_lng_lat(), request.end.to_lng_lat()],
            options,
        }
    }
}

/// GeoJSON ring in `[lng, lat]` order with the first vertex repeated last.
fn closed_ring(ring: &[Coordinate]) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = ring.iter().map(|c| c.to_lng_lat().to_vec()).collect();
    if let Some(first) = out.first().filter(|first| Some(*first) != out.last()).cloned() {
        out.push(first);
    }
    out
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    geometry: Option<String>,
}
