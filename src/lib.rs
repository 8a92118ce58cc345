//! evac-router core
//!
//! Hazard-aware evacuation routing: active hazard selection, nearest
//! evacuation point lookup, route computation against a routing provider
//! with hazard validation, and live navigation with off-route
//! recalculation and arrival detection.

pub mod model;
pub mod error;
pub mod config;
pub mod haversine;
pub mod geometry;
pub mod polyline;
pub mod hazard;
pub mod destination;
pub mod dataset;
pub mod traits;
pub mod ors;
pub mod calculator;
pub mod navigation;
pub mod session;
pub mod driver;

pub use calculator::RouteCalculator;
pub use config::EngineConfig;
pub use error::RouteError;
pub use model::{Coordinate, Destination, DestinationMode, EmergencyKind, LocationSample, StartMode, TravelProfile};
pub use session::{RouteSession, SessionSnapshot};
pub use traits::RoutingProvider;
