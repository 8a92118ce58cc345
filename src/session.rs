//! The route session: single owner of configuration, navigation state and
//! the active route.
//!
//! Every command is a synchronous state change. Commands that need a route
//! return a [`RouteTicket`]; whoever runs the computation hands the result
//! back through [`RouteSession::complete_route`], which drops results whose
//! generation is no longer current (cancelled, superseded, or arrived).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::{DestinationCatalog, HazardDataset};
use crate::destination::nearest;
use crate::error::RouteError;
use crate::hazard::{ActiveHazardSet, compute_active};
use crate::model::{
    Coordinate, Destination, DestinationMode, EmergencyKind, LocationSample, StartMode, TravelProfile,
};
use crate::navigation::{MonitorOptions, NavigationMonitor, NavigationPhase, SampleOutcome};

/// Category of the destinations used for nearest-point evacuation.
pub const DEFAULT_EVACUATION_CATEGORY: &str = "meeting_point";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub monitor: MonitorOptions,
    pub evacuation_category: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            monitor: MonitorOptions::default(),
            evacuation_category: DEFAULT_EVACUATION_CATEGORY.to_string(),
        }
    }
}

/// User-selected routing configuration.
///
/// A manual start point only exists while the start mode is
/// [`StartMode::ManualPoint`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteConfiguration {
    travel_profile: TravelProfile,
    start_mode: StartMode,
    manual_start_point: Option<Coordinate>,
    destination_mode: DestinationMode,
    explicit_destination: Option<Destination>,
    emergency_kind: EmergencyKind,
}

impl RouteConfiguration {
    pub fn travel_profile(&self) -> TravelProfile {
        self.travel_profile
    }

    pub fn start_mode(&self) -> StartMode {
        self.start_mode
    }

    pub fn manual_start_point(&self) -> Option<Coordinate> {
        self.manual_start_point
    }

    pub fn destination_mode(&self) -> DestinationMode {
        self.destination_mode
    }

    pub fn explicit_destination(&self) -> Option<&Destination> {
        self.explicit_destination.as_ref()
    }

    pub fn emergency_kind(&self) -> EmergencyKind {
        self.emergency_kind
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteFailure {
    pub error: RouteError,
    /// Failed while recalculating after an off-route deviation.
    pub during_recalculation: bool,
}

/// Observable navigation flags for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavigationState {
    pub phase: NavigationPhase,
    pub is_evacuating: bool,
    /// A route request is in flight.
    pub is_recalculating: bool,
    /// The in-flight request was triggered by an off-route deviation.
    pub off_route: bool,
    pub arrived: bool,
    pub last_known_location: Option<Coordinate>,
    pub last_fix_at: Option<DateTime<Utc>>,
    /// Destination of the current or pending route.
    pub destination: Option<Destination>,
    pub last_failure: Option<RouteFailure>,
}

impl NavigationState {
    /// Whether the last failure deserves a user-facing notice.
    ///
    /// Failures of off-route recalculations are expected to be transient
    /// and are not surfaced.
    pub fn should_notify_failure(&self) -> bool {
        self.last_failure
            .as_ref()
            .is_some_and(|failure| !failure.during_recalculation)
    }
}

/// A dispatched route request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTicket {
    pub generation: u64,
    pub start: Coordinate,
    pub destination: Destination,
    pub profile: TravelProfile,
    pub hazards: ActiveHazardSet,
    pub recalculation: bool,
}

/// Result of handing a route computation back to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Installed { points: usize },
    Failed(RouteError),
    /// Stale generation; the session state was left untouched.
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleReport {
    pub outcome: SampleOutcome,
    /// Recalculation to dispatch, if the sample triggered one.
    pub ticket: Option<RouteTicket>,
}

/// Read-only view for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub route: Vec<Coordinate>,
    pub state: NavigationState,
    pub hazards: ActiveHazardSet,
    pub config: RouteConfiguration,
}

#[derive(Debug)]
pub struct RouteSession {
    hazard_source: Arc<HazardDataset>,
    catalog: Arc<DestinationCatalog>,
    evacuation_category: String,
    config: RouteConfiguration,
    hazards: ActiveHazardSet,
    route: Vec<Coordinate>,
    state: NavigationState,
    monitor: NavigationMonitor,
    generation: u64,
}

impl RouteSession {
    pub fn new(hazard_source: Arc<HazardDataset>, catalog: Arc<DestinationCatalog>, options: SessionOptions) -> Self {
        let config = RouteConfiguration::default();
        let hazards = compute_active(hazard_source.polygons(), config.emergency_kind, config.travel_profile);
        Self {
            hazard_source,
            catalog,
            evacuation_category: options.evacuation_category,
            config,
            hazards,
            route: Vec::new(),
            state: NavigationState::default(),
            monitor: NavigationMonitor::new(options.monitor),
            generation: 0,
        }
    }

    pub fn config(&self) -> &RouteConfiguration {
        &self.config
    }

    pub fn active_route(&self) -> &[Coordinate] {
        &self.route
    }

    pub fn active_hazards(&self) -> &ActiveHazardSet {
        &self.hazards
    }

    pub fn catalog(&self) -> &DestinationCatalog {
        &self.catalog
    }

    pub fn phase(&self) -> NavigationPhase {
        self.monitor.phase()
    }

    pub fn navigation_state(&self) -> NavigationState {
        NavigationState {
            phase: self.monitor.phase(),
            ..self.state.clone()
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            route: self.route.clone(),
            state: self.navigation_state(),
            hazards: self.hazards.clone(),
            config: self.config.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Configuration commands
    // ------------------------------------------------------------------

    pub fn set_travel_profile(&mut self, profile: TravelProfile) {
        self.config.travel_profile = profile;
        self.refresh_hazards();
    }

    pub fn set_emergency_kind(&mut self, kind: EmergencyKind) {
        self.config.emergency_kind = kind;
        self.refresh_hazards();
    }

    pub fn set_start_mode(&mut self, mode: StartMode) {
        self.config.start_mode = mode;
        match mode {
            StartMode::DeviceLocation => self.config.manual_start_point = None,
            StartMode::ManualPoint => {}
        }
    }

    /// Ignored unless the start mode is [`StartMode::ManualPoint`].
    pub fn set_manual_start_point(&mut self, point: Option<Coordinate>) {
        match self.config.start_mode {
            StartMode::ManualPoint => self.config.manual_start_point = point,
            StartMode::DeviceLocation => {
                tracing::debug!("ignoring manual start point in device-location mode");
            }
        }
    }

    pub fn set_destination_mode(&mut self, mode: DestinationMode) {
        self.config.destination_mode = mode;
    }

    pub fn set_explicit_destination(&mut self, destination: Option<Destination>) {
        self.config.explicit_destination = destination;
    }

    fn refresh_hazards(&mut self) {
        self.hazards = compute_active(
            self.hazard_source.polygons(),
            self.config.emergency_kind,
            self.config.travel_profile,
        );
        tracing::debug!(
            emergency = ?self.config.emergency_kind,
            profile = ?self.config.travel_profile,
            active = self.hazards.len(),
            "recomputed active hazards"
        );
    }

    // ------------------------------------------------------------------
    // Route commands
    // ------------------------------------------------------------------

    /// Routes to `destination` explicitly.
    pub fn select_destination(&mut self, destination: Destination) -> Result<Option<RouteTicket>, RouteError> {
        self.config.destination_mode = DestinationMode::Explicit;
        self.config.explicit_destination = Some(destination);
        self.request_route_calculation()
    }

    /// Routes to the nearest evacuation point.
    pub fn route_to_nearest(&mut self) -> Result<Option<RouteTicket>, RouteError> {
        self.config.destination_mode = DestinationMode::Nearest;
        self.config.explicit_destination = None;
        self.request_route_calculation()
    }

    /// Requests a route with the current configuration.
    ///
    /// Returns `Ok(None)` when a request is already in flight; the new
    /// request is coalesced into it. Errors are also recorded in the
    /// navigation state.
    pub fn request_route_calculation(&mut self) -> Result<Option<RouteTicket>, RouteError> {
        if self.monitor.phase().is_pending() {
            tracing::debug!(generation = self.generation, "route request coalesced into pending one");
            return Ok(None);
        }

        let start = match self.resolve_start() {
            Ok(start) => start,
            Err(error) => return Err(self.reject(error)),
        };
        let destination = match self.resolve_destination(start) {
            Ok(destination) => destination,
            Err(error) => return Err(self.reject(error)),
        };

        Ok(Some(self.issue(start, destination, false)))
    }

    /// Starts evacuating to the nearest evacuation point.
    ///
    /// Needs a device location fix.
    pub fn start_evacuation(&mut self) -> Result<Option<RouteTicket>, RouteError> {
        if self.state.last_known_location.is_none() {
            return Err(self.reject(RouteError::LocationUnavailable));
        }

        let was_evacuating = self.state.is_evacuating;
        self.state.is_evacuating = true;
        self.state.arrived = false;
        let requested = self.route_to_nearest();
        match &requested {
            Ok(_) => tracing::info!("evacuation started"),
            Err(_) => self.state.is_evacuating = was_evacuating,
        }
        requested
    }

    /// Stops evacuating and clears the route. Any in-flight result is
    /// discarded when it arrives.
    pub fn cancel_evacuation(&mut self) {
        tracing::info!(generation = self.generation, "evacuation cancelled");
        self.generation += 1;
        self.route.clear();
        self.monitor.cancel();
        self.state.is_evacuating = false;
        self.state.is_recalculating = false;
        self.state.off_route = false;
        self.state.arrived = false;
        self.state.destination = None;
    }

    /// Applies the result of the computation started by ticket `generation`.
    pub fn complete_route(&mut self, generation: u64, result: Result<Vec<Coordinate>, RouteError>) -> Completion {
        if generation != self.generation || !self.monitor.phase().is_pending() {
            tracing::debug!(generation, current = self.generation, "discarding stale route result");
            return Completion::Discarded;
        }

        let recalculation = self.monitor.phase() == NavigationPhase::Recalculating;
        match result {
            Ok(path) => {
                let points = path.len();
                tracing::info!(generation, points, recalculation, "route installed");
                self.route = path;
                self.monitor.route_installed();
                self.state.is_recalculating = false;
                self.state.off_route = false;
                self.state.last_failure = None;
                Completion::Installed { points }
            }
            Err(error) => {
                self.fail_pending(error.clone(), recalculation);
                Completion::Failed(error)
            }
        }
    }

    // ------------------------------------------------------------------
    // Location stream
    // ------------------------------------------------------------------

    /// Feeds one location sample. Samples older than the last one seen are
    /// dropped.
    pub fn on_location(&mut self, sample: LocationSample) -> SampleReport {
        if self.state.last_fix_at.is_some_and(|last| sample.timestamp < last) {
            tracing::debug!(timestamp = %sample.timestamp, "dropping out-of-order location sample");
            return SampleReport {
                outcome: SampleOutcome::Ignored,
                ticket: None,
            };
        }
        self.state.last_known_location = Some(sample.coordinate);
        self.state.last_fix_at = Some(sample.timestamp);

        let outcome = self
            .monitor
            .on_sample(sample.coordinate, &mut self.route, self.state.is_evacuating);

        let ticket = match outcome {
            SampleOutcome::OffRoute { distance_m } => {
                tracing::info!(distance_m, "traveler off route, recalculating");
                match self.resolve_destination(sample.coordinate) {
                    Ok(destination) => Some(self.issue(sample.coordinate, destination, true)),
                    Err(error) => {
                        self.fail_pending(error, true);
                        None
                    }
                }
            }
            SampleOutcome::Arrived { .. } => {
                tracing::info!("arrived at evacuation point");
                self.generation += 1;
                self.state.is_evacuating = false;
                self.state.is_recalculating = false;
                self.state.off_route = false;
                self.state.arrived = true;
                None
            }
            _ => None,
        };

        SampleReport { outcome, ticket }
    }

    fn resolve_start(&self) -> Result<Coordinate, RouteError> {
        let start = match self.config.start_mode {
            StartMode::ManualPoint => self
                .config
                .manual_start_point
                .or(self.state.last_known_location),
            StartMode::DeviceLocation => self.state.last_known_location,
        };
        start.ok_or(RouteError::LocationUnavailable)
    }

    fn resolve_destination(&self, reference: Coordinate) -> Result<Destination, RouteError> {
        let destination = match self.config.destination_mode {
            DestinationMode::Explicit => self.config.explicit_destination.clone(),
            DestinationMode::Nearest => {
                nearest(reference, self.catalog.of_category(&self.evacuation_category)).cloned()
            }
        };
        destination.ok_or(RouteError::NoFeasibleDestination)
    }

    fn issue(&mut self, start: Coordinate, destination: Destination, recalculation: bool) -> RouteTicket {
        self.generation += 1;
        if !recalculation {
            self.monitor.request_started();
        }
        self.state.is_recalculating = true;
        self.state.off_route = recalculation;
        self.state.arrived = false;
        self.state.destination = Some(destination.clone());
        self.state.last_failure = None;

        tracing::debug!(generation = self.generation, destination = destination.id, recalculation, "route request issued");
        RouteTicket {
            generation: self.generation,
            start,
            destination,
            profile: self.config.travel_profile,
            hazards: self.hazards.clone(),
            recalculation,
        }
    }

    /// Records a failure detected before any request was dispatched. An
    /// active route is left as it is; otherwise the session goes idle.
    fn reject(&mut self, error: RouteError) -> RouteError {
        tracing::warn!(%error, "route request rejected");
        if !self.monitor.phase().is_tracking() {
            self.monitor.route_failed();
        }
        self.state.last_failure = Some(RouteFailure {
            error: error.clone(),
            during_recalculation: false,
        });
        error
    }

    fn fail_pending(&mut self, error: RouteError, during_recalculation: bool) {
        tracing::warn!(%error, during_recalculation, "route request failed");
        self.route.clear();
        self.monitor.route_failed();
        self.state.is_recalculating = false;
        self.state.off_route = false;
        self.state.last_failure = Some(RouteFailure {
            error,
            during_recalculation,
        });
    }
}
