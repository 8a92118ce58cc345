//! Live tracking of the traveler against the installed route.
//!
//! The monitor owns the navigation phase and interprets location samples;
//! it never issues route requests itself. A [`SampleOutcome::OffRoute`]
//! tells the session to dispatch a recalculation.

use serde::{Deserialize, Serialize};

use crate::haversine::{haversine_m, min_distance_m};
use crate::model::Coordinate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorOptions {
    /// Leading route points closer than this to a sample count as passed.
    pub trim_radius_m: f64,
    /// A sample farther than this from every route point is off-route.
    pub deviation_threshold_m: f64,
    /// Fewer remaining points than this while evacuating means arrival.
    pub arrival_min_points: usize,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            trim_radius_m: 10.0,
            deviation_threshold_m: 25.0,
            arrival_min_points: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPhase {
    #[default]
    Idle,
    AwaitingRoute,
    Active,
    Recalculating,
    Arrived,
}

impl NavigationPhase {
    /// A route request is in flight.
    pub fn is_pending(self) -> bool {
        matches!(self, NavigationPhase::AwaitingRoute | NavigationPhase::Recalculating)
    }

    /// Location samples are tracked against the route.
    pub fn is_tracking(self) -> bool {
        matches!(self, NavigationPhase::Active | NavigationPhase::Recalculating)
    }
}

/// What a location sample did to the route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Not tracking, or nothing left to track.
    Ignored,
    /// On route; `trimmed` leading points were consumed.
    Progressed { trimmed: usize },
    /// Deviation detected; the caller must request a recalculation.
    OffRoute { distance_m: f64 },
    /// Deviation observed while a recalculation is already pending.
    OffRouteSuppressed { distance_m: f64, trimmed: usize },
    /// Fewer than the minimum points remain; the route was cleared.
    Arrived { trimmed: usize },
}

#[derive(Debug, Clone, Default)]
pub struct NavigationMonitor {
    options: MonitorOptions,
    phase: NavigationPhase,
}

impl NavigationMonitor {
    pub fn new(options: MonitorOptions) -> Self {
        Self {
            options,
            phase: NavigationPhase::Idle,
        }
    }

    pub fn phase(&self) -> NavigationPhase {
        self.phase
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    /// Enters `AwaitingRoute` for an explicit request.
    pub fn request_started(&mut self) {
        self.transition(NavigationPhase::AwaitingRoute);
    }

    pub fn route_installed(&mut self) {
        self.transition(NavigationPhase::Active);
    }

    pub fn route_failed(&mut self) {
        self.transition(NavigationPhase::Idle);
    }

    pub fn cancel(&mut self) {
        self.transition(NavigationPhase::Idle);
    }

    /// Processes one location sample against `route`.
    ///
    /// The route only ever loses leading points here. When evacuating and
    /// the remainder drops below the arrival minimum, the route is cleared.
    pub fn on_sample(&mut self, sample: Coordinate, route: &mut Vec<Coordinate>, evacuating: bool) -> SampleOutcome {
        if !self.phase.is_tracking() {
            return SampleOutcome::Ignored;
        }
        let Some(distance_m) = min_distance_m(sample, route) else {
            return SampleOutcome::Ignored;
        };

        let off_route = distance_m > self.options.deviation_threshold_m;
        if off_route && self.phase == NavigationPhase::Active {
            tracing::debug!(distance_m, "traveler left the route");
            self.transition(NavigationPhase::Recalculating);
            return SampleOutcome::OffRoute { distance_m };
        }

        let trimmed = trim_leading(route, sample, self.options.trim_radius_m);

        if evacuating && route.len() < self.options.arrival_min_points {
            route.clear();
            self.transition(NavigationPhase::Arrived);
            return SampleOutcome::Arrived { trimmed };
        }

        if off_route {
            SampleOutcome::OffRouteSuppressed { distance_m, trimmed }
        } else {
            SampleOutcome::Progressed { trimmed }
        }
    }

    fn transition(&mut self, next: NavigationPhase) {
        if self.phase != next {
            tracing::debug!(from = ?self.phase, to = ?next, "navigation phase change");
            self.phase = next;
        }
    }
}

/// True when `sample` is farther than `threshold_m` from every route point.
pub fn is_off_route(sample: Coordinate, route: &[Coordinate], threshold_m: f64) -> bool {
    min_distance_m(sample, route).is_some_and(|distance| distance > threshold_m)
}

/// Removes the leading points within `radius_m` of `sample`.
///
/// Stops at the first point outside the radius. Returns how many points
/// were removed.
pub fn trim_leading(route: &mut Vec<Coordinate>, sample: Coordinate, radius_m: f64) -> usize {
    let passed = route
        .iter()
        .take_while(|point| haversine_m(sample, **point) <= radius_m)
        .count();
    route.drain(..passed);
    passed
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ~11.1 m per step of latitude.
    const STEP: f64 = 0.0001;

    fn straight_route(points: usize) -> Vec<Coordinate> {
        (0..points)
            .map(|i| Coordinate::new(5.0700 + STEP * i as f64, -75.5100))
            .collect()
    }

    fn tracking_monitor() -> NavigationMonitor {
        let mut monitor = NavigationMonitor::default();
        monitor.request_started();
        monitor.route_installed();
        monitor
    }

    #[test]
    fn test_default_thresholds() {
        let options = MonitorOptions::default();
        assert_eq!(options.trim_radius_m, 10.0);
        assert_eq!(options.deviation_threshold_m, 25.0);
        assert_eq!(options.arrival_min_points, 3);
    }

    #[test]
    fn test_trim_removes_only_leading_points_in_radius() {
        let mut route = straight_route(5);
        // A later point coincides with the sample but sits after a far one
        let first = route[0];
        route.push(first);
        let removed = trim_leading(&mut route, first, 10.0);
        assert_eq!(removed, 1);
        assert_eq!(route.len(), 5);
    }

    #[test]
    fn test_trim_never_grows_route() {
        let mut route = straight_route(20);
        let mut previous = route.len();
        for i in 0..20 {
            let sample = Coordinate::new(5.0700 + STEP * i as f64 * 0.7, -75.51003);
            trim_leading(&mut route, sample, 10.0);
            assert!(route.len() <= previous);
            previous = route.len();
        }
    }

    #[test]
    fn test_trim_with_sample_between_points() {
        let mut route = straight_route(6);
        // Halfway between point 0 and 1: both ~5.6 m away
        let sample = Coordinate::new(5.0700 + STEP / 2.0, -75.5100);
        assert_eq!(trim_leading(&mut route, sample, 10.0), 2);
        assert_eq!(route[0], Coordinate::new(5.0700 + STEP * 2.0, -75.5100));
    }

    #[test]
    fn test_is_off_route() {
        let route = straight_route(3);
        assert!(!is_off_route(Coordinate::new(5.0701, -75.5101), &route, 25.0));
        assert!(is_off_route(Coordinate::new(5.0701, -75.5110), &route, 25.0));
        assert!(!is_off_route(Coordinate::new(5.0701, -75.5110), &[], 25.0));
    }

    #[test]
    fn test_samples_ignored_when_idle() {
        let mut monitor = NavigationMonitor::default();
        let mut route = straight_route(5);
        let outcome = monitor.on_sample(route[0], &mut route, true);
        assert_eq!(outcome, SampleOutcome::Ignored);
        assert_eq!(route.len(), 5);
    }

    #[test]
    fn test_progress_trims_route() {
        let mut monitor = tracking_monitor();
        let mut route = straight_route(8);
        let sample = Coordinate::new(5.0700 + STEP / 2.0, -75.5100);
        let outcome = monitor.on_sample(sample, &mut route, true);
        assert_eq!(outcome, SampleOutcome::Progressed { trimmed: 2 });
        assert_eq!(route.len(), 6);
        assert_eq!(monitor.phase(), NavigationPhase::Active);
    }

    #[test]
    fn test_off_route_enters_recalculating_once() {
        let mut monitor = tracking_monitor();
        let mut route = straight_route(8);
        let far = Coordinate::new(5.0702, -75.5110); // ~110 m east

        assert!(matches!(monitor.on_sample(far, &mut route, true), SampleOutcome::OffRoute { .. }));
        assert_eq!(monitor.phase(), NavigationPhase::Recalculating);
        assert_eq!(route.len(), 8, "off-route samples do not trim");

        for _ in 0..3 {
            let outcome = monitor.on_sample(far, &mut route, true);
            assert!(
                matches!(outcome, SampleOutcome::OffRouteSuppressed { trimmed: 0, .. }),
                "got {:?}",
                outcome
            );
        }
        assert_eq!(monitor.phase(), NavigationPhase::Recalculating);
    }

    #[test]
    fn test_trimming_continues_while_recalculating() {
        let mut monitor = tracking_monitor();
        let mut route = straight_route(8);
        monitor.on_sample(Coordinate::new(5.0702, -75.5110), &mut route, true);
        let outcome = monitor.on_sample(route[0], &mut route, true);
        assert_eq!(outcome, SampleOutcome::Progressed { trimmed: 1 });
        assert_eq!(monitor.phase(), NavigationPhase::Recalculating);
    }

    #[test]
    fn test_arrival_with_two_point_route() {
        let mut monitor = tracking_monitor();
        let mut route = straight_route(2);
        let outcome = monitor.on_sample(Coordinate::new(5.0700, -75.51005), &mut route, true);
        assert_eq!(outcome, SampleOutcome::Arrived { trimmed: 1 });
        assert!(route.is_empty());
        assert_eq!(monitor.phase(), NavigationPhase::Arrived);
    }

    #[test]
    fn test_no_arrival_when_not_evacuating() {
        let mut monitor = tracking_monitor();
        let mut route = straight_route(3);
        let outcome = monitor.on_sample(route[0], &mut route, false);
        assert_eq!(outcome, SampleOutcome::Progressed { trimmed: 1 });
        assert_eq!(route.len(), 2);
        assert_eq!(monitor.phase(), NavigationPhase::Active);
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut monitor = tracking_monitor();
        monitor.cancel();
        assert_eq!(monitor.phase(), NavigationPhase::Idle);
    }
}
