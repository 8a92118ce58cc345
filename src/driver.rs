//! Async event loop around a [`RouteSession`].
//!
//! One task owns the session and serializes every state change: commands,
//! location samples and route results. Route computations run on their own
//! tasks and report back through a channel, so the loop never waits on the
//! network.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::calculator::RouteCalculator;
use crate::error::{DriverClosed, RouteError};
use crate::model::{Coordinate, Destination, DestinationMode, EmergencyKind, LocationSample, StartMode, TravelProfile};
use crate::session::{Completion, RouteSession, RouteTicket, SessionSnapshot};

const COMMAND_BUFFER: usize = 32;

/// User intents accepted by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetTravelProfile(TravelProfile),
    SetEmergencyKind(EmergencyKind),
    SetStartMode(StartMode),
    SetManualStartPoint(Option<Coordinate>),
    SetDestinationMode(DestinationMode),
    SetExplicitDestination(Option<Destination>),
    SelectDestination(Destination),
    RouteToNearest,
    RequestRoute,
    StartEvacuation,
    CancelEvacuation,
}

type RouteResult = (u64, Result<Vec<Coordinate>, RouteError>);

/// Client side of a running driver. Dropping it stops the driver.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    locations: watch::Sender<Option<LocationSample>>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn send(&self, command: Command) -> Result<(), DriverClosed> {
        self.commands.send(command).await.map_err(|_| DriverClosed)
    }

    /// Publishes a location sample. Only the latest unprocessed sample is
    /// kept; older ones are overwritten.
    pub fn push_location(&self, sample: LocationSample) -> Result<(), DriverClosed> {
        self.locations.send(Some(sample)).map_err(|_| DriverClosed)
    }

    /// The state after the most recently processed event.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Starts the driver on the current tokio runtime.
///
/// The join handle yields the session back once the handle is dropped.
pub fn spawn(session: RouteSession, calculator: RouteCalculator) -> (SessionHandle, JoinHandle<RouteSession>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (location_tx, location_rx) = watch::channel(None);
    let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

    let task = tokio::spawn(run(session, calculator, command_rx, location_rx, snapshot_tx));
    let handle = SessionHandle {
        commands: command_tx,
        locations: location_tx,
        snapshots: snapshot_rx,
    };
    (handle, task)
}

async fn run(
    mut session: RouteSession,
    calculator: RouteCalculator,
    mut commands: mpsc::Receiver<Command>,
    mut locations: watch::Receiver<Option<LocationSample>>,
    snapshots: watch::Sender<SessionSnapshot>,
) -> RouteSession {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<RouteResult>();
    let mut locations_open = true;

    tracing::info!("session driver started");
    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                tracing::debug!(?command, "applying command");
                if let Some(ticket) = apply(&mut session, command) {
                    dispatch(&calculator, ticket, &done_tx);
                }
            }
            changed = locations.changed(), if locations_open => {
                if changed.is_err() {
                    locations_open = false;
                    continue;
                }
                let sample = *locations.borrow_and_update();
                if let Some(sample) = sample {
                    let report = session.on_location(sample);
                    if let Some(ticket) = report.ticket {
                        dispatch(&calculator, ticket, &done_tx);
                    }
                }
            }
            Some((generation, result)) = done_rx.recv() => {
                if let Completion::Failed(error) = session.complete_route(generation, result) {
                    tracing::debug!(generation, %error, "route computation failed");
                }
            }
        }
        snapshots.send_replace(session.snapshot());
    }
    tracing::info!("session driver stopped");
    session
}

fn apply(session: &mut RouteSession, command: Command) -> Option<RouteTicket> {
    let requested = match command {
        Command::SetTravelProfile(profile) => {
            session.set_travel_profile(profile);
            return None;
        }
        Command::SetEmergencyKind(kind) => {
            session.set_emergency_kind(kind);
            return None;
        }
        Command::SetStartMode(mode) => {
            session.set_start_mode(mode);
            return None;
        }
        Command::SetManualStartPoint(point) => {
            session.set_manual_start_point(point);
            return None;
        }
        Command::SetDestinationMode(mode) => {
            session.set_destination_mode(mode);
            return None;
        }
        Command::SetExplicitDestination(destination) => {
            session.set_explicit_destination(destination);
            return None;
        }
        Command::CancelEvacuation => {
            session.cancel_evacuation();
            return None;
        }
        Command::SelectDestination(destination) => session.select_destination(destination),
        Command::RouteToNearest => session.route_to_nearest(),
        Command::RequestRoute => session.request_route_calculation(),
        Command::StartEvacuation => session.start_evacuation(),
    };

    // Failures are already recorded in the session state.
    requested.unwrap_or_default()
}

fn dispatch(calculator: &RouteCalculator, ticket: RouteTicket, done: &mpsc::UnboundedSender<RouteResult>) {
    let calculator = calculator.clone();
    let done = done.clone();
    let generation = ticket.generation;
    tokio::spawn(async move {
        // Inner task so a panic still produces a completion
        let computation = tokio::spawn(async move {
            calculator
                .compute_route(ticket.start, &ticket.destination, ticket.profile, &ticket.hazards)
                .await
        });
        let result = match computation.await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(generation, error = %err, "route computation aborted");
                Err(RouteError::ProviderFailure(format!("route computation aborted: {}", err)))
            }
        };
        if done.send((generation, result)).is_err() {
            tracing::debug!(generation, "driver gone, dropping route result");
        }
    });
}
