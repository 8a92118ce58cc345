use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use evac_router::dataset::{DestinationCatalog, HazardDataset};
use evac_router::driver::{self, Command};
use evac_router::ors::OrsClient;
use evac_router::{Coordinate, EmergencyKind, EngineConfig, LocationSample, RouteCalculator, RouteSession, TravelProfile};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Computes a hazard-aware evacuation route and prints the session snapshot
/// as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/evac.yaml")]
    config: PathBuf,

    /// Current latitude
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Current longitude
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,

    /// Route to this destination id instead of the nearest meeting point
    #[arg(short, long)]
    destination: Option<u32>,

    #[arg(short, long, value_enum, default_value_t = Profile::Walk)]
    profile: Profile,

    #[arg(short, long, value_enum, default_value_t = Emergency::None)]
    emergency: Emergency,

    /// OpenRouteService API key
    #[arg(long, env = "ORS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Seconds to wait for the route
    #[arg(long, default_value_t = 30)]
    wait_secs: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    Walk,
    Bicycle,
    Drive,
}

impl From<Profile> for TravelProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Walk => TravelProfile::Walk,
            Profile::Bicycle => TravelProfile::Bicycle,
            Profile::Drive => TravelProfile::Drive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Emergency {
    None,
    Flood,
    Landslide,
}

impl From<Emergency> for EmergencyKind {
    fn from(emergency: Emergency) -> Self {
        match emergency {
            Emergency::None => EmergencyKind::None,
            Emergency::Flood => EmergencyKind::Flood,
            Emergency::Landslide => EmergencyKind::Landslide,
        }
    }
}

fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = EngineConfig::load(&args.config)
        .with_context(|| format!("Failed to load config file: {:?}", args.config))?;
    if args.api_key.is_some() {
        config.routing.api_key = args.api_key.clone();
    }
    config.validate().context("Invalid configuration")?;
    init_tracing(&config);

    let hazards = HazardDataset::load_layers(&config.datasets.hazards).context("Failed to load hazard layers")?;
    let catalog = match &config.datasets.destinations {
        Some(path) => DestinationCatalog::from_file(path).context("Failed to load destinations")?,
        None => bail!("datasets.destinations is not configured"),
    };
    info!(hazards = hazards.len(), destinations = catalog.all().len(), "datasets loaded");

    let explicit = match args.destination {
        Some(id) => Some(
            catalog
                .by_id(id)
                .cloned()
                .with_context(|| format!("Unknown destination id {}", id))?,
        ),
        None => None,
    };

    let provider = OrsClient::new(config.routing.clone()).context("Failed to build HTTP client")?;
    let session = RouteSession::new(Arc::new(hazards), Arc::new(catalog), config.session_options());
    let (handle, task) = driver::spawn(session, RouteCalculator::new(Arc::new(provider)));

    let mut snapshots = handle.subscribe();
    handle.send(Command::SetTravelProfile(args.profile.into())).await?;
    handle.send(Command::SetEmergencyKind(args.emergency.into())).await?;
    handle.push_location(LocationSample::now(Coordinate::new(args.lat, args.lng)))?;
    // The location is only seen once the driver has processed it.
    snapshots
        .wait_for(|snapshot| snapshot.state.last_known_location.is_some())
        .await
        .context("Session driver stopped")?;

    let command = match explicit {
        Some(destination) => Command::SelectDestination(destination),
        None => Command::RouteToNearest,
    };
    handle.send(command).await?;

    let settled = tokio::time::timeout(
        Duration::from_secs(args.wait_secs),
        snapshots.wait_for(|snapshot| {
            !snapshot.state.phase.is_pending() && (!snapshot.route.is_empty() || snapshot.state.last_failure.is_some())
        }),
    )
    .await
    .context("Timed out waiting for route")?
    .context("Session driver stopped")?
    .clone();

    if let Some(failure) = &settled.state.last_failure {
        info!(error = %failure.error, "no route");
    }
    println!("{}", serde_json::to_string_pretty(&settled)?);

    drop(snapshots);
    drop(handle);
    task.await.context("Session driver panicked")?;
    Ok(())
}
