#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line data manager for the mangrove map.
//!
//! Drives the persistence service the way the web data-manager screen
//! does: bulk-load the bundled sample dataset, preview and summarize the
//! stored collection, clear it, run the remote migration, and query by
//! location. The `report` subcommand runs a one-off reporting session
//! (position resolution, report submission, leaderboard) entirely in
//! memory.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use mangrove_map_geolocation::{
    FailingPositionSource, FixedPositionSource, GeolocationError, Geolocator, LocationState,
    PositionSource,
};
use mangrove_map_mangrove_models::MangroveProperties;
use mangrove_map_persistence::remote::UnimplementedRemote;
use mangrove_map_persistence::slot::FileSlotStore;
use mangrove_map_persistence::{DataService, Filters, MigrationOutcome};
use mangrove_map_report::{DEFAULT_REPORTER, SessionState};
use mangrove_map_report_models::Coordinates;

/// Bundled sample of the global mangrove reference dataset.
const SAMPLE_DATA: &str = include_str!("../data/sample_mangroves.json");

/// How many features `preview` prints before truncating.
const PREVIEW_LIMIT: usize = 10;

#[derive(Parser)]
#[command(name = "mangrove_map_cli", about = "Mangrove map data manager")]
struct Cli {
    /// File backing the storage slot.
    #[arg(long, default_value = "mangrove_data.json")]
    data_file: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append the bundled sample mangrove dataset to the stored collection
    LoadSample,
    /// Print the first few stored features
    Preview,
    /// Print aggregate statistics over the stored collection
    Stats {
        /// Narrow to features whose state matches this substring
        #[arg(long)]
        state: Option<String>,
    },
    /// Delete all stored data
    Clear,
    /// Migrate local data to the remote backend
    Migrate,
    /// List stored features within a radius of a point
    Near {
        /// Latitude in decimal degrees
        lat: f64,
        /// Longitude in decimal degrees
        lng: f64,
        /// Search radius in kilometers
        #[arg(long, default_value = "10")]
        radius_km: f64,
    },
    /// Run a one-off reporting session (in memory only)
    Report {
        /// Incident descriptions to submit, one report each
        #[arg(required = true)]
        descriptions: Vec<String>,
        /// Reporter identity
        #[arg(long, default_value = DEFAULT_REPORTER)]
        reporter: String,
        /// Latitude of the incident; omit to simulate an unresolved location
        #[arg(long)]
        lat: Option<f64>,
        /// Longitude of the incident; omit to simulate an unresolved location
        #[arg(long)]
        lng: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut service = DataService::new(
        Arc::new(FileSlotStore::new(&cli.data_file)),
        Arc::new(UnimplementedRemote),
    );

    match cli.command {
        Commands::LoadSample => load_sample(&service).await?,
        Commands::Preview => preview(&service).await,
        Commands::Stats { state } => stats(&service, state).await,
        Commands::Clear => {
            service.clear().await?;
            println!("Data cleared");
        }
        Commands::Migrate => migrate(&mut service).await?,
        Commands::Near {
            lat,
            lng,
            radius_km,
        } => near(&service, lat, lng, radius_km).await,
        Commands::Report {
            descriptions,
            reporter,
            lat,
            lng,
        } => report_session(&descriptions, &reporter, lat, lng).await,
    }

    Ok(())
}

async fn load_sample(service: &DataService) -> Result<(), Box<dyn std::error::Error>> {
    let sample: geojson::FeatureCollection = serde_json::from_str(SAMPLE_DATA)?;
    let count = sample.features.len();

    match service.save_data(&sample).await {
        Ok(()) => println!("Loaded {count} sample features"),
        Err(error) => println!("Error loading data: {error}"),
    }
    Ok(())
}

async fn preview(service: &DataService) {
    let collection = service.get_data(&Filters::default()).await;
    if collection.features.is_empty() {
        println!("No mangrove data loaded yet. Run `load-sample` to get started.");
        return;
    }

    for feature in collection.features.iter().take(PREVIEW_LIMIT) {
        match MangroveProperties::from_feature(feature) {
            Ok(props) => {
                let region = props
                    .state
                    .or(props.region)
                    .unwrap_or_else(|| "unknown region".to_string());
                let area = props
                    .area_hectares
                    .map_or_else(String::new, |a| format!(" \u{2022} {a} hectares"));
                println!("{} \u{2014} {region}{area}", props.name);
            }
            Err(error) => println!("(unreadable feature: {error})"),
        }
        if let Some(geometry) = &feature.geometry {
            if let geojson::Value::Point(position) = &geometry.value {
                if let [lng, lat, ..] = position.as_slice() {
                    println!("  at {lat:.4}, {lng:.4}");
                }
            }
        }
    }

    if collection.features.len() > PREVIEW_LIMIT {
        println!("... and {} more", collection.features.len() - PREVIEW_LIMIT);
    }
}

async fn stats(service: &DataService, state: Option<String>) {
    if let Some(state) = state {
        let filtered = service.get_data(&Filters { state: Some(state) }).await;
        println!("Matching features: {}", filtered.features.len());
        return;
    }

    let stats = service.get_stats().await;
    println!("Total features: {}", stats.total_features);
    println!("Storage mode: {}", stats.storage_mode);
    println!("States: {}", stats.states.join(", "));
}

async fn migrate(service: &mut DataService) -> Result<(), Box<dyn std::error::Error>> {
    match service.migrate().await? {
        MigrationOutcome::AlreadyRemote => println!("Already in remote mode"),
        MigrationOutcome::Migrated { features_moved } => {
            println!("Migrated {features_moved} features to the remote backend");
        }
        MigrationOutcome::RemoteRejected { reason } => {
            println!("Migration not performed, staying on local storage: {reason}");
        }
    }
    Ok(())
}

async fn near(service: &DataService, lat: f64, lng: f64, radius_km: f64) {
    let collection = service.get_by_location(lat, lng, radius_km).await;
    println!(
        "{} feature(s) within {radius_km} km of {lat}, {lng}",
        collection.features.len()
    );
    for feature in &collection.features {
        if let Ok(props) = MangroveProperties::from_feature(feature) {
            println!("  {}", props.name);
        }
    }
}

async fn report_session(descriptions: &[String], reporter: &str, lat: Option<f64>, lng: Option<f64>) {
    // The CLI stands in for the browser's positioning capability: explicit
    // coordinates resolve immediately, their absence behaves like an
    // environment without geolocation support.
    let source: Arc<dyn PositionSource> = match (lat, lng) {
        (Some(latitude), Some(longitude)) => Arc::new(FixedPositionSource(Coordinates {
            latitude,
            longitude,
        })),
        _ => Arc::new(FailingPositionSource(GeolocationError::Unsupported)),
    };

    let mut locator = Geolocator::new(source);
    let location = match locator.locate().await {
        LocationState::Available(coordinates) => Some(coordinates),
        LocationState::Failed(reason) => {
            println!("Location unavailable: {reason}");
            println!("Reports cannot be submitted without a resolved location.");
            None
        }
        LocationState::Pending => None,
    };

    let mut session = SessionState::new();
    for description in descriptions {
        match session.submit_report(reporter, description, location, None) {
            Some(report) => println!("Submitted report {} ({description})", report.id),
            None => println!("Rejected: {description}"),
        }
    }

    let stats = session.stats();
    println!();
    println!(
        "{} report(s), {} contributor(s), {} points",
        stats.total_reports, stats.total_contributors, stats.total_points
    );
    for entry in session.leaderboard_sorted() {
        println!("  {} \u{2014} {} points", entry.user_name, entry.points);
    }
}
