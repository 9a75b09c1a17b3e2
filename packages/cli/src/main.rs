#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for hotspot detection and patrol planning.
//!
//! Reads an incident CSV or a routing request, runs the detection and
//! allocation libraries, and writes JSON to stdout or `--output`. Settings
//! come from an optional TOML file (`--config`) with flags taking
//! precedence.
//!
//! Uses `indicatif-log-bridge` (via [`patrol_planner_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod config;
mod input;
mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use patrol_planner_api_models::{HotspotRequest, RouteRequest};
use patrol_planner_cli_utils::{IndicatifProgress, MultiProgress};
use patrol_planner_hotspot::detect::{detect_daily, detect_hotspots};
use patrol_planner_hotspot::prepare::filter_recent;
use patrol_planner_hotspot::progress::{ProgressCallback, null_progress};
use patrol_planner_hotspot::stability::filter_stable;
use patrol_planner_route::allocate::optimize;
use patrol_planner_spatial::GeoPoint;

use crate::config::{DetectionOverrides, PlannerConfig, RoutingOverrides, apply_request};
use crate::output::{DetectReport, PlanReport, RouteReport, write_json};

#[derive(Parser)]
#[command(
    name = "patrol_planner",
    about = "Crime hotspot detection and patrol route planning"
)]
struct Cli {
    /// TOML file with `[detection]`, `[routing]`, and `[fleet]` sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON here instead of stdout
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect hotspots in an incident CSV
    Detect {
        /// Incident CSV (`latitude`, `longitude`, `incident_date`, `crime_type`)
        #[arg(long)]
        incidents: PathBuf,

        /// JSON detection request whose `eps`, `min_samples`, and `min_days`
        /// replace the configured values
        #[arg(long)]
        request: Option<PathBuf>,

        #[command(flatten)]
        detection: DetectionOverrides,
    },
    /// Report how many days each daily hotspot persisted
    Stability {
        /// Incident CSV
        #[arg(long)]
        incidents: PathBuf,

        #[command(flatten)]
        detection: DetectionOverrides,
    },
    /// Allocate the stops of a JSON routing request to officers
    Route {
        /// JSON routing request
        #[arg(long)]
        request: PathBuf,

        #[command(flatten)]
        routing: RoutingOverrides,
    },
    /// Detect hotspots and route officers through them
    Plan {
        /// Incident CSV
        #[arg(long)]
        incidents: PathBuf,

        #[command(flatten)]
        detection: DetectionOverrides,

        #[command(flatten)]
        routing: RoutingOverrides,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = patrol_planner_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = PlannerConfig::load(cli.config.as_deref())?;
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Detect {
            incidents,
            request,
            detection,
        } => {
            if let Some(path) = request {
                let request: HotspotRequest = input::load_json(&path)?;
                apply_request(&mut config.detection, &request);
            }
            detection.apply(&mut config.detection);
            run_detect(&multi, &config, &incidents, output)?;
        }
        Commands::Stability {
            incidents,
            detection,
        } => {
            detection.apply(&mut config.detection);
            run_stability(&multi, &config, &incidents, output)?;
        }
        Commands::Route { request, routing } => {
            run_route(&config, &request, &routing, output)?;
        }
        Commands::Plan {
            incidents,
            detection,
            routing,
        } => {
            detection.apply(&mut config.detection);
            routing.apply(&mut config.routing);
            routing.apply_fleet(&mut config.fleet);
            run_plan(&multi, &config, &incidents, output)?;
        }
    }

    Ok(())
}

/// Per-day clustering only happens when a stability filter is requested.
fn detection_progress(
    multi: &MultiProgress,
    config: &PlannerConfig,
) -> Arc<dyn ProgressCallback> {
    if config.detection.min_days.is_some() {
        IndicatifProgress::days_bar(multi, "Clustering days")
    } else {
        null_progress()
    }
}

fn run_detect(
    multi: &MultiProgress,
    config: &PlannerConfig,
    incidents: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let incidents = input::load_incidents(incidents)?;
    let progress = detection_progress(multi, config);

    let detection = detect_hotspots(&incidents, &config.detection, &progress)?;

    write_json(
        &DetectReport::new(detection.summary, &detection.hotspots),
        output,
    )
}

fn run_stability(
    multi: &MultiProgress,
    config: &PlannerConfig,
    incidents: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let min_days = config
        .detection
        .min_days
        .ok_or("stability needs --min-days or `min_days` in [detection]")?;

    let incidents = input::load_incidents(incidents)?;
    let windowed = match config.detection.window_days {
        Some(days) => filter_recent(&incidents, days),
        None => incidents,
    };

    let progress = IndicatifProgress::days_bar(multi, "Clustering days");
    let history = detect_daily(&windowed, &config.detection, &progress)?;
    let records = filter_stable(&history, min_days, config.detection.eps)?;

    let stable = records.iter().filter(|r| r.is_stable_hotspot).count();
    log::info!(
        "{stable} of {} tracked hotspots seen on at least {min_days} days",
        records.len()
    );

    write_json(&records, output)
}

fn run_route(
    config: &PlannerConfig,
    request: &Path,
    overrides: &RoutingOverrides,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request: RouteRequest = input::load_json(request)?;

    let mut constraints = config.routing.clone();
    constraints.max_route_distance_km = request.max_route_distance_km;
    overrides.apply(&mut constraints);

    let num_officers = overrides.officers.unwrap_or(request.num_officers);
    let depot = match (overrides.depot_lat, overrides.depot_lon) {
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
        _ => request.depot(),
    };

    let allocation = optimize(&request.hotspots, num_officers, depot, &constraints)?;

    write_json(&RouteReport::from(&allocation), output)
}

fn run_plan(
    multi: &MultiProgress,
    config: &PlannerConfig,
    incidents: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let depot = config
        .fleet
        .depot()
        .ok_or("plan needs a depot: --depot-lat/--depot-lon or [fleet] in the config")?;

    let incidents = input::load_incidents(incidents)?;
    let progress = detection_progress(multi, config);
    let detection = detect_hotspots(&incidents, &config.detection, &progress)?;

    let allocation = optimize(
        &detection.hotspots,
        config.fleet.num_officers,
        depot,
        &config.routing,
    )?;

    write_json(
        &PlanReport {
            summary: detection.summary,
            routing: RouteReport::from(&allocation),
            hotspots: detection.hotspots,
        },
        output,
    )
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;
    use std::process;

    use crate::config::FleetConfig;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("patrol_planner_{name}_{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// A 4x4 incident grid at 0.001° spacing, one CSV row per incident.
    fn grid_rows(csv: &mut String, lat: f64, lon: f64) {
        for i in 0..4 {
            for j in 0..4 {
                writeln!(
                    csv,
                    "{},{},2024-06-01,THEFT",
                    f64::from(i).mul_add(0.001, lat),
                    f64::from(j).mul_add(0.001, lon)
                )
                .unwrap();
            }
        }
    }

    fn plan_config() -> PlannerConfig {
        PlannerConfig {
            fleet: FleetConfig {
                num_officers: 1,
                depot_latitude: Some(41.8781),
                depot_longitude: Some(-87.6298),
            },
            ..PlannerConfig::default()
        }
    }

    #[test]
    fn plan_output_accounts_for_every_hotspot() {
        let dir = scratch_dir("plan");
        let incidents = dir.join("incidents.csv");
        let output = dir.join("plan.json");

        let mut csv = String::from("latitude,longitude,incident_date,crime_type\n");
        grid_rows(&mut csv, 41.88, -87.63);
        // Two degrees east: far beyond the default route distance cap.
        grid_rows(&mut csv, 41.88, -85.63);
        std::fs::write(&incidents, csv).unwrap();

        run_plan(&MultiProgress::new(), &plan_config(), &incidents, Some(&output)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let hotspots = json["hotspots"].as_array().unwrap();
        let routes = json["routes"].as_array().unwrap();
        let unassigned = json["unassigned_ids"].as_array().unwrap();
        let routed: usize = routes
            .iter()
            .map(|r| r["hotspot_ids"].as_array().unwrap().len())
            .sum();

        assert_eq!(hotspots.len(), 2);
        assert_eq!(json["summary"]["hotspot_count"], 2);
        assert_eq!(routes.len(), 1);
        assert_eq!(routed, 1);
        assert_eq!(unassigned.len(), 1);
        assert_eq!(routed + unassigned.len(), hotspots.len());
    }

    #[test]
    fn plan_without_depot_is_an_error() {
        let config = PlannerConfig::default();
        let missing = Path::new("does-not-matter.csv");
        assert!(run_plan(&MultiProgress::new(), &config, missing, None).is_err());
    }
}
