//! Planner configuration file and command-line overrides.
//!
//! The file is TOML with optional `[detection]`, `[routing]`, and `[fleet]`
//! sections. Omitted keys take their defaults, and any flag given on the
//! command line wins over the file.

use std::path::Path;
use std::str::FromStr;

use clap::Args;
use patrol_planner_api_models::HotspotRequest;
use patrol_planner_hotspot::config::DetectionConfig;
use patrol_planner_route::config::{InsertionStrategy, OfficerSelection, RouteConstraints};
use patrol_planner_spatial::GeoPoint;
use serde::{Deserialize, Serialize};

/// Officers and depot used by the `plan` subcommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Officers available for the shift.
    pub num_officers: u32,
    /// Depot latitude.
    pub depot_latitude: Option<f64>,
    /// Depot longitude.
    pub depot_longitude: Option<f64>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            num_officers: 1,
            depot_latitude: None,
            depot_longitude: None,
        }
    }
}

impl FleetConfig {
    /// The depot, if both coordinates are known.
    #[must_use]
    pub fn depot(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.depot_latitude?, self.depot_longitude?))
    }
}

/// Everything a planner run can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// `[detection]` section.
    pub detection: DetectionConfig,
    /// `[routing]` section.
    pub routing: RouteConstraints,
    /// `[fleet]` section.
    pub fleet: FleetConfig,
}

impl PlannerConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if `contents` is not valid TOML for this shape.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Loads the file at `path`, or the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        let config = Self::parse(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());

        Ok(config)
    }
}

/// Detection flags shared by every subcommand that clusters incidents.
#[derive(Debug, Clone, Default, Args)]
pub struct DetectionOverrides {
    /// DBSCAN neighborhood radius in degrees
    #[arg(long)]
    pub eps: Option<f64>,

    /// Minimum neighborhood size for a core point
    #[arg(long)]
    pub min_samples: Option<u32>,

    /// Only keep hotspots seen on at least this many days
    #[arg(long)]
    pub min_days: Option<u32>,

    /// Ignore incidents older than this many days before the newest one
    #[arg(long, conflicts_with = "all_time")]
    pub window_days: Option<u32>,

    /// Use every incident regardless of age
    #[arg(long)]
    pub all_time: bool,
}

impl DetectionOverrides {
    /// Writes every flag that was given into `config`.
    pub fn apply(&self, config: &mut DetectionConfig) {
        if let Some(eps) = self.eps {
            config.eps = eps;
        }
        if let Some(min_samples) = self.min_samples {
            config.min_samples = min_samples;
        }
        if let Some(min_days) = self.min_days {
            config.min_days = Some(min_days);
        }
        if let Some(window_days) = self.window_days {
            config.window_days = Some(window_days);
        }
        if self.all_time {
            config.window_days = None;
        }
    }
}

/// Routing flags shared by `route` and `plan`.
#[derive(Debug, Clone, Default, Args)]
pub struct RoutingOverrides {
    /// Number of officers available
    #[arg(long)]
    pub officers: Option<u32>,

    /// Depot latitude
    #[arg(long, allow_hyphen_values = true)]
    pub depot_lat: Option<f64>,

    /// Depot longitude
    #[arg(long, allow_hyphen_values = true)]
    pub depot_lon: Option<f64>,

    /// Per-route distance cap in kilometers
    #[arg(long)]
    pub max_route_distance_km: Option<f64>,

    /// Shift length in hours
    #[arg(long)]
    pub max_shift_hours: Option<f64>,

    /// Patrol speed used for duration estimates, in km/h
    #[arg(long)]
    pub average_speed_kmh: Option<f64>,

    /// Where new stops go within a route (`tail` or `cheapest`)
    #[arg(long, value_parser = parse_choice::<InsertionStrategy>)]
    pub insertion: Option<InsertionStrategy>,

    /// How a stop picks an officer (`shortest_route` or `smallest_increase`)
    #[arg(long, value_parser = parse_choice::<OfficerSelection>)]
    pub selection: Option<OfficerSelection>,
}

impl RoutingOverrides {
    /// Writes every constraint flag that was given into `constraints`.
    pub fn apply(&self, constraints: &mut RouteConstraints) {
        if let Some(max_route_distance_km) = self.max_route_distance_km {
            constraints.max_route_distance_km = max_route_distance_km;
        }
        if let Some(max_shift_hours) = self.max_shift_hours {
            constraints.max_shift_hours = max_shift_hours;
        }
        if let Some(average_speed_kmh) = self.average_speed_kmh {
            constraints.average_speed_kmh = average_speed_kmh;
        }
        if let Some(insertion) = self.insertion {
            constraints.insertion = insertion;
        }
        if let Some(selection) = self.selection {
            constraints.selection = selection;
        }
    }

    /// Writes the officer count and depot flags into `fleet`.
    pub fn apply_fleet(&self, fleet: &mut FleetConfig) {
        if let Some(officers) = self.officers {
            fleet.num_officers = officers;
        }
        if let Some(lat) = self.depot_lat {
            fleet.depot_latitude = Some(lat);
        }
        if let Some(lon) = self.depot_lon {
            fleet.depot_longitude = Some(lon);
        }
    }
}

fn parse_choice<T: FromStr>(value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("unrecognized value `{value}`"))
}

/// Copies the tuning fields of an API detection request into `config`.
pub fn apply_request(config: &mut DetectionConfig, request: &HotspotRequest) {
    config.eps = request.eps;
    config.min_samples = request.min_samples;
    config.min_days = request.min_days;
}
