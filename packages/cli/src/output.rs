//! JSON reports written by each subcommand.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use patrol_planner_api_models::{HotspotResponse, RouteResponse};
use patrol_planner_hotspot_models::{DetectionSummary, Hotspot};
use patrol_planner_route_models::{PatrolTarget, RouteAllocation};
use serde::Serialize;

/// Output of `detect`.
#[derive(Debug, Serialize)]
pub struct DetectReport {
    pub summary: DetectionSummary,
    pub hotspots: Vec<HotspotResponse>,
}

impl DetectReport {
    #[must_use]
    pub fn new(summary: DetectionSummary, hotspots: &[Hotspot]) -> Self {
        Self {
            summary,
            hotspots: hotspots.iter().map(HotspotResponse::from).collect(),
        }
    }
}

/// Output of `route`.
#[derive(Debug, Serialize)]
pub struct RouteReport {
    pub routes: Vec<RouteResponse>,
    pub unassigned_ids: Vec<i64>,
    pub covered_priority: f64,
}

impl<T: PatrolTarget> From<&RouteAllocation<T>> for RouteReport {
    fn from(allocation: &RouteAllocation<T>) -> Self {
        Self {
            routes: allocation.routes.iter().map(RouteResponse::from).collect(),
            unassigned_ids: allocation
                .unassigned
                .iter()
                .map(PatrolTarget::cluster_id)
                .collect(),
            covered_priority: allocation.covered_priority(),
        }
    }
}

/// Output of `plan`: the full hotspot records plus their routes.
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub summary: DetectionSummary,
    pub hotspots: Vec<Hotspot>,
    #[serde(flatten)]
    pub routing: RouteReport,
}

/// Pretty-prints `value` as JSON to `output`, or to stdout when no path is
/// given.
///
/// # Errors
///
/// Returns an error if the destination cannot be written.
pub fn write_json<T: Serialize>(
    value: &T,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create {}: {e}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writeln!(writer)?;
        writer.flush()?;
        log::info!("Wrote {}", path.display());
    } else {
        let stdout = std::io::stdout();
        let mut writer = stdout.lock();
        serde_json::to_writer_pretty(&mut writer, value)?;
        writeln!(writer)?;
    }
    Ok(())
}
