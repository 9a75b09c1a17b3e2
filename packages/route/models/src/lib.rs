#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Patrol route and allocation result types.
//!
//! Routes are generic over [`PatrolTarget`] so the allocator can work on
//! detected [`Hotspot`]s as well as on externally supplied stops that only
//! carry a location and a priority.

use patrol_planner_hotspot_models::Hotspot;
use patrol_planner_spatial::GeoPoint;
use serde::{Deserialize, Serialize};

/// A stop the route allocator can schedule.
pub trait PatrolTarget {
    /// Id reported back to callers.
    fn cluster_id(&self) -> i64;

    /// Where the officer has to go.
    fn location(&self) -> GeoPoint;

    /// Allocation weight; higher is visited first.
    fn priority(&self) -> f64;

    /// Incidents per square kilometer, used to break priority ties.
    fn density(&self) -> f64;
}

impl PatrolTarget for Hotspot {
    fn cluster_id(&self) -> i64 {
        self.cluster_id
    }

    fn location(&self) -> GeoPoint {
        self.center()
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    fn density(&self) -> f64 {
        self.density_per_km2
    }
}

/// The ordered stops assigned to one officer.
///
/// The route starts at the depot, visits `hotspots` in order, and returns to
/// the depot. Totals include both depot legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute<T = Hotspot> {
    /// Officer index, starting at 0.
    pub officer_id: u32,
    /// Stops in visiting order.
    pub hotspots: Vec<T>,
    /// Closed-tour length in kilometers.
    pub total_distance_km: f64,
    /// `total_distance_km / average_speed_kmh`.
    pub estimated_duration_hours: f64,
}

impl<T: PatrolTarget> PatrolRoute<T> {
    /// Cluster ids in visiting order.
    #[must_use]
    pub fn hotspot_ids(&self) -> Vec<i64> {
        self.hotspots.iter().map(PatrolTarget::cluster_id).collect()
    }

    /// Sum of stop priorities.
    #[must_use]
    pub fn covered_priority(&self) -> f64 {
        self.hotspots.iter().map(PatrolTarget::priority).sum()
    }

    /// Whether the officer has no stops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }
}

/// Result of one allocation call.
///
/// Every input stop ends up either in exactly one route or in `unassigned`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAllocation<T = Hotspot> {
    /// One route per officer, ordered by officer id.
    pub routes: Vec<PatrolRoute<T>>,
    /// Stops no officer could take without breaking a cap, in rank order.
    pub unassigned: Vec<T>,
}

impl<T: PatrolTarget> RouteAllocation<T> {
    /// Number of stops left out of every route.
    #[must_use]
    pub fn unassigned_count(&self) -> usize {
        self.unassigned.len()
    }

    /// Number of stops placed on some route.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.routes.iter().map(|r| r.hotspots.len()).sum()
    }

    /// Sum of priorities over all assigned stops.
    #[must_use]
    pub fn covered_priority(&self) -> f64 {
        self.routes.iter().map(|r| r.covered_priority()).sum()
    }

    /// Sum of route lengths in kilometers.
    #[must_use]
    pub fn total_distance_km(&self) -> f64 {
        self.routes.iter().map(|r| r.total_distance_km).sum()
    }
}
