//! Collapses clusters into hotspot records.
//!
//! Each non-noise cluster becomes one [`Hotspot`]: its centroid, member
//! count, convex hull area (projected to kilometers around the centroid and
//! floored), density, default priority, and a risk level relative to the
//! densest cluster of the same run.

use patrol_planner_hotspot_models::{ClusterLabel, ClusterPartition, Hotspot, RiskLevel};
use patrol_planner_spatial::{GeoPoint, centroid, hull_area_km2};

use crate::cluster::partition_from_labels;

/// Builds one hotspot per cluster in `partition`, ordered by cluster id.
///
/// `points` must be the slice the partition was computed over. A partition
/// with no clusters yields an empty list.
#[must_use]
pub fn aggregate(
    points: &[GeoPoint],
    partition: &ClusterPartition,
    min_area_km2: f64,
) -> Vec<Hotspot> {
    let mut hotspots: Vec<Hotspot> = partition
        .clusters
        .iter()
        .enumerate()
        .filter_map(|(id, members)| {
            let member_points: Vec<GeoPoint> = members.iter().map(|&idx| points[idx]).collect();
            summarize(i64::try_from(id).ok()?, &member_points, min_area_km2)
        })
        .collect();

    assign_risk_levels(&mut hotspots);

    log::debug!("Aggregated {} hotspots", hotspots.len());

    hotspots
}

/// Same as [`aggregate`], taking one label per point instead of a
/// partition.
#[must_use]
pub fn aggregate_labels(
    points: &[GeoPoint],
    labels: &[ClusterLabel],
    min_area_km2: f64,
) -> Vec<Hotspot> {
    aggregate(points, &partition_from_labels(labels), min_area_km2)
}

#[allow(clippy::cast_precision_loss)]
fn summarize(cluster_id: i64, members: &[GeoPoint], min_area_km2: f64) -> Option<Hotspot> {
    let center = centroid(members)?;
    let n_incidents = u32::try_from(members.len()).unwrap_or(u32::MAX);

    let hull_area = hull_area_km2(members, center);
    let area_km2 = if hull_area < min_area_km2 {
        log::debug!(
            "Cluster {cluster_id} hull area {hull_area:.6} km² below floor, using {min_area_km2} km²"
        );
        min_area_km2
    } else {
        hull_area
    };

    let density_per_km2 = f64::from(n_incidents) / area_km2;

    Some(Hotspot {
        cluster_id,
        center_lat: center.latitude,
        center_lon: center.longitude,
        n_incidents,
        area_km2,
        density_per_km2,
        priority: Hotspot::default_priority(density_per_km2),
        risk_level: RiskLevel::Low,
    })
}

/// Buckets each hotspot's density against the densest hotspot in the set.
pub fn assign_risk_levels(hotspots: &mut [Hotspot]) {
    let max_density = hotspots
        .iter()
        .map(|h| h.density_per_km2)
        .fold(0.0_f64, f64::max);

    for hotspot in hotspots.iter_mut() {
        let intensity = if max_density > 0.0 {
            hotspot.density_per_km2 / max_density
        } else {
            0.0
        };
        hotspot.risk_level = RiskLevel::from_normalized(intensity);
    }
}
