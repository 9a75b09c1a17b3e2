//! End-to-end hotspot detection.
//!
//! [`detect_hotspots`] chains window filtering, preparation, clustering,
//! and aggregation for one run, optionally keeping only hotspots that sit on
//! a stable multi-day cluster. [`detect_daily`] produces the per-day history
//! the stability tracker consumes.

use std::sync::Arc;

use chrono::NaiveDate;
use patrol_planner_hotspot_models::{DetectionSummary, Hotspot, IncidentPoint};

use crate::HotspotError;
use crate::aggregate::{aggregate, assign_risk_levels};
use crate::cluster::cluster;
use crate::config::DetectionConfig;
use crate::prepare::{filter_recent, group_by_day, prepare_non_empty};
use crate::progress::ProgressCallback;
use crate::stability::track;

/// Output of one detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Hotspots ordered by density (descending), then cluster id.
    pub hotspots: Vec<Hotspot>,
    /// Point and hotspot counts for the run.
    pub summary: DetectionSummary,
}

/// Detects hotspots in `incidents` using `config`.
///
/// When `config.min_days` is set, the windowed incidents are also clustered
/// day by day and only hotspots within `eps` of a tracked cluster observed
/// on at least `min_days` distinct days are kept.
///
/// # Errors
///
/// Returns [`HotspotError::InvalidParameter`] if `config` is invalid, or
/// [`HotspotError::EmptyInput`] if no incident has a valid location.
pub fn detect_hotspots(
    incidents: &[IncidentPoint],
    config: &DetectionConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Detection, HotspotError> {
    config.validate()?;

    let windowed = match config.window_days {
        Some(days) => filter_recent(incidents, days),
        None => incidents.to_vec(),
    };

    let points = prepare_non_empty(&windowed, "hotspot detection")?;
    let partition = cluster(&points, config.eps, config.min_samples)?;
    let mut hotspots = aggregate(&points, &partition, config.min_area_km2);

    if let Some(min_days) = config.min_days {
        let history = detect_daily(&windowed, config, progress)?;
        let tracker = track(&history, config.eps)?;

        let before = hotspots.len();
        hotspots.retain(|h| tracker.is_stable_at(h.center(), min_days));
        assign_risk_levels(&mut hotspots);
        log::info!(
            "{} of {before} hotspots persist on at least {min_days} days",
            hotspots.len()
        );
    }

    sort_by_density(&mut hotspots);

    let clustered_points = partition.clustered_count();
    let summary = DetectionSummary {
        total_points: points.len(),
        clustered_points,
        noise_points: points.len() - clustered_points,
        hotspot_count: hotspots.len(),
    };

    log::info!(
        "Detected {} hotspots from {} points ({} noise)",
        summary.hotspot_count,
        summary.total_points,
        summary.noise_points
    );

    Ok(Detection { hotspots, summary })
}

/// Clusters each calendar day of `incidents` independently.
///
/// Returns one entry per day with at least one valid incident, ascending by
/// date. Days without clusters carry an empty list. The recent-window filter
/// is not applied here.
///
/// # Errors
///
/// Returns [`HotspotError::InvalidParameter`] if `config` is invalid.
pub fn detect_daily(
    incidents: &[IncidentPoint],
    config: &DetectionConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<(NaiveDate, Vec<Hotspot>)>, HotspotError> {
    config.validate()?;

    let days = group_by_day(incidents);
    progress.set_total(days.len() as u64);

    let mut history = Vec::with_capacity(days.len());
    for (date, points) in days {
        progress.set_message(format!("Clustering {date}"));

        let partition = cluster(&points, config.eps, config.min_samples)?;
        let hotspots = aggregate(&points, &partition, config.min_area_km2);
        log::trace!("{date}: {} points, {} hotspots", points.len(), hotspots.len());

        history.push((date, hotspots));
        progress.inc(1);
    }

    progress.finish(format!("Clustered {} days", history.len()));

    Ok(history)
}

/// Orders hotspots by density descending, then cluster id ascending.
pub fn sort_by_density(hotspots: &mut [Hotspot]) {
    hotspots.sort_by(|a, b| {
        b.density_per_km2
            .total_cmp(&a.density_per_km2)
            .then(a.cluster_id.cmp(&b.cluster_id))
    });
}

#[cfg(test)]
mod tests {
    use patrol_planner_spatial::GeoPoint;

    use super::*;
    use crate::progress::null_progress;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    /// A 4x4 grid of incidents with 0.001° spacing at `center` on `date`.
    fn grid(center: GeoPoint, date: NaiveDate) -> Vec<IncidentPoint> {
        spaced_grid(center, 0.001, date)
    }

    fn spaced_grid(center: GeoPoint, spacing: f64, date: NaiveDate) -> Vec<IncidentPoint> {
        let mut incidents = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                incidents.push(IncidentPoint::new(
                    f64::from(i).mul_add(spacing, center.latitude),
                    f64::from(j).mul_add(spacing, center.longitude),
                    date,
                ));
            }
        }
        incidents
    }

    #[test]
    fn detects_a_single_dense_cluster() {
        let mut incidents = grid(GeoPoint::new(41.88, -87.63), day(1));
        incidents.push(IncidentPoint::new(42.5, -88.5, day(1)));

        let detection =
            detect_hotspots(&incidents, &DetectionConfig::default(), &null_progress()).unwrap();

        assert_eq!(detection.hotspots.len(), 1);
        assert_eq!(detection.hotspots[0].n_incidents, 16);
        assert_eq!(
            detection.summary,
            DetectionSummary {
                total_points: 17,
                clustered_points: 16,
                noise_points: 1,
                hotspot_count: 1,
            }
        );
    }

    #[test]
    fn no_clusters_is_an_empty_result() {
        let incidents = vec![
            IncidentPoint::new(41.0, -87.0, day(1)),
            IncidentPoint::new(42.0, -88.0, day(1)),
        ];
        let detection =
            detect_hotspots(&incidents, &DetectionConfig::default(), &null_progress()).unwrap();
        assert!(detection.hotspots.is_empty());
        assert_eq!(detection.summary.noise_points, 2);
    }

    #[test]
    fn no_valid_points_is_an_error() {
        let incidents = vec![IncidentPoint::new(f64::NAN, -87.0, day(1))];
        assert!(matches!(
            detect_hotspots(&incidents, &DetectionConfig::default(), &null_progress()),
            Err(HotspotError::EmptyInput { .. })
        ));
    }

    #[test]
    fn window_excludes_old_incidents() {
        let mut incidents = grid(GeoPoint::new(41.88, -87.63), day(1));
        incidents.extend(grid(GeoPoint::new(41.70, -87.60), day(20)));

        let config = DetectionConfig {
            window_days: Some(7),
            ..DetectionConfig::default()
        };
        let detection = detect_hotspots(&incidents, &config, &null_progress()).unwrap();
        assert_eq!(detection.hotspots.len(), 1);
        assert!((detection.hotspots[0].center_lat - 41.7015).abs() < 1e-9);
    }

    #[test]
    fn min_days_keeps_only_persistent_hotspots() {
        let persistent = GeoPoint::new(41.88, -87.63);
        let transient = GeoPoint::new(41.75, -87.55);

        let mut incidents = Vec::new();
        for d in 1..=5 {
            incidents.extend(grid(persistent, day(d)));
        }
        incidents.extend(grid(transient, day(3)));

        let config = DetectionConfig {
            min_days: Some(3),
            ..DetectionConfig::default()
        };
        let detection = detect_hotspots(&incidents, &config, &null_progress()).unwrap();

        assert_eq!(detection.hotspots.len(), 1);
        assert!((detection.hotspots[0].center_lat - 41.8815).abs() < 1e-9);
        assert_eq!(detection.hotspots[0].n_incidents, 80);
    }

    #[test]
    fn risk_levels_rank_only_the_persistent_hotspots() {
        let persistent = GeoPoint::new(41.88, -87.63);
        let mut incidents = Vec::new();
        for d in 1..=5 {
            incidents.extend(grid(persistent, day(d)));
        }
        // Denser than the persistent cluster, but only seen once.
        incidents.extend(spaced_grid(GeoPoint::new(41.75, -87.55), 0.0002, day(3)));

        let config = DetectionConfig {
            min_days: Some(3),
            ..DetectionConfig::default()
        };
        let detection = detect_hotspots(&incidents, &config, &null_progress()).unwrap();

        assert_eq!(detection.hotspots.len(), 1);
        assert_eq!(
            detection.hotspots[0].risk_level,
            patrol_planner_hotspot_models::RiskLevel::Critical
        );
    }

    #[test]
    fn daily_history_is_ascending() {
        let mut incidents = grid(GeoPoint::new(41.88, -87.63), day(3));
        incidents.extend(grid(GeoPoint::new(41.88, -87.63), day(1)));
        incidents.push(IncidentPoint::new(41.0, -87.0, day(2)));

        let history =
            detect_daily(&incidents, &DetectionConfig::default(), &null_progress()).unwrap();
        let dates: Vec<NaiveDate> = history.iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(history[0].1.len(), 1);
        assert!(history[1].1.is_empty());
    }

    #[test]
    fn sorted_by_density_then_id() {
        let mut detection_hotspots = vec![
            Hotspot {
                cluster_id: 2,
                center_lat: 0.0,
                center_lon: 0.0,
                n_incidents: 1,
                area_km2: 1.0,
                density_per_km2: 1.0,
                priority: 0.01,
                risk_level: patrol_planner_hotspot_models::RiskLevel::Low,
            };
            3
        ];
        detection_hotspots[0].cluster_id = 5;
        detection_hotspots[1].density_per_km2 = 9.0;
        detection_hotspots[1].cluster_id = 7;

        sort_by_density(&mut detection_hotspots);
        let ids: Vec<i64> = detection_hotspots.iter().map(|h| h.cluster_id).collect();
        assert_eq!(ids, vec![7, 2, 5]);
    }

    #[test]
    fn invalid_config_is_rejected_before_work() {
        let config = DetectionConfig {
            min_samples: 0,
            ..DetectionConfig::default()
        };
        assert!(detect_hotspots(&[], &config, &null_progress()).is_err());
    }
}
