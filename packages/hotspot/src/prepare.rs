//! Coordinate preparation.
//!
//! Turns raw incident records into clean point arrays, dropping rows with
//! missing, non-finite, or out-of-range coordinates.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use patrol_planner_hotspot_models::IncidentPoint;
use patrol_planner_spatial::GeoPoint;

use crate::HotspotError;

/// Extracts the valid locations from `incidents`, preserving input order.
#[must_use]
pub fn prepare(incidents: &[IncidentPoint]) -> Vec<GeoPoint> {
    let points: Vec<GeoPoint> = incidents
        .iter()
        .filter_map(IncidentPoint::location)
        .collect();

    let dropped = incidents.len() - points.len();
    if dropped > 0 {
        log::debug!(
            "Dropped {dropped} of {} incidents with missing or invalid coordinates",
            incidents.len()
        );
    }

    points
}

/// Like [`prepare`], but fails when nothing survives.
///
/// # Errors
///
/// Returns [`HotspotError::EmptyInput`] if no incident has a valid location.
pub fn prepare_non_empty(
    incidents: &[IncidentPoint],
    stage: &'static str,
) -> Result<Vec<GeoPoint>, HotspotError> {
    let points = prepare(incidents);
    if points.is_empty() {
        return Err(HotspotError::EmptyInput { stage });
    }
    Ok(points)
}

/// Keeps incidents that occurred within `window_days` of the newest incident
/// date (inclusive on both ends).
///
/// The newest date is taken over all records, including ones whose
/// coordinates will later be dropped.
#[must_use]
pub fn filter_recent(incidents: &[IncidentPoint], window_days: u32) -> Vec<IncidentPoint> {
    let Some(newest) = incidents.iter().map(|i| i.incident_date).max() else {
        return Vec::new();
    };

    let cutoff = newest
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);

    let kept: Vec<IncidentPoint> = incidents
        .iter()
        .filter(|i| i.incident_date >= cutoff)
        .cloned()
        .collect();

    log::debug!(
        "Kept {} of {} incidents on or after {cutoff}",
        kept.len(),
        incidents.len()
    );

    kept
}

/// Groups the valid locations of `incidents` by calendar day, ascending.
#[must_use]
pub fn group_by_day(incidents: &[IncidentPoint]) -> BTreeMap<NaiveDate, Vec<GeoPoint>> {
    let mut days: BTreeMap<NaiveDate, Vec<GeoPoint>> = BTreeMap::new();
    for incident in incidents {
        if let Some(point) = incident.location() {
            days.entry(incident.incident_date).or_default().push(point);
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn keeps_valid_coordinates_in_order() {
        let incidents = vec![
            IncidentPoint::new(41.8781, -87.6298, day(1)),
            IncidentPoint::new(41.8881, -87.6398, day(1)),
            IncidentPoint::new(41.8681, -87.6198, day(1)),
        ];
        let points = prepare(&incidents);
        assert_eq!(points.len(), 3);
        assert!((points[1].latitude - 41.8881).abs() < f64::EPSILON);
    }

    #[test]
    fn drops_missing_nan_and_out_of_range() {
        let mut missing = IncidentPoint::new(41.0, -87.0, day(1));
        missing.latitude = None;
        let incidents = vec![
            missing,
            IncidentPoint::new(f64::NAN, -87.0, day(1)),
            IncidentPoint::new(91.0, -87.0, day(1)),
            IncidentPoint::new(41.0, 181.0, day(1)),
            IncidentPoint::new(41.0, -87.0, day(1)),
        ];
        let points = prepare(&incidents);
        assert_eq!(points, vec![GeoPoint::new(41.0, -87.0)]);
    }

    #[test]
    fn empty_preparation_is_an_error_when_required() {
        let incidents = vec![IncidentPoint::new(f64::NAN, 0.0, day(1))];
        assert!(matches!(
            prepare_non_empty(&incidents, "clustering"),
            Err(HotspotError::EmptyInput {
                stage: "clustering"
            })
        ));
        assert!(prepare(&[]).is_empty());
    }

    #[test]
    fn recent_window_is_relative_to_newest_incident() {
        let incidents = vec![
            IncidentPoint::new(41.0, -87.0, day(1)),
            IncidentPoint::new(41.0, -87.0, day(10)),
            IncidentPoint::new(41.0, -87.0, day(20)),
        ];
        let kept = filter_recent(&incidents, 10);
        let dates: Vec<NaiveDate> = kept.iter().map(|i| i.incident_date).collect();
        assert_eq!(dates, vec![day(10), day(20)]);
        assert!(filter_recent(&[], 10).is_empty());
    }

    #[test]
    fn groups_valid_points_by_day() {
        let incidents = vec![
            IncidentPoint::new(41.0, -87.0, day(2)),
            IncidentPoint::new(41.1, -87.1, day(1)),
            IncidentPoint::new(f64::NAN, -87.1, day(3)),
            IncidentPoint::new(41.2, -87.2, day(2)),
        ];
        let days = group_by_day(&incidents);
        assert_eq!(days.keys().copied().collect::<Vec<_>>(), vec![day(1), day(2)]);
        assert_eq!(days[&day(2)].len(), 2);
    }
}
