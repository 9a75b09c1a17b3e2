//! Multi-day hotspot stability.
//!
//! Cluster ids are renumbered by every detection run, so hotspots are
//! matched across days by location instead. A [`StabilityTracker`] keeps an
//! arena of tracked clusters. Each day, hotspot and tracked-cluster pairs
//! within `eps` of each other are matched closest first, one match per
//! hotspot and per tracked cluster, so the result does not depend on the
//! order hotspots arrive in. Hotspots left unmatched start new tracked
//! clusters.
//!
//! The tracker is a plain value owned by the caller. Clone it to get a
//! copy-on-write snapshot before feeding a new day.

use chrono::NaiveDate;
use patrol_planner_hotspot_models::{Hotspot, StableHotspotRecord};
use patrol_planner_spatial::GeoPoint;

use crate::HotspotError;
use crate::config::validate_eps;

#[derive(Debug, Clone)]
struct TrackedCluster {
    centroid: GeoPoint,
    days_observed: u32,
    first_seen: NaiveDate,
    last_seen: NaiveDate,
    latest: Hotspot,
}

impl TrackedCluster {
    fn new(date: NaiveDate, hotspot: &Hotspot) -> Self {
        Self {
            centroid: hotspot.center(),
            days_observed: 1,
            first_seen: date,
            last_seen: date,
            latest: hotspot.clone(),
        }
    }

    fn observe(&mut self, date: NaiveDate, hotspot: &Hotspot) {
        let n = f64::from(self.days_observed);
        let center = hotspot.center();
        self.centroid = GeoPoint::new(
            self.centroid.latitude.mul_add(n, center.latitude) / (n + 1.0),
            self.centroid.longitude.mul_add(n, center.longitude) / (n + 1.0),
        );
        self.days_observed += 1;
        self.last_seen = date;
        self.latest = hotspot.clone();
    }
}

/// Registry of clusters tracked across days.
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    eps: f64,
    clusters: Vec<TrackedCluster>,
    latest_day: Option<NaiveDate>,
}

impl StabilityTracker {
    /// Creates an empty tracker that matches centroids within `eps`
    /// degrees.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::InvalidParameter`] if `eps` is not a positive
    /// number.
    pub fn new(eps: f64) -> Result<Self, HotspotError> {
        validate_eps(eps)?;
        Ok(Self {
            eps,
            clusters: Vec::new(),
            latest_day: None,
        })
    }

    /// Number of tracked clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether nothing has been tracked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Most recent day fed to the tracker.
    #[must_use]
    pub const fn latest_day(&self) -> Option<NaiveDate> {
        self.latest_day
    }

    /// Matches one day's hotspots against the tracked clusters.
    ///
    /// Feeding the same date twice merges both sets into that day; a tracked
    /// cluster still counts that day once.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::InvalidParameter`] if `date` is earlier than
    /// a day already observed.
    pub fn observe_day(
        &mut self,
        date: NaiveDate,
        hotspots: &[Hotspot],
    ) -> Result<(), HotspotError> {
        if let Some(latest) = self.latest_day
            && date < latest
        {
            return Err(HotspotError::invalid(
                "date",
                format!("days must be observed in order: {date} is before {latest}"),
            ));
        }
        self.latest_day = Some(date);

        let mut cluster_taken = vec![false; self.clusters.len()];
        let mut hotspot_taken = vec![false; hotspots.len()];
        let mut matched = 0_usize;

        for (_, tracked_idx, hotspot_idx) in self.candidate_pairs(date, hotspots) {
            if cluster_taken[tracked_idx] || hotspot_taken[hotspot_idx] {
                continue;
            }
            cluster_taken[tracked_idx] = true;
            hotspot_taken[hotspot_idx] = true;
            self.clusters[tracked_idx].observe(date, &hotspots[hotspot_idx]);
            matched += 1;
        }

        for (hotspot, taken) in hotspots.iter().zip(hotspot_taken) {
            if !taken {
                self.clusters.push(TrackedCluster::new(date, hotspot));
            }
        }

        log::debug!(
            "{date}: matched {matched} hotspots, started {} tracked clusters ({} total)",
            hotspots.len() - matched,
            self.clusters.len()
        );

        Ok(())
    }

    /// Every (distance, tracked, hotspot) pair within `eps` whose tracked
    /// cluster is not yet matched on `date`, closest first. Equal distances
    /// order by tracked index, then hotspot index.
    fn candidate_pairs(
        &self,
        date: NaiveDate,
        hotspots: &[Hotspot],
    ) -> Vec<(f64, usize, usize)> {
        let mut pairs = Vec::new();

        for (tracked_idx, tracked) in self.clusters.iter().enumerate() {
            if tracked.last_seen == date {
                continue;
            }
            for (hotspot_idx, hotspot) in hotspots.iter().enumerate() {
                let distance = tracked.centroid.degree_distance(&hotspot.center());
                if distance <= self.eps {
                    pairs.push((distance, tracked_idx, hotspot_idx));
                }
            }
        }

        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
        pairs
    }

    /// One record per tracked cluster, in creation order, flagged stable
    /// when observed on at least `min_days` distinct days.
    #[must_use]
    pub fn records(&self, min_days: u32) -> Vec<StableHotspotRecord> {
        self.clusters
            .iter()
            .map(|tracked| StableHotspotRecord {
                hotspot: tracked.latest.clone(),
                is_stable_hotspot: tracked.days_observed >= min_days,
                days_observed: tracked.days_observed,
                first_seen: tracked.first_seen,
                last_seen: tracked.last_seen,
            })
            .collect()
    }

    /// Whether `center` lies within `eps` of a tracked cluster observed on
    /// at least `min_days` days.
    #[must_use]
    pub fn is_stable_at(&self, center: GeoPoint, min_days: u32) -> bool {
        self.clusters.iter().any(|tracked| {
            tracked.days_observed >= min_days
                && tracked.centroid.degree_distance(&center) <= self.eps
        })
    }
}

/// Matches a whole history of daily hotspot sets and reports every tracked
/// cluster.
///
/// Days are processed in ascending date order regardless of input order.
/// Unstable clusters are kept in the output with `is_stable_hotspot` set to
/// `false`.
///
/// # Errors
///
/// Returns [`HotspotError::InvalidParameter`] if `eps` is not a positive
/// number.
pub fn filter_stable(
    daily_hotspot_sets: &[(NaiveDate, Vec<Hotspot>)],
    min_days: u32,
    eps: f64,
) -> Result<Vec<StableHotspotRecord>, HotspotError> {
    Ok(track(daily_hotspot_sets, eps)?.records(min_days))
}

/// Builds a tracker from a history of daily hotspot sets.
///
/// # Errors
///
/// Returns [`HotspotError::InvalidParameter`] if `eps` is not a positive
/// number.
pub fn track(
    daily_hotspot_sets: &[(NaiveDate, Vec<Hotspot>)],
    eps: f64,
) -> Result<StabilityTracker, HotspotError> {
    let mut tracker = StabilityTracker::new(eps)?;

    let mut days: Vec<&(NaiveDate, Vec<Hotspot>)> = daily_hotspot_sets.iter().collect();
    days.sort_by_key(|(date, _)| *date);

    for (date, hotspots) in days {
        tracker.observe_day(*date, hotspots)?;
    }

    Ok(tracker)
}
