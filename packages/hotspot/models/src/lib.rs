#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident, cluster, and hotspot types for density-based hotspot detection.
//!
//! These are plain values: a detection run builds a fresh set of them and
//! never mutates them afterwards. Cluster ids are numbered per run and are
//! not stable across runs; cross-day continuity comes from spatial matching
//! in the stability tracker, never from id equality.

use chrono::NaiveDate;
use patrol_planner_spatial::GeoPoint;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single geolocated incident from the cleaned incident table.
///
/// Coordinates are optional because the upstream feed has rows with missing
/// locations; the coordinate preparer drops those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentPoint {
    /// Latitude in degrees, if the record has one.
    pub latitude: Option<f64>,
    /// Longitude in degrees, if the record has one.
    pub longitude: Option<f64>,
    /// Calendar date the incident occurred.
    pub incident_date: NaiveDate,
    /// Free-form crime type from the source feed.
    pub crime_type: Option<String>,
}

impl IncidentPoint {
    /// Creates an incident with known coordinates and no crime type.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, incident_date: NaiveDate) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            incident_date,
            crime_type: None,
        }
    }

    /// Returns the location if both coordinates are present and within the
    /// WGS84 range.
    #[must_use]
    pub fn location(&self) -> Option<GeoPoint> {
        let point = GeoPoint::new(self.latitude?, self.longitude?);
        point.is_valid().then_some(point)
    }
}

/// Cluster assignment for one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterLabel {
    /// Member of the cluster with this id.
    Cluster(u32),
    /// Reachable from no core point.
    Noise,
}

impl ClusterLabel {
    /// Sentinel used for [`ClusterLabel::Noise`] in integer form.
    pub const NOISE_ID: i64 = -1;

    /// Whether this label is [`ClusterLabel::Noise`].
    #[must_use]
    pub const fn is_noise(self) -> bool {
        matches!(self, Self::Noise)
    }

    /// Integer form: the cluster id, or `-1` for noise.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Cluster(id) => i64::from(id),
            Self::Noise => Self::NOISE_ID,
        }
    }
}

impl From<ClusterLabel> for i64 {
    fn from(label: ClusterLabel) -> Self {
        label.as_i64()
    }
}

/// Cluster membership for one clustering run, expressed as a partition of
/// point indices.
///
/// Cluster `i` is `clusters[i]`; its member indices are ascending. Ids are
/// assigned in the order clusters were seeded, which follows input order.
/// Any index not in a cluster is noise.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterPartition {
    /// Member indices per cluster.
    pub clusters: Vec<Vec<usize>>,
    /// Number of points the partition covers.
    pub point_count: usize,
}

impl ClusterPartition {
    /// Number of non-noise clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Whether no cluster was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// One label per input point, in input order.
    #[must_use]
    pub fn labels(&self) -> Vec<ClusterLabel> {
        let mut labels = vec![ClusterLabel::Noise; self.point_count];
        for (id, members) in self.clusters.iter().enumerate() {
            let id = u32::try_from(id).unwrap_or(u32::MAX);
            for &idx in members {
                labels[idx] = ClusterLabel::Cluster(id);
            }
        }
        labels
    }

    /// Indices of points that belong to no cluster.
    #[must_use]
    pub fn noise(&self) -> Vec<usize> {
        self.labels()
            .iter()
            .enumerate()
            .filter(|(_, label)| label.is_noise())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Number of points assigned to some cluster.
    #[must_use]
    pub fn clustered_count(&self) -> usize {
        self.clusters.iter().map(Vec::len).sum()
    }
}

/// Coarse risk bucket derived from a hotspot's density relative to the
/// densest hotspot of the same run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    /// Normalized density up to 0.3.
    Low,
    /// Normalized density above 0.3.
    Medium,
    /// Normalized density above 0.6.
    High,
    /// Normalized density above 0.8.
    Critical,
}

impl RiskLevel {
    /// Buckets a density normalized to `0.0..=1.0`.
    #[must_use]
    pub fn from_normalized(intensity: f64) -> Self {
        if intensity > 0.8 {
            Self::Critical
        } else if intensity > 0.6 {
            Self::High
        } else if intensity > 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One aggregated cluster of incidents.
///
/// `density_per_km2` is always `n_incidents / area_km2`, and `area_km2` is
/// never below the run's minimum-area floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Cluster id within the detection run that produced this hotspot.
    pub cluster_id: i64,
    /// Mean latitude of member incidents.
    pub center_lat: f64,
    /// Mean longitude of member incidents.
    pub center_lon: f64,
    /// Number of member incidents.
    pub n_incidents: u32,
    /// Convex hull area of the members, floored.
    pub area_km2: f64,
    /// Incidents per square kilometer.
    pub density_per_km2: f64,
    /// Allocation weight. Defaults to a scaled density.
    pub priority: f64,
    /// Density bucket relative to the rest of the run.
    pub risk_level: RiskLevel,
}

impl Hotspot {
    /// Scale applied to density to produce the default priority.
    pub const PRIORITY_DENSITY_SCALE: f64 = 100.0;

    /// Centroid as a [`GeoPoint`].
    #[must_use]
    pub const fn center(&self) -> GeoPoint {
        GeoPoint::new(self.center_lat, self.center_lon)
    }

    /// Default priority for a given density.
    #[must_use]
    pub fn default_priority(density_per_km2: f64) -> f64 {
        density_per_km2 / Self::PRIORITY_DENSITY_SCALE
    }

    /// Returns a copy carrying an externally computed priority.
    #[must_use]
    pub fn with_priority(self, priority: f64) -> Self {
        Self { priority, ..self }
    }
}

/// A hotspot together with its multi-day observation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StableHotspotRecord {
    /// Most recent observation of the tracked cluster.
    pub hotspot: Hotspot,
    /// `days_observed >= min_days` at query time.
    pub is_stable_hotspot: bool,
    /// Distinct days on which the tracked cluster was matched.
    pub days_observed: u32,
    /// First day the tracked cluster was seen.
    pub first_seen: NaiveDate,
    /// Last day the tracked cluster was seen.
    pub last_seen: NaiveDate,
}

/// Counts describing one detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Points that survived preparation.
    pub total_points: usize,
    /// Points that ended up in some cluster.
    pub clustered_points: usize,
    /// Points labeled noise.
    pub noise_points: usize,
    /// Hotspots reported.
    pub hotspot_count: usize,
}
