//! Detection parameters.
//!
//! [`DetectionConfig`] is a plain value handed to each detection call; there
//! is no process-wide detector instance. Every field has a default so partial
//! TOML sections deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::HotspotError;

/// Default DBSCAN neighborhood radius, in degrees.
pub const DEFAULT_EPS: f64 = 0.01;

/// Default minimum neighborhood size (including the point itself) for a
/// core point.
pub const DEFAULT_MIN_SAMPLES: u32 = 10;

/// Default look-back window applied before detection, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 90;

/// Smallest area a hotspot may report, in square kilometers.
pub const DEFAULT_MIN_AREA_KM2: f64 = 0.01;

/// Tuning parameters for one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Neighborhood radius in degree-space.
    pub eps: f64,
    /// Points (including itself) within `eps` for a point to be core.
    pub min_samples: u32,
    /// When set, only hotspots that persist on at least this many distinct
    /// days are reported.
    pub min_days: Option<u32>,
    /// When set, incidents older than this many days before the newest
    /// incident are ignored.
    pub window_days: Option<u32>,
    /// Floor applied to degenerate cluster areas.
    pub min_area_km2: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_samples: DEFAULT_MIN_SAMPLES,
            min_days: None,
            window_days: Some(DEFAULT_WINDOW_DAYS),
            min_area_km2: DEFAULT_MIN_AREA_KM2,
        }
    }
}

impl DetectionConfig {
    /// Checks every parameter's range.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::InvalidParameter`] naming the first parameter
    /// that is out of range.
    pub fn validate(&self) -> Result<(), HotspotError> {
        validate_eps(self.eps)?;
        validate_min_samples(self.min_samples)?;

        if !(self.min_area_km2.is_finite() && self.min_area_km2 > 0.0) {
            return Err(HotspotError::invalid(
                "min_area_km2",
                format!("must be a positive number, got {}", self.min_area_km2),
            ));
        }

        Ok(())
    }
}

pub(crate) fn validate_eps(eps: f64) -> Result<(), HotspotError> {
    if eps.is_finite() && eps > 0.0 {
        Ok(())
    } else {
        Err(HotspotError::invalid(
            "eps",
            format!("must be a positive number, got {eps}"),
        ))
    }
}

pub(crate) fn validate_min_samples(min_samples: u32) -> Result<(), HotspotError> {
    if min_samples >= 1 {
        Ok(())
    } else {
        Err(HotspotError::invalid("min_samples", "must be at least 1"))
    }
}
