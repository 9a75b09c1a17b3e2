//! Routing constraints.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::RouteError;

/// Default cap on one officer's closed-tour length, in kilometers.
pub const DEFAULT_MAX_ROUTE_DISTANCE_KM: f64 = 50.0;

/// Default shift length, in hours.
pub const DEFAULT_MAX_SHIFT_HOURS: f64 = 8.0;

/// Default patrol speed used to turn distance into duration, in km/h.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;

/// Where a new stop may go inside an officer's route.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsertionStrategy {
    /// Append after the last stop.
    #[default]
    Tail,
    /// Insert at whichever position lengthens the route least.
    Cheapest,
}

/// How a stop picks between officers that can all take it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OfficerSelection {
    /// The officer whose route is shortest after taking the stop. Spreads
    /// work across idle officers.
    #[default]
    ShortestRoute,
    /// The officer whose route grows the least.
    SmallestIncrease,
}

/// Caps and tuning for one allocation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConstraints {
    /// No route may be longer than this, in kilometers.
    pub max_route_distance_km: f64,
    /// No route may take longer than this, in hours.
    pub max_shift_hours: f64,
    /// Speed used to estimate route duration, in km/h.
    pub average_speed_kmh: f64,
    /// Insertion position rule.
    pub insertion: InsertionStrategy,
    /// Officer choice rule.
    pub selection: OfficerSelection,
}

impl Default for RouteConstraints {
    fn default() -> Self {
        Self {
            max_route_distance_km: DEFAULT_MAX_ROUTE_DISTANCE_KM,
            max_shift_hours: DEFAULT_MAX_SHIFT_HOURS,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            insertion: InsertionStrategy::default(),
            selection: OfficerSelection::default(),
        }
    }
}

impl RouteConstraints {
    /// Checks every numeric field's range.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidParameter`] naming the first field that
    /// is out of range.
    pub fn validate(&self) -> Result<(), RouteError> {
        if !(self.max_route_distance_km.is_finite() && self.max_route_distance_km >= 0.0) {
            return Err(RouteError::invalid(
                "max_route_distance_km",
                format!("must be non-negative, got {}", self.max_route_distance_km),
            ));
        }
        if !(self.max_shift_hours.is_finite() && self.max_shift_hours >= 0.0) {
            return Err(RouteError::invalid(
                "max_shift_hours",
                format!("must be non-negative, got {}", self.max_shift_hours),
            ));
        }
        if !(self.average_speed_kmh.is_finite() && self.average_speed_kmh > 0.0) {
            return Err(RouteError::invalid(
                "average_speed_kmh",
                format!("must be positive, got {}", self.average_speed_kmh),
            ));
        }
        Ok(())
    }

    /// Estimated hours to drive `distance_km`.
    #[must_use]
    pub fn duration_hours(&self, distance_km: f64) -> f64 {
        distance_km / self.average_speed_kmh
    }

    /// Whether a route of `distance_km` respects both caps.
    #[must_use]
    pub fn admits(&self, distance_km: f64) -> bool {
        distance_km <= self.max_route_distance_km
            && self.duration_hours(distance_km) <= self.max_shift_hours
    }
}
