#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Request and response types for hotspot detection and patrol routing.
//!
//! These are the JSON shapes exchanged with the API and dashboard layers.
//! They are kept separate from the detection and routing types so the wire
//! contract can stay fixed while the internals evolve. Field names are
//! `snake_case` on the wire.

use patrol_planner_hotspot_models::Hotspot;
use patrol_planner_route_models::{PatrolRoute, PatrolTarget};
use patrol_planner_spatial::GeoPoint;
use serde::{Deserialize, Serialize};

const fn default_eps() -> f64 {
    0.01
}

const fn default_min_samples() -> u32 {
    10
}

const fn default_max_route_distance_km() -> f64 {
    50.0
}

const fn default_priority() -> f64 {
    1.0
}

/// Parameters for a hotspot detection request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRequest {
    /// Neighborhood radius in degrees.
    #[serde(default = "default_eps")]
    pub eps: f64,
    /// Minimum neighborhood size for a core point.
    #[serde(default = "default_min_samples")]
    pub min_samples: u32,
    /// Only report hotspots seen on at least this many days.
    #[serde(default)]
    pub min_days: Option<u32>,
}

impl Default for HotspotRequest {
    fn default() -> Self {
        Self {
            eps: default_eps(),
            min_samples: default_min_samples(),
            min_days: None,
        }
    }
}

/// One detected hotspot as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotResponse {
    /// Cluster id within this detection run.
    pub cluster_id: i64,
    /// Centroid latitude.
    pub center_latitude: f64,
    /// Centroid longitude.
    pub center_longitude: f64,
    /// Member incident count.
    pub n_incidents: u32,
    /// Incidents per square kilometer.
    pub density_per_km2: f64,
    /// Cluster area in square kilometers.
    pub area_km2: f64,
}

impl From<&Hotspot> for HotspotResponse {
    fn from(hotspot: &Hotspot) -> Self {
        Self {
            cluster_id: hotspot.cluster_id,
            center_latitude: hotspot.center_lat,
            center_longitude: hotspot.center_lon,
            n_incidents: hotspot.n_incidents,
            density_per_km2: hotspot.density_per_km2,
            area_km2: hotspot.area_km2,
        }
    }
}

/// A stop supplied by the caller of the routing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHotspotInput {
    /// Id echoed back in `hotspot_ids`.
    #[serde(default)]
    pub cluster_id: i64,
    /// Stop latitude.
    pub latitude: f64,
    /// Stop longitude.
    pub longitude: f64,
    /// Allocation weight; `1.0` when omitted.
    #[serde(default)]
    pub priority: Option<f64>,
    /// Density used for tie-breaking; `0.0` when omitted.
    #[serde(default)]
    pub density: Option<f64>,
}

impl PatrolTarget for RouteHotspotInput {
    fn cluster_id(&self) -> i64 {
        self.cluster_id
    }

    fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    fn priority(&self) -> f64 {
        self.priority.unwrap_or_else(default_priority)
    }

    fn density(&self) -> f64 {
        self.density.unwrap_or(0.0)
    }
}

impl From<&Hotspot> for RouteHotspotInput {
    fn from(hotspot: &Hotspot) -> Self {
        Self {
            cluster_id: hotspot.cluster_id,
            latitude: hotspot.center_lat,
            longitude: hotspot.center_lon,
            priority: Some(hotspot.priority),
            density: Some(hotspot.density_per_km2),
        }
    }
}

/// Parameters for a patrol routing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Stops to allocate.
    pub hotspots: Vec<RouteHotspotInput>,
    /// Number of officers available.
    pub num_officers: u32,
    /// Depot latitude.
    pub depot_latitude: f64,
    /// Depot longitude.
    pub depot_longitude: f64,
    /// Per-route distance cap in kilometers.
    #[serde(default = "default_max_route_distance_km")]
    pub max_route_distance_km: f64,
}

impl RouteRequest {
    /// Depot as a [`GeoPoint`].
    #[must_use]
    pub const fn depot(&self) -> GeoPoint {
        GeoPoint::new(self.depot_latitude, self.depot_longitude)
    }
}

/// One officer's route as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    /// Officer index.
    pub officer_id: u32,
    /// Stop ids in visiting order.
    pub hotspot_ids: Vec<i64>,
    /// Closed-tour length in kilometers.
    pub total_distance_km: f64,
    /// Estimated route duration in hours.
    pub estimated_duration_hours: f64,
}

impl<T: PatrolTarget> From<&PatrolRoute<T>> for RouteResponse {
    fn from(route: &PatrolRoute<T>) -> Self {
        Self {
            officer_id: route.officer_id,
            hotspot_ids: route.hotspot_ids(),
            total_distance_km: route.total_distance_km,
            estimated_duration_hours: route.estimated_duration_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use patrol_planner_hotspot_models::RiskLevel;

    use super::*;

    #[test]
    fn hotspot_request_defaults() {
        let request: HotspotRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, HotspotRequest::default());

        let request: HotspotRequest =
            serde_json::from_str(r#"{"eps": 0.02, "min_days": 5}"#).unwrap();
        assert!((request.eps - 0.02).abs() < f64::EPSILON);
        assert_eq!(request.min_samples, 10);
        assert_eq!(request.min_days, Some(5));
    }

    #[test]
    fn route_request_defaults() {
        let request: RouteRequest = serde_json::from_str(
            r#"{
                "hotspots": [
                    {"latitude": 41.88, "longitude": -87.63},
                    {"cluster_id": 7, "latitude": 41.9, "longitude": -87.65, "priority": 0.5, "density": 12.0}
                ],
                "num_officers": 2,
                "depot_latitude": 41.8781,
                "depot_longitude": -87.6298
            }"#,
        )
        .unwrap();

        assert!((request.max_route_distance_km - 50.0).abs() < f64::EPSILON);
        assert_eq!(request.depot(), GeoPoint::new(41.8781, -87.6298));

        let first = &request.hotspots[0];
        assert_eq!(PatrolTarget::cluster_id(first), 0);
        assert!((PatrolTarget::priority(first) - 1.0).abs() < f64::EPSILON);
        assert!(PatrolTarget::density(first).abs() < f64::EPSILON);

        let second = &request.hotspots[1];
        assert_eq!(PatrolTarget::cluster_id(second), 7);
        assert!((PatrolTarget::priority(second) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn hotspot_response_field_names() {
        let hotspot = Hotspot {
            cluster_id: 3,
            center_lat: 41.88,
            center_lon: -87.63,
            n_incidents: 20,
            area_km2: 0.5,
            density_per_km2: 40.0,
            priority: 0.4,
            risk_level: RiskLevel::Critical,
        };
        let json = serde_json::to_value(HotspotResponse::from(&hotspot)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "cluster_id": 3,
                "center_latitude": 41.88,
                "center_longitude": -87.63,
                "n_incidents": 20,
                "density_per_km2": 40.0,
                "area_km2": 0.5
            })
        );
    }

    #[test]
    fn route_response_lists_ids_in_order() {
        let route = PatrolRoute {
            officer_id: 1,
            hotspots: vec![
                RouteHotspotInput {
                    cluster_id: 9,
                    latitude: 0.0,
                    longitude: 0.0,
                    priority: None,
                    density: None,
                },
                RouteHotspotInput {
                    cluster_id: 4,
                    latitude: 0.0,
                    longitude: 0.0,
                    priority: None,
                    density: None,
                },
            ],
            total_distance_km: 12.5,
            estimated_duration_hours: 12.5 / 30.0,
        };
        let response = RouteResponse::from(&route);
        assert_eq!(response.officer_id, 1);
        assert_eq!(response.hotspot_ids, vec![9, 4]);
    }
}
