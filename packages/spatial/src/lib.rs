#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Planar geometry shared by hotspot sizing and patrol routing.
//!
//! Everything here works on a local equirectangular approximation of the
//! earth (`1° latitude ≈ 111 km`, `1° longitude ≈ 111 km × cos(lat)`), so
//! cluster areas and route lengths are computed on the same scale. The
//! [`PointIndex`] wraps an R-tree for the fixed-radius neighbor queries the
//! density clusterer issues for every point.

use geo::{Area, ConvexHull, MultiPoint, Point};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

/// Kilometers spanned by one degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, `-90..=90`.
    pub latitude: f64,
    /// Longitude in degrees, `-180..=180`.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and inside the WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    /// Euclidean distance in raw degree-space.
    ///
    /// This is the metric the density clusterer uses for `eps`.
    #[must_use]
    pub fn degree_distance(&self, other: &Self) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlon = self.longitude - other.longitude;
        dlat.hypot(dlon)
    }

    /// Equirectangular distance to `other` in kilometers.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        equirectangular_km(*self, *other)
    }
}

/// Equirectangular distance between two points in kilometers.
///
/// Longitude differences are scaled by the cosine of the mean latitude of
/// the two points.
#[must_use]
pub fn equirectangular_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let mean_lat = f64::midpoint(a.latitude, b.latitude).to_radians();
    let dy = (a.latitude - b.latitude) * KM_PER_DEGREE;
    let dx = (a.longitude - b.longitude) * KM_PER_DEGREE * mean_lat.cos();
    dx.hypot(dy)
}

/// Projects `point` onto a local kilometer plane centered at `origin`.
///
/// Returns `(x, y)` where `x` grows east and `y` grows north.
#[must_use]
pub fn project_km(point: GeoPoint, origin: GeoPoint) -> (f64, f64) {
    let x = (point.longitude - origin.longitude)
        * KM_PER_DEGREE
        * origin.latitude.to_radians().cos();
    let y = (point.latitude - origin.latitude) * KM_PER_DEGREE;
    (x, y)
}

/// Arithmetic mean of a set of points, or `None` if the set is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let (lat_sum, lon_sum) = points.iter().fold((0.0, 0.0), |(lat, lon), p| {
        (lat + p.latitude, lon + p.longitude)
    });

    Some(GeoPoint::new(lat_sum / n, lon_sum / n))
}

/// Area of the convex hull of `points` in square kilometers.
///
/// Points are projected around `origin` before the hull is built. Fewer than
/// three points, or collinear points, have zero area; callers apply their
/// own floor.
#[must_use]
pub fn hull_area_km2(points: &[GeoPoint], origin: GeoPoint) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let projected: MultiPoint<f64> = points
        .iter()
        .map(|p| {
            let (x, y) = project_km(*p, origin);
            Point::new(x, y)
        })
        .collect();

    projected.convex_hull().unsigned_area()
}

/// A point stored in the R-tree alongside its position in the input slice.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    lat: f64,
    lon: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lon])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.lat - point[0];
        let dlon = self.lon - point[1];
        dlat.mul_add(dlat, dlon * dlon)
    }
}

/// Degree-space radius index over a fixed set of points.
///
/// Built once per clustering run; queries return indices into the slice the
/// index was built from.
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
}

impl PointIndex {
    /// Bulk-loads an R-tree over `points`.
    #[must_use]
    pub fn new(points: &[GeoPoint]) -> Self {
        let entries: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedPoint {
                idx,
                lat: p.latitude,
                lon: p.longitude,
            })
            .collect();

        log::trace!("Bulk-loading point index with {} entries", entries.len());

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Indices of all points within `radius` degrees of `center`, inclusive,
    /// sorted ascending so callers see them in input order.
    #[must_use]
    pub fn within(&self, center: GeoPoint, radius: f64) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .tree
            .locate_within_distance([center.latitude, center.longitude], radius * radius)
            .map(|p| p.idx)
            .collect();
        hits.sort_unstable();
        hits
    }
}
