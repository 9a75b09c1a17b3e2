//! DBSCAN density clustering.
//!
//! A point is core when at least `min_samples` points, itself included,
//! lie within `eps` of it (Euclidean, degree-space). Clusters grow from core
//! points through chains of core neighbors; non-core neighbors join as
//! border points and never extend the cluster. Everything else is noise.
//!
//! Seeds are visited in input order, so cluster `0` is the cluster of the
//! first core point in the input, and a border point reachable from two
//! clusters stays with whichever reached it first.

use std::collections::VecDeque;

use patrol_planner_hotspot_models::{ClusterLabel, ClusterPartition};
use patrol_planner_spatial::{GeoPoint, PointIndex};

use crate::HotspotError;
use crate::config::{validate_eps, validate_min_samples};

/// Partitions `points` into density-connected clusters.
///
/// # Errors
///
/// Returns [`HotspotError::InvalidParameter`] if `eps` is not a positive
/// number or `min_samples` is zero.
pub fn cluster(
    points: &[GeoPoint],
    eps: f64,
    min_samples: u32,
) -> Result<ClusterPartition, HotspotError> {
    validate_eps(eps)?;
    validate_min_samples(min_samples)?;

    let n = points.len();
    let Expansion {
        clusters,
        peak_queue,
    } = expand(points, eps, min_samples as usize);

    let partition = ClusterPartition {
        clusters,
        point_count: n,
    };

    log::debug!(
        "DBSCAN(eps={eps}, min_samples={min_samples}) found {} clusters covering {} of {n} points \
         (queue peak {peak_queue})",
        partition.cluster_count(),
        partition.clustered_count()
    );

    Ok(partition)
}

struct Expansion {
    clusters: Vec<Vec<usize>>,
    peak_queue: usize,
}

/// Grows clusters breadth-first from each unvisited core seed.
///
/// A point is queued only when it is first claimed by a cluster, so the
/// queue never holds more than `points.len()` entries over a whole run.
/// `visited` marks points whose neighborhood has been queried; a point
/// claimed after failing its own core check is a border point and is not
/// expanded again.
fn expand(points: &[GeoPoint], eps: f64, min_samples: usize) -> Expansion {
    let n = points.len();
    let index = PointIndex::new(points);

    let mut visited = vec![false; n];
    let mut assigned: Vec<Option<usize>> = vec![None; n];
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut peak_queue = 0;

    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let neighbors = index.within(points[seed], eps);
        if neighbors.len() < min_samples {
            continue;
        }

        let cluster_id = clusters.len();
        let mut members = Vec::new();
        let mut claim = |idx: usize, queue: &mut VecDeque<usize>, members: &mut Vec<usize>| {
            if assigned[idx].is_none() {
                assigned[idx] = Some(cluster_id);
                members.push(idx);
                queue.push_back(idx);
            }
        };

        for idx in neighbors {
            claim(idx, &mut queue, &mut members);
        }
        peak_queue = peak_queue.max(queue.len());

        while let Some(idx) = queue.pop_front() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;

            let reach = index.within(points[idx], eps);
            if reach.len() >= min_samples {
                for next in reach {
                    claim(next, &mut queue, &mut members);
                }
                peak_queue = peak_queue.max(queue.len());
            }
        }

        members.sort_unstable();
        clusters.push(members);
    }

    Expansion {
        clusters,
        peak_queue,
    }
}

/// Runs [`cluster`] and returns one label per point.
///
/// # Errors
///
/// Same as [`cluster`].
pub fn cluster_labels(
    points: &[GeoPoint],
    eps: f64,
    min_samples: u32,
) -> Result<Vec<ClusterLabel>, HotspotError> {
    Ok(cluster(points, eps, min_samples)?.labels())
}

/// Rebuilds a partition from per-point labels.
///
/// Labels are renumbered densely in ascending order if there are gaps.
#[must_use]
pub fn partition_from_labels(labels: &[ClusterLabel]) -> ClusterPartition {
    let mut ids: Vec<u32> = labels
        .iter()
        .filter_map(|label| match label {
            ClusterLabel::Cluster(id) => Some(*id),
            ClusterLabel::Noise => None,
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let mut clusters = vec![Vec::new(); ids.len()];
    for (idx, label) in labels.iter().enumerate() {
        if let ClusterLabel::Cluster(id) = label
            && let Ok(pos) = ids.binary_search(id)
        {
            clusters[pos].push(idx);
        }
    }

    ClusterPartition {
        clusters,
        point_count: labels.len(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    /// `count` points on a ring of `radius` degrees around `center`.
    #[allow(clippy::cast_precision_loss)]
    fn ring(center: GeoPoint, radius: f64, count: usize) -> Vec<GeoPoint> {
        (0..count)
            .map(|i| {
                let theta = std::f64::consts::TAU * i as f64 / count as f64;
                GeoPoint::new(
                    radius.mul_add(theta.sin(), center.latitude),
                    radius.mul_add(theta.cos(), center.longitude),
                )
            })
            .collect()
    }

    fn membership(partition: &ClusterPartition) -> BTreeSet<BTreeSet<usize>> {
        partition
            .clusters
            .iter()
            .map(|c| c.iter().copied().collect())
            .collect()
    }

    #[test]
    fn tight_group_forms_one_cluster_and_scatter_is_noise() {
        let center = GeoPoint::new(41.8781, -87.6298);
        let mut points = vec![center];
        points.extend(ring(center, 0.002, 7));
        points.extend(ring(center, 0.004, 7));
        // Scattered points far from each other and from the group.
        points.extend([
            GeoPoint::new(41.95, -87.70),
            GeoPoint::new(41.80, -87.55),
            GeoPoint::new(42.00, -87.60),
            GeoPoint::new(41.75, -87.75),
            GeoPoint::new(41.90, -87.50),
        ]);

        let partition = cluster(&points, 0.01, 10).unwrap();
        assert_eq!(partition.cluster_count(), 1);

        let size = partition.clusters[0].len();
        assert!((10..=15).contains(&size), "cluster size {size}");

        let labels = partition.labels();
        for label in &labels[15..] {
            assert!(label.is_noise());
        }
    }

    #[test]
    fn every_point_gets_exactly_one_label() {
        let mut points = ring(GeoPoint::new(0.0, 0.0), 0.003, 12);
        points.extend(ring(GeoPoint::new(1.0, 1.0), 0.003, 12));
        points.push(GeoPoint::new(5.0, 5.0));

        let partition = cluster(&points, 0.01, 5).unwrap();
        assert_eq!(partition.labels().len(), points.len());

        let mut seen = vec![0_u32; points.len()];
        for members in &partition.clusters {
            for &idx in members {
                seen[idx] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count <= 1));
        assert_eq!(partition.noise(), vec![points.len() - 1]);
    }

    #[test]
    fn first_core_seed_gets_the_first_id() {
        let mut points = vec![GeoPoint::new(5.0, 5.0)];
        points.extend(ring(GeoPoint::new(1.0, 1.0), 0.003, 6));
        points.extend(ring(GeoPoint::new(0.0, 0.0), 0.003, 6));

        let labels = cluster_labels(&points, 0.01, 3).unwrap();
        assert_eq!(labels[0], ClusterLabel::Noise);
        assert_eq!(labels[1], ClusterLabel::Cluster(0));
        assert_eq!(labels[7], ClusterLabel::Cluster(1));
    }

    #[test]
    fn chains_of_core_points_merge() {
        // Evenly spaced line: each interior point has both neighbors in eps.
        let points: Vec<GeoPoint> = (0..20)
            .map(|i| GeoPoint::new(0.0, f64::from(i) * 0.005))
            .collect();
        let partition = cluster(&points, 0.006, 3).unwrap();
        assert_eq!(partition.cluster_count(), 1);
        assert_eq!(partition.clustered_count(), 20);
    }

    #[test]
    fn border_points_join_but_do_not_extend() {
        // Core blob at the origin, a border point just inside eps of it, and
        // one more point that is only within eps of the border point.
        let mut points = ring(GeoPoint::new(0.0, 0.0), 0.001, 6);
        points.push(GeoPoint::new(0.0, 0.0099));
        points.push(GeoPoint::new(0.0, 0.0189));

        let labels = cluster_labels(&points, 0.01, 6).unwrap();
        assert_eq!(labels[6], ClusterLabel::Cluster(0));
        assert_eq!(labels[7], ClusterLabel::Noise);
    }

    #[test]
    fn min_samples_of_one_makes_every_point_core() {
        let points = [GeoPoint::new(0.0, 0.0), GeoPoint::new(3.0, 3.0)];
        let partition = cluster(&points, 0.01, 1).unwrap();
        assert_eq!(partition.cluster_count(), 2);
        assert!(partition.noise().is_empty());
    }

    #[test]
    fn rerun_yields_identical_membership() {
        let mut points = ring(GeoPoint::new(0.0, 0.0), 0.004, 15);
        points.extend(ring(GeoPoint::new(0.02, 0.0), 0.004, 15));
        points.extend(ring(GeoPoint::new(0.5, 0.5), 0.02, 4));

        let first = cluster(&points, 0.01, 4).unwrap();
        let second = cluster(&points, 0.01, 4).unwrap();
        assert_eq!(membership(&first), membership(&second));
    }

    #[test]
    fn empty_input_is_an_empty_partition() {
        let partition = cluster(&[], 0.01, 10).unwrap();
        assert!(partition.is_empty());
        assert_eq!(partition.point_count, 0);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let points = [GeoPoint::new(0.0, 0.0)];
        assert!(matches!(
            cluster(&points, 0.01, 0),
            Err(HotspotError::InvalidParameter {
                name: "min_samples",
                ..
            })
        ));
        assert!(matches!(
            cluster(&points, 0.0, 5),
            Err(HotspotError::InvalidParameter { name: "eps", .. })
        ));
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn dense_blob_queues_each_point_once() {
        // 3600 points on a 60x60 grid inside a 0.0036° square: every point
        // is within eps of every other, so all of them are core.
        let points: Vec<GeoPoint> = (0..3600)
            .map(|i| {
                GeoPoint::new(
                    41.88 + (i / 60) as f64 * 0.00006,
                    -87.63 + (i % 60) as f64 * 0.00006,
                )
            })
            .collect();

        let expansion = expand(&points, 0.01, 10);
        assert_eq!(expansion.clusters.len(), 1);
        assert_eq!(expansion.clusters[0].len(), points.len());
        assert!(
            expansion.peak_queue <= points.len(),
            "queue peaked at {}",
            expansion.peak_queue
        );
    }

    #[test]
    fn noise_seed_becomes_border_when_reached_later() {
        // Point 0 is checked first and is not core; the blob seeded later
        // still claims it as a border point.
        let mut points = vec![GeoPoint::new(0.0, 0.0095)];
        points.extend(ring(GeoPoint::new(0.0, 0.0), 0.001, 6));

        let labels = cluster_labels(&points, 0.01, 6).unwrap();
        assert_eq!(labels[0], ClusterLabel::Cluster(0));
        assert!(labels[1..].iter().all(|l| *l == ClusterLabel::Cluster(0)));
    }

    #[test]
    fn partition_round_trips_through_labels() {
        let labels = vec![
            ClusterLabel::Cluster(2),
            ClusterLabel::Noise,
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(2),
        ];
        let partition = partition_from_labels(&labels);
        assert_eq!(partition.clusters, vec![vec![2], vec![0, 3]]);
        assert_eq!(partition.point_count, 4);
    }
}
