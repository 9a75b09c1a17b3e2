//! Single-pass greedy allocation.
//!
//! Stops are ranked by priority (descending), then density (descending),
//! then cluster id (ascending), with input order as the final tie-break.
//! Each stop in rank order is tried on every officer's current route; among
//! the officers whose route would still respect both caps, the stop goes to
//! the best one per [`OfficerSelection`], with lower officer ids winning
//! exact ties. A stop no officer can take is dropped into the unassigned
//! list. Nothing is revisited once placed.

use std::cmp::Ordering;

use patrol_planner_route_models::{PatrolRoute, PatrolTarget, RouteAllocation};
use patrol_planner_spatial::GeoPoint;

use crate::RouteError;
use crate::config::{InsertionStrategy, OfficerSelection, RouteConstraints};

/// Closed-tour length in kilometers: depot, each stop in order, depot.
///
/// An empty tour has length zero.
#[must_use]
pub fn tour_length_km(depot: GeoPoint, stops: &[GeoPoint]) -> f64 {
    tour_length_iter(depot, stops.iter().copied())
}

fn tour_length_iter(depot: GeoPoint, stops: impl IntoIterator<Item = GeoPoint>) -> f64 {
    let mut total = 0.0;
    let mut previous = depot;
    for stop in stops {
        total += previous.distance_km(&stop);
        previous = stop;
    }
    total + previous.distance_km(&depot)
}

/// Tour length if `stop` were inserted before index `position`.
fn tour_length_with(depot: GeoPoint, stops: &[GeoPoint], position: usize, stop: GeoPoint) -> f64 {
    let sequence = stops[..position]
        .iter()
        .copied()
        .chain(std::iter::once(stop))
        .chain(stops[position..].iter().copied());
    tour_length_iter(depot, sequence)
}

/// Indices of `targets` in allocation order.
#[must_use]
pub fn rank<T: PatrolTarget>(targets: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..targets.len()).collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (&targets[a], &targets[b]);
        b.priority()
            .total_cmp(&a.priority())
            .then_with(|| b.density().total_cmp(&a.density()))
            .then_with(|| a.cluster_id().cmp(&b.cluster_id()))
    });
    order
}

#[derive(Default)]
struct OfficerRoute {
    stops: Vec<usize>,
    locations: Vec<GeoPoint>,
    total_km: f64,
}

#[derive(Clone, Copy)]
struct Candidate {
    officer: usize,
    position: usize,
    total_km: f64,
    increase_km: f64,
}

impl Candidate {
    fn beats(&self, other: &Self, selection: OfficerSelection) -> bool {
        let ordering = match selection {
            OfficerSelection::ShortestRoute => self
                .total_km
                .total_cmp(&other.total_km)
                .then_with(|| self.increase_km.total_cmp(&other.increase_km)),
            OfficerSelection::SmallestIncrease => {
                self.increase_km.total_cmp(&other.increase_km)
            }
        };
        ordering.then_with(|| self.officer.cmp(&other.officer)) == Ordering::Less
    }
}

impl OfficerRoute {
    /// Cheapest feasible insertion of `stop` into this route, if any.
    fn best_insertion(
        &self,
        officer: usize,
        depot: GeoPoint,
        stop: GeoPoint,
        constraints: &RouteConstraints,
    ) -> Option<Candidate> {
        let positions = match constraints.insertion {
            InsertionStrategy::Tail => self.locations.len()..=self.locations.len(),
            InsertionStrategy::Cheapest => 0..=self.locations.len(),
        };

        let mut best: Option<Candidate> = None;
        for position in positions {
            let total_km = tour_length_with(depot, &self.locations, position, stop);
            if !constraints.admits(total_km) {
                continue;
            }
            let candidate = Candidate {
                officer,
                position,
                total_km,
                increase_km: total_km - self.total_km,
            };
            if best.is_none_or(|current| candidate.increase_km < current.increase_km) {
                best = Some(candidate);
            }
        }
        best
    }

    fn insert(&mut self, candidate: Candidate, target: usize, stop: GeoPoint) {
        self.stops.insert(candidate.position, target);
        self.locations.insert(candidate.position, stop);
        self.total_km = candidate.total_km;
    }
}

/// Allocates `targets` across `num_officers` routes from `depot`.
///
/// Zero officers yields no routes and every target unassigned. Zero targets
/// yields `num_officers` empty routes.
///
/// # Errors
///
/// Returns [`RouteError::InvalidParameter`] if `constraints` are out of
/// range or `depot` is not a valid coordinate.
pub fn optimize<T: PatrolTarget + Clone>(
    targets: &[T],
    num_officers: u32,
    depot: GeoPoint,
    constraints: &RouteConstraints,
) -> Result<RouteAllocation<T>, RouteError> {
    constraints.validate()?;
    if !depot.is_valid() {
        return Err(RouteError::invalid(
            "depot",
            format!(
                "invalid coordinate ({}, {})",
                depot.latitude, depot.longitude
            ),
        ));
    }

    let order = rank(targets);

    if num_officers == 0 {
        log::warn!("No officers available; {} hotspots unassigned", targets.len());
        return Ok(RouteAllocation {
            routes: Vec::new(),
            unassigned: order.iter().map(|&idx| targets[idx].clone()).collect(),
        });
    }

    let mut officers: Vec<OfficerRoute> = (0..num_officers)
        .map(|_| OfficerRoute::default())
        .collect();
    let mut unassigned: Vec<usize> = Vec::new();

    for idx in order {
        let stop = targets[idx].location();
        if !stop.is_valid() {
            log::warn!(
                "Hotspot {} has an invalid location, skipping",
                targets[idx].cluster_id()
            );
            unassigned.push(idx);
            continue;
        }

        let mut best: Option<Candidate> = None;
        for (officer, route) in officers.iter().enumerate() {
            if let Some(candidate) = route.best_insertion(officer, depot, stop, constraints)
                && best.is_none_or(|current| candidate.beats(&current, constraints.selection))
            {
                best = Some(candidate);
            }
        }

        match best {
            Some(candidate) => {
                log::trace!(
                    "Hotspot {} -> officer {} at position {} ({:.3} km)",
                    targets[idx].cluster_id(),
                    candidate.officer,
                    candidate.position,
                    candidate.total_km
                );
                officers[candidate.officer].insert(candidate, idx, stop);
            }
            None => {
                log::debug!(
                    "Hotspot {} fits no officer within {} km / {} h",
                    targets[idx].cluster_id(),
                    constraints.max_route_distance_km,
                    constraints.max_shift_hours
                );
                unassigned.push(idx);
            }
        }
    }

    let routes: Vec<PatrolRoute<T>> = officers
        .into_iter()
        .zip(0..num_officers)
        .map(|(route, officer_id)| {
            let total_distance_km = tour_length_km(depot, &route.locations);
            PatrolRoute {
                officer_id,
                hotspots: route.stops.iter().map(|&idx| targets[idx].clone()).collect(),
                total_distance_km,
                estimated_duration_hours: constraints.duration_hours(total_distance_km),
            }
        })
        .collect();

    let allocation = RouteAllocation {
        routes,
        unassigned: unassigned.iter().map(|&idx| targets[idx].clone()).collect(),
    };

    if allocation.unassigned_count() > 0 {
        log::warn!(
            "{} of {} hotspots could not be assigned within the route caps",
            allocation.unassigned_count(),
            targets.len()
        );
    }
    log::info!(
        "Assigned {} hotspots to {num_officers} officers ({:.1} km total)",
        allocation.assigned_count(),
        allocation.total_distance_km()
    );

    Ok(allocation)
}
