use std::fmt;
use std::str::FromStr;

use vanet_core::{Location, NeighborMap, SimulationConfig, TrafficSummary, VehicleConfig};

use crate::cache::RouteCache;
use crate::error::RoutingError;
use crate::flood::FloodDiscoveryStrategy;
use crate::greedy::GreedyForwardStrategy;
use crate::junction::JunctionStrategy;
use crate::route::Path;
use crate::scoring::{forward_progress, HopWeights};

/// Common interface of every path-selection algorithm.
///
/// Route discovery is read-only over the supplied neighbor snapshot and may
/// run concurrently from many callers. Only the strategy's own cache is
/// mutated, and that cache is internally synchronized.
pub trait RoutingStrategy: Send + Sync {
    /// Which algorithm this is.
    fn algorithm(&self) -> RoutingAlgorithm;

    /// Find a path from `source` to `destination`.
    ///
    /// Never fails for lack of a route: the worst case is the direct
    /// two-point path. Errors are reserved for malformed input.
    fn find_route(
        &self,
        source: &Location,
        destination: &Location,
        neighbors: &NeighborMap,
        traffic: &TrafficSummary,
    ) -> Result<Path, RoutingError>;

    /// Externally triggered traffic-update hook.
    fn update_traffic(&self, traffic: &TrafficSummary);

    /// Externally triggered periodic maintenance.
    fn cleanup_old_entries(&self);

    /// The strategy's path cache.
    fn cache(&self) -> &RouteCache;
}

/// The available routing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingAlgorithm {
    /// Traffic-aware greedy forward progress.
    GreedyForward,
    /// Greedy forwarding anchored on a virtual junction grid.
    JunctionGreedy,
    /// On-demand breadth-first route discovery.
    FloodDiscovery,
}

impl RoutingAlgorithm {
    pub const ALL: [RoutingAlgorithm; 3] = [
        RoutingAlgorithm::GreedyForward,
        RoutingAlgorithm::JunctionGreedy,
        RoutingAlgorithm::FloodDiscovery,
    ];

    /// Pick an algorithm for a network of `vehicle_count` vehicles.
    ///
    /// Sparse networks (11 to 30 vehicles) use flood discovery, medium ones
    /// (31 to 60) use the junction grid, everything else greedy forwarding.
    pub fn auto_select(vehicle_count: usize) -> Self {
        match vehicle_count {
            11..=30 => RoutingAlgorithm::FloodDiscovery,
            31..=60 => RoutingAlgorithm::JunctionGreedy,
            _ => RoutingAlgorithm::GreedyForward,
        }
    }

    /// Construct a fresh strategy instance with an empty cache.
    pub fn build(self, config: &SimulationConfig) -> Box<dyn RoutingStrategy> {
        match self {
            RoutingAlgorithm::GreedyForward => Box::new(GreedyForwardStrategy::new(config.clone())),
            RoutingAlgorithm::JunctionGreedy => Box::new(JunctionStrategy::new(config.clone())),
            RoutingAlgorithm::FloodDiscovery => {
                Box::new(FloodDiscoveryStrategy::new(config.clone()))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoutingAlgorithm::GreedyForward => "greedy",
            RoutingAlgorithm::JunctionGreedy => "junction",
            RoutingAlgorithm::FloodDiscovery => "flood",
        }
    }
}

impl fmt::Display for RoutingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoutingAlgorithm {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" | "tmr" => Ok(RoutingAlgorithm::GreedyForward),
            "junction" | "gytar" => Ok(RoutingAlgorithm::JunctionGreedy),
            "flood" | "aodv" => Ok(RoutingAlgorithm::FloodDiscovery),
            other => Err(RoutingError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Fail fast on malformed caller input.
pub(crate) fn validate_request(
    source: &Location,
    destination: &Location,
    neighbors: &NeighborMap,
    traffic: &TrafficSummary,
) -> Result<(), RoutingError> {
    source.validate()?;
    destination.validate()?;
    neighbors.validate()?;
    traffic.validate()?;
    Ok(())
}

/// Best next relay from `current` toward `target`.
///
/// Only vehicles within `range` of `current` that make strictly positive
/// progress toward `target` are considered. Ties keep the first candidate in
/// vehicle-id order.
pub(crate) fn best_forward_hop(
    current: &Location,
    target: &Location,
    neighbors: &NeighborMap,
    range: f64,
    vehicles: &VehicleConfig,
    weights: &HopWeights,
    congestion_level: f64,
) -> Option<Location> {
    let mut best: Option<(f64, Location)> = None;
    for snapshot in neighbors.within_range(current, range) {
        let Some(progress) = forward_progress(current, &snapshot.location, target) else {
            continue;
        };
        let score = weights.score(
            progress,
            vehicles.normalized_speed(snapshot.speed),
            congestion_level,
        );
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, snapshot.location));
        }
    }
    best.map(|(_, location)| location)
}

/// Wipe `cache` if it holds more than `capacity` entries.
pub(crate) fn evict_if_oversized(
    cache: &RouteCache,
    capacity: usize,
    algorithm: RoutingAlgorithm,
) {
    let len = cache.len();
    if len > capacity {
        cache.clear();
        tracing::debug!(%algorithm, entries = len, capacity, "route cache over capacity, cleared");
    }
}
