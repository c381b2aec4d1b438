use vanet_core::{Location, NeighborMap, SimulationConfig, TrafficSummary};

use crate::cache::{route_key, RouteCache};
use crate::error::RoutingError;
use crate::route::Path;
use crate::scoring::HopWeights;
use crate::strategy::{
    best_forward_hop, evict_if_oversized, validate_request, RoutingAlgorithm, RoutingStrategy,
};

/// Traffic-aware greedy forwarding.
///
/// Each step moves to the in-range vehicle that maximizes
/// `0.5 * progress + 0.3 * normalized_speed + 0.2 * (1 - congestion)` among
/// those strictly closer to the destination. Stops within the proximity
/// threshold of the destination, or as soon as no vehicle makes progress,
/// and then appends the destination itself.
pub struct GreedyForwardStrategy {
    config: SimulationConfig,
    weights: HopWeights,
    cache: RouteCache,
}

impl GreedyForwardStrategy {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_weights(config, HopWeights::greedy())
    }

    pub fn with_weights(config: SimulationConfig, weights: HopWeights) -> Self {
        Self {
            config,
            weights,
            cache: RouteCache::new(),
        }
    }

    fn compute_route(
        &self,
        source: &Location,
        destination: &Location,
        neighbors: &NeighborMap,
        traffic: &TrafficSummary,
    ) -> Path {
        let proximity = self.config.routing.proximity_threshold;
        let range = self.config.network.max_v2v_range;

        let mut current = *source;
        let mut waypoints = vec![current];

        // Every accepted hop strictly reduces the remaining distance, so
        // this terminates.
        while current.distance_to(destination) > proximity {
            let next = best_forward_hop(
                &current,
                destination,
                neighbors,
                range,
                &self.config.vehicles,
                &self.weights,
                traffic.congestion_level,
            );
            match next {
                Some(hop) => {
                    waypoints.push(hop);
                    current = hop;
                }
                None => {
                    tracing::trace!(%current, %destination, "no forward progress candidate");
                    break;
                }
            }
        }

        waypoints.push(*destination);
        Path::assembled(waypoints)
    }
}

impl RoutingStrategy for GreedyForwardStrategy {
    fn algorithm(&self) -> RoutingAlgorithm {
        RoutingAlgorithm::GreedyForward
    }

    fn find_route(
        &self,
        source: &Location,
        destination: &Location,
        neighbors: &NeighborMap,
        traffic: &TrafficSummary,
    ) -> Result<Path, RoutingError> {
        validate_request(source, destination, neighbors, traffic)?;

        let key = route_key(source, destination);
        if let Some(path) = self.cache.get(&key) {
            tracing::trace!(key = %key, "greedy route cache hit");
            return Ok(path);
        }

        let path = self.compute_route(source, destination, neighbors, traffic);
        tracing::debug!(
            key = %key,
            hops = path.hop_count(),
            neighbors = neighbors.len(),
            "greedy route computed"
        );
        self.cache.put(key, path.clone());
        Ok(path)
    }

    fn update_traffic(&self, _traffic: &TrafficSummary) {
        evict_if_oversized(
            &self.cache,
            self.config.routing.cache_capacity,
            self.algorithm(),
        );
    }

    fn cleanup_old_entries(&self) {
        evict_if_oversized(
            &self.cache,
            self.config.routing.cache_capacity,
            self.algorithm(),
        );
    }

    fn cache(&self) -> &RouteCache {
        &self.cache
    }
}
