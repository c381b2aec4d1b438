use vanet_core::{Location, NeighborMap, SimulationConfig, TrafficSummary};

use crate::cache::{route_key, RouteCache};
use crate::error::RoutingError;
use crate::route::Path;
use crate::scoring::{direction_progress, local_density, HopWeights, JunctionWeights};
use crate::strategy::{
    best_forward_hop, evict_if_oversized, validate_request, RoutingAlgorithm, RoutingStrategy,
};

/// Greedy forwarding anchored on a virtual junction grid.
///
/// Junctions sit on a fixed grid (`junction_spacing` apart) over the network
/// rectangle. From the current position the strategy picks the in-range
/// junction with the best mix of direction progress, local vehicle density
/// and low congestion, relays vehicle to vehicle toward it, and repeats from
/// the junction until the destination is within the proximity threshold.
pub struct JunctionStrategy {
    config: SimulationConfig,
    junction_weights: JunctionWeights,
    hop_weights: HopWeights,
    cache: RouteCache,
}

impl JunctionStrategy {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            junction_weights: JunctionWeights::default(),
            hop_weights: HopWeights::toward_junction(),
            cache: RouteCache::new(),
        }
    }

    /// Grid junctions within V2V range of `location`.
    pub fn junctions_near(&self, location: &Location) -> Vec<Location> {
        let spacing = self.config.routing.junction_spacing;
        let range = self.config.network.max_v2v_range;
        if spacing <= 0.0 {
            return Vec::new();
        }

        let axis = |extent: f64| {
            (0..)
                .map(move |i| i as f64 * spacing)
                .take_while(move |coord| *coord < extent)
        };

        axis(self.config.network.length)
            .flat_map(|x| axis(self.config.network.width).map(move |y| Location::new(x, y)))
            .filter(|junction| junction.is_within(location, range))
            .collect()
    }

    /// Best in-range junction that makes strictly positive progress toward
    /// `destination`.
    fn next_junction(
        &self,
        current: &Location,
        destination: &Location,
        neighbors: &NeighborMap,
        traffic: &TrafficSummary,
    ) -> Option<Location> {
        let range = self.config.network.max_v2v_range;
        let mut best: Option<(f64, Location)> = None;

        for junction in self.junctions_near(current) {
            let direction = direction_progress(current, &junction, destination);
            if direction <= 0.0 {
                continue;
            }
            let density = local_density(&junction, neighbors, range, &self.config.vehicles);
            let score = self
                .junction_weights
                .score(direction, density, traffic.congestion_level);
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, junction));
            }
        }

        best.map(|(_, junction)| junction)
    }

    /// Relay positions from `start` toward `junction`, excluding `start`
    /// itself and the junction.
    fn relays_toward(
        &self,
        start: &Location,
        junction: &Location,
        neighbors: &NeighborMap,
    ) -> Vec<Location> {
        let proximity = self.config.routing.proximity_threshold;
        let range = self.config.network.max_v2v_range;

        let mut relays = Vec::new();
        let mut current = *start;
        while current.distance_to(junction) > proximity {
            let next = best_forward_hop(
                &current,
                junction,
                neighbors,
                range,
                &self.config.vehicles,
                &self.hop_weights,
                0.0,
            );
            let Some(hop) = next else {
                break;
            };
            relays.push(hop);
            current = hop;
        }
        relays
    }

    fn compute_route(
        &self,
        source: &Location,
        destination: &Location,
        neighbors: &NeighborMap,
        traffic: &TrafficSummary,
    ) -> Path {
        let proximity = self.config.routing.proximity_threshold;

        let mut current = *source;
        let mut waypoints = vec![current];

        // Each chosen junction is strictly closer to the destination than the
        // position it was chosen from, so the loop terminates.
        while current.distance_to(destination) > proximity {
            let Some(junction) = self.next_junction(&current, destination, neighbors, traffic)
            else {
                tracing::trace!(%current, %destination, "no junction makes progress");
                break;
            };
            waypoints.extend(self.relays_toward(&current, &junction, neighbors));
            waypoints.push(junction);
            current = junction;
        }

        waypoints.push(*destination);
        Path::assembled(waypoints)
    }
}

impl RoutingStrategy for JunctionStrategy {
    fn algorithm(&self) -> RoutingAlgorithm {
        RoutingAlgorithm::JunctionGreedy
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
            tracing::trace!(key = %key, "junction route cache hit");
            return Ok(path);
        }

        let path = self.compute_route(source, destination, neighbors, traffic);
        tracing::debug!(
            key = %key,
            hops = path.hop_count(),
            neighbors = neighbors.len(),
            "junction route computed"
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
