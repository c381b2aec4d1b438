use std::collections::{HashSet, VecDeque};

use dashmap::DashSet;
use uuid::Uuid;
use vanet_core::{Location, NeighborMap, SimulationConfig, TrafficSummary, VehicleSnapshot};

use crate::cache::{route_key, RouteCache};
use crate::error::RoutingError;
use crate::route::Path;
use crate::scoring::{LinkWeights, RouteScore, RouteWeights};
use crate::strategy::{validate_request, RoutingAlgorithm, RoutingStrategy};

/// On-demand breadth-first route discovery.
///
/// On a cache miss the strategy floods outward from the source over the
/// "within V2V range" graph of the current snapshot. A single visited set
/// keyed by rounded location is shared by the whole flood, so only the first
/// branch to reach a location survives. Every branch whose frontier comes
/// within range of the destination becomes a candidate, and the candidate
/// with the best [`RouteScore`] wins.
///
/// Cached paths are revalidated against the snapshot on every lookup and
/// dropped once any link has lost its relay.
pub struct FloodDiscoveryStrategy {
    config: SimulationConfig,
    route_weights: RouteWeights,
    link_weights: LinkWeights,
    cache: RouteCache,
    discoveries: DashSet<Uuid>,
}

impl FloodDiscoveryStrategy {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            route_weights: RouteWeights::default(),
            link_weights: LinkWeights::default(),
            cache: RouteCache::new(),
            discoveries: DashSet::new(),
        }
    }

    /// Number of discovery ids held in the dedup buffer.
    pub fn discovery_ids(&self) -> usize {
        self.discoveries.len()
    }

    pub fn has_seen_discovery(&self, id: &Uuid) -> bool {
        self.discoveries.contains(id)
    }

    /// Register a new discovery round and return its id.
    pub fn begin_discovery(&self) -> Uuid {
        let id = Uuid::now_v7();
        self.discoveries.insert(id);
        id
    }

    /// A cached path is still usable if, for every link, some vehicle in the
    /// snapshot is within range of both ends.
    ///
    /// This also applies to a one-link path found because the source was
    /// already in range of the destination: with no vehicle covering both
    /// ends it is dropped on every lookup and rediscovered.
    pub fn is_route_valid(&self, path: &Path, neighbors: &NeighborMap) -> bool {
        let range = self.config.network.max_v2v_range;
        path.links().all(|(a, b)| {
            neighbors
                .snapshots()
                .any(|s| s.location.is_within(a, range) && s.location.is_within(b, range))
        })
    }

    /// Every candidate route the flood reaches, in discovery order.
    pub fn discover_routes(
        &self,
        source: &Location,
        destination: &Location,
        neighbors: &NeighborMap,
    ) -> Vec<Path> {
        let range = self.config.network.max_v2v_range;

        let mut candidates = Vec::new();
        let mut visited = HashSet::from([source.key()]);
        let mut queue = VecDeque::from([(*source, vec![*source])]);

        while let Some((current, trail)) = queue.pop_front() {
            if current.is_within(destination, range) {
                let mut waypoints = trail;
                waypoints.push(*destination);
                candidates.push(Path::assembled(waypoints));
                continue;
            }

            for snapshot in neighbors.within_range(&current, range) {
                // Marked on enqueue: the first branch to see a location owns it.
                if !visited.insert(snapshot.location.key()) {
                    continue;
                }
                let mut next_trail = trail.clone();
                next_trail.push(snapshot.location);
                queue.push_back((snapshot.location, next_trail));
            }
        }

        candidates
    }

    /// Score a path against the snapshot.
    ///
    /// Each link's stability uses the vehicles nearest to its two ends. The
    /// route's stability is that of its weakest link, or zero when no link
    /// can be scored.
    pub fn score_route(&self, path: &Path, neighbors: &NeighborMap) -> RouteScore {
        let range = self.config.network.max_v2v_range;
        let vehicles = &self.config.vehicles;

        let weakest = path
            .links()
            .filter_map(|(a, b)| {
                let near_a = nearest_vehicle(a, neighbors)?;
                let near_b = nearest_vehicle(b, neighbors)?;
                Some(self.link_weights.stability(
                    vehicles.normalized_speed(near_a.speed),
                    vehicles.normalized_speed(near_b.speed),
                    a.distance_to(b),
                    range,
                ))
            })
            .reduce(f64::min)
            .unwrap_or(0.0);

        RouteScore::compute(path.hop_count(), weakest, &self.route_weights)
    }

    fn select_best(&self, candidates: Vec<Path>, neighbors: &NeighborMap) -> Option<Path> {
        let mut best: Option<(RouteScore, Path)> = None;
        for path in candidates {
            let score = self.score_route(&path, neighbors);
            if best.as_ref().map_or(true, |(top, _)| score.value > top.value) {
                best = Some((score, path));
            }
        }
        best.map(|(_, path)| path)
    }
}

fn nearest_vehicle<'a>(
    location: &Location,
    neighbors: &'a NeighborMap,
) -> Option<&'a VehicleSnapshot> {
    let mut nearest: Option<(f64, &VehicleSnapshot)> = None;
    for snapshot in neighbors.snapshots() {
        let distance = location.distance_to(&snapshot.location);
        if nearest.map_or(true, |(closest, _)| distance < closest) {
            nearest = Some((distance, snapshot));
        }
    }
    nearest.map(|(_, snapshot)| snapshot)
}

impl RoutingStrategy for FloodDiscoveryStrategy {
    fn algorithm(&self) -> RoutingAlgorithm {
        RoutingAlgorithm::FloodDiscovery
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
        if let Some(path) = self
            .cache
            .get_valid(&key, |path| self.is_route_valid(path, neighbors))
        {
            tracing::trace!(key = %key, "flood route cache hit");
            return Ok(path);
        }

        let discovery_id = self.begin_discovery();

        let candidates = self.discover_routes(source, destination, neighbors);
        let found = candidates.len();

        match self.select_best(candidates, neighbors) {
            Some(path) => {
                tracing::debug!(
                    key = %key,
                    %discovery_id,
                    candidates = found,
                    hops = path.hop_count(),
                    "flood route discovered"
                );
                self.cache.put(key, path.clone());
                Ok(path)
            }
            None => {
                tracing::debug!(key = %key, %discovery_id, "flood found no route, using direct path");
                Ok(Path::direct(*source, *destination))
            }
        }
    }

    /// Flood discovery keeps no traffic-dependent state.
    fn update_traffic(&self, _traffic: &TrafficSummary) {}

    fn cleanup_old_entries(&self) {
        let routes = self.cache.clear();
        let discoveries = self.discoveries.len();
        self.discoveries.clear();
        tracing::debug!(routes, discoveries, "flood discovery state cleared");
    }

    fn cache(&self) -> &RouteCache {
        &self.cache
    }
}
