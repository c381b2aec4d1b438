//! Property-based tests for the routing strategies.
//!
//! - Every returned path starts at the source and ends at the destination
//! - All links except the final one stay within V2V range
//! - Flood discovery returns the best-scoring discoverable candidate
//! - Repeated identical requests are served from the cache

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use vanet_core::{Location, NeighborMap, SimulationConfig, TrafficSummary, VehicleSnapshot};

use crate::{FloodDiscoveryStrategy, RoutingAlgorithm, RoutingStrategy};

fn arb_location() -> impl Strategy<Value = Location> {
    (0.0f64..3000.0, 0.0f64..3000.0).prop_map(|(x, y)| Location::new(x, y))
}

fn arb_neighbors() -> impl Strategy<Value = NeighborMap> {
    prop::collection::vec((arb_location(), 40.0f64..140.0), 0..40).prop_map(|vehicles| {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        vehicles
            .into_iter()
            .enumerate()
            .map(|(i, (location, speed))| {
                VehicleSnapshot::new(format!("v{i:03}"), location, speed, 0.0, ts)
            })
            .collect()
    })
}

fn arb_traffic() -> impl Strategy<Value = TrafficSummary> {
    (0usize..100, 0.0f64..120.0, 0.0f64..=1.0)
        .prop_map(|(count, speed, congestion)| TrafficSummary::new(count, speed, congestion))
}

// ==================== Path Shape Property Tests ====================

proptest! {
    /// Every strategy returns a path that respects the range limit on every
    /// link except the last.
    #[test]
    fn paths_respect_range(
        source in arb_location(),
        destination in arb_location(),
        neighbors in arb_neighbors(),
        traffic in arb_traffic(),
    ) {
        let config = SimulationConfig::default();
        let range = config.network.max_v2v_range;
        for algorithm in RoutingAlgorithm::ALL {
            let strategy = algorithm.build(&config);
            let path = strategy.find_route(&source, &destination, &neighbors, &traffic).unwrap();
            prop_assert_eq!(*path.source(), source);
            prop_assert_eq!(*path.destination(), destination);
            prop_assert!(path.respects_range(range), "{} produced {}", algorithm, path);
        }
    }

    /// The flood result scores at least as well as every other candidate.
    #[test]
    fn flood_returns_best_candidate(
        source in arb_location(),
        destination in arb_location(),
        neighbors in arb_neighbors(),
    ) {
        let strategy = FloodDiscoveryStrategy::new(SimulationConfig::default());
        let candidates = strategy.discover_routes(&source, &destination, &neighbors);
        let chosen = strategy
            .find_route(&source, &destination, &neighbors, &TrafficSummary::default())
            .unwrap();

        if !candidates.is_empty() {
            let chosen_score = strategy.score_route(&chosen, &neighbors).value;
            for candidate in &candidates {
                prop_assert!(chosen_score >= strategy.score_route(candidate, &neighbors).value);
            }
        } else {
            prop_assert!(chosen.is_direct());
        }
    }

    /// Unchanged inputs return the identical path without recomputation.
    #[test]
    fn repeated_requests_hit_cache(
        source in arb_location(),
        destination in arb_location(),
        neighbors in arb_neighbors(),
    ) {
        let config = SimulationConfig::default();
        let traffic = TrafficSummary::default();
        // Flood revalidates cached paths against the snapshot, so a random
        // field may legitimately force rediscovery; see its own unit tests.
        for algorithm in [RoutingAlgorithm::GreedyForward, RoutingAlgorithm::JunctionGreedy] {
            let strategy = algorithm.build(&config);
            let first = strategy.find_route(&source, &destination, &neighbors, &traffic).unwrap();
            let second = strategy.find_route(&source, &destination, &neighbors, &traffic).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(strategy.cache().stats().hits, 1);
        }
    }
}
