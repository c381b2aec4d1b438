//! VANET Routing: path selection over an ephemeral, range-limited ad hoc graph.
//!
//! This crate provides:
//! - [`RoutingStrategy`]: the common interface every path-selection algorithm implements.
//! - [`GreedyForwardStrategy`]: traffic-aware greedy forwarding toward the destination.
//! - [`JunctionStrategy`]: greedy forwarding anchored on a virtual junction grid.
//! - [`FloodDiscoveryStrategy`]: on-demand breadth-first route discovery.
//! - [`RouteCache`]: the per-strategy path cache with hit/miss accounting.
//! - [`Path`] and [`RouteScore`]: the route representation and its scoring.

pub mod cache;
pub mod error;
pub mod flood;
pub mod greedy;
pub mod junction;
pub mod route;
pub mod scoring;
pub mod strategy;

#[cfg(test)]
mod proptests;

// Re-exports for convenience.
pub use cache::{route_key, CacheStats, RouteCache};
pub use error::RoutingError;
pub use flood::FloodDiscoveryStrategy;
pub use greedy::GreedyForwardStrategy;
pub use junction::JunctionStrategy;
pub use route::Path;
pub use scoring::{HopWeights, JunctionWeights, LinkWeights, RouteScore, RouteWeights};
pub use strategy::{RoutingAlgorithm, RoutingStrategy};
