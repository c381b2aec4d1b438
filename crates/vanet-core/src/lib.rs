//! VANET Core: shared data model for the routing engine and trust subsystem.
//!
//! This crate provides:
//! - [`Location`], [`VehicleId`], [`VehicleSnapshot`]: per-call telemetry supplied
//!   by the mobility layer.
//! - [`NeighborMap`]: the ordered neighbor snapshot every routing call consumes.
//! - [`TrafficSummary`]: the congestion summary aggregated by roadside units.
//! - [`SimulationConfig`]: TOML-loadable simulation parameters.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    NetworkConfig, RoutingConfig, ScenarioConfig, SimulationConfig, TrustConfig, VehicleConfig,
};
pub use error::CoreError;
pub use types::{Location, NeighborMap, RsuId, TrafficSummary, VehicleId, VehicleSnapshot};
