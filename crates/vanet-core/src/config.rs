//! Simulation configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;
use crate::types::Location;

/// Full configuration for a VANET simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SimulationConfig {
    /// Network geometry and radio ranges.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Vehicle velocity and population bounds.
    #[serde(default)]
    pub vehicles: VehicleConfig,

    /// Route discovery and caching parameters.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Anomaly detection parameters.
    #[serde(default)]
    pub trust: TrustConfig,

    /// Scenario placement and timing.
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Network extent along x, in meters.
    #[serde(default = "default_network_length")]
    pub length: f64,
    /// Network extent along y, in meters.
    #[serde(default = "default_network_width")]
    pub width: f64,
    /// Maximum vehicle-to-vehicle radio range, in meters.
    #[serde(default = "default_v2v_range")]
    pub max_v2v_range: f64,
    /// Roadside unit coverage radius (V2I range), in meters.
    #[serde(default = "default_rsu_radius")]
    pub rsu_radius: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleConfig {
    /// Minimum nominal velocity, in km/h.
    #[serde(default = "default_min_velocity")]
    pub min_velocity: f64,
    /// Maximum nominal velocity, in km/h.
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f64,
    /// Smallest vehicle population a scenario bootstraps.
    #[serde(default = "default_min_vehicles")]
    pub min_count: usize,
    /// Largest vehicle population a scenario bootstraps.
    #[serde(default = "default_max_vehicles")]
    pub max_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfig {
    /// Distance at which a waypoint counts as having reached its target, in meters.
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: f64,
    /// Spacing of the virtual junction grid, in meters.
    #[serde(default = "default_junction_spacing")]
    pub junction_spacing: f64,
    /// Entry count above which a traffic update wipes the route cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Nominal period between flood-discovery cleanups, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustConfig {
    /// Suspicious events after which a vehicle is marked malicious.
    #[serde(default = "default_suspicion_threshold")]
    pub suspicion_threshold: u32,
    /// Multiple of the maximum velocity above which a reported speed is impossible.
    #[serde(default = "default_speed_tolerance")]
    pub speed_tolerance: f64,
    /// Slack factor applied to the kinematically reachable displacement.
    #[serde(default = "default_kinematic_slack")]
    pub kinematic_slack: f64,
    /// Distance a report may fall outside the network rectangle, in meters.
    #[serde(default = "default_geofence_margin")]
    pub geofence_margin: f64,
    /// How recent a peer accident report must be to count, in seconds.
    #[serde(default = "default_peer_window")]
    pub peer_window_secs: f64,
    /// Radius around the reported location in which peers are consulted, in meters.
    #[serde(default = "default_peer_range")]
    pub peer_range: f64,
    /// Window in which a tracked vehicle counts as active for traffic stats, in seconds.
    #[serde(default = "default_activity_window")]
    pub activity_window_secs: f64,
    /// Trust threshold carried from the scenario parameters.
    #[serde(default = "default_trust_threshold")]
    pub trust_threshold: f64,
    /// Reputation decay factor. Not applied by the detector.
    #[serde(default = "default_reputation_decay")]
    pub reputation_decay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    /// Simulation tick, in seconds.
    #[serde(default = "default_timestep")]
    pub timestep_secs: f64,
    /// Total simulated time, in seconds.
    #[serde(default = "default_duration")]
    pub duration_secs: f64,
    /// Where the accident happens.
    #[serde(default = "default_accident_location")]
    pub accident_location: Location,
    /// Fixed roadside unit positions.
    #[serde(default = "default_rsu_locations")]
    pub rsu_locations: Vec<Location>,
}

// Default value functions
fn default_network_length() -> f64 {
    3000.0
}
fn default_network_width() -> f64 {
    3000.0
}
fn default_v2v_range() -> f64 {
    300.0
}
fn default_rsu_radius() -> f64 {
    1000.0
}
fn default_min_velocity() -> f64 {
    60.0
}
fn default_max_velocity() -> f64 {
    100.0
}
fn default_min_vehicles() -> usize {
    11
}
fn default_max_vehicles() -> usize {
    101
}
fn default_proximity_threshold() -> f64 {
    100.0
}
fn default_junction_spacing() -> f64 {
    500.0
}
fn default_cache_capacity() -> usize {
    100
}
fn default_cleanup_interval() -> u64 {
    60
}
fn default_suspicion_threshold() -> u32 {
    3
}
fn default_speed_tolerance() -> f64 {
    1.5
}
fn default_kinematic_slack() -> f64 {
    1.2
}
fn default_geofence_margin() -> f64 {
    10.0
}
fn default_peer_window() -> f64 {
    2.0
}
fn default_peer_range() -> f64 {
    300.0
}
fn default_activity_window() -> f64 {
    5.0
}
fn default_trust_threshold() -> f64 {
    0.5
}
fn default_reputation_decay() -> f64 {
    0.90
}
fn default_accident_location() -> Location {
    Location::new(1500.0, 1500.0)
}
fn default_rsu_locations() -> Vec<Location> {
    vec![
        Location::new(1000.0, 1000.0),
        Location::new(2000.0, 1000.0),
        Location::new(1500.0, 2000.0),
    ]
}
fn default_timestep() -> f64 {
    0.1
}
fn default_duration() -> f64 {
    10.0
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            length: default_network_length(),
            width: default_network_width(),
            max_v2v_range: default_v2v_range(),
            rsu_radius: default_rsu_radius(),
        }
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            min_velocity: default_min_velocity(),
            max_velocity: default_max_velocity(),
            min_count: default_min_vehicles(),
            max_count: default_max_vehicles(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: default_proximity_threshold(),
            junction_spacing: default_junction_spacing(),
            cache_capacity: default_cache_capacity(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            suspicion_threshold: default_suspicion_threshold(),
            speed_tolerance: default_speed_tolerance(),
            kinematic_slack: default_kinematic_slack(),
            geofence_margin: default_geofence_margin(),
            peer_window_secs: default_peer_window(),
            peer_range: default_peer_range(),
            activity_window_secs: default_activity_window(),
            trust_threshold: default_trust_threshold(),
            reputation_decay: default_reputation_decay(),
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            timestep_secs: default_timestep(),
            duration_secs: default_duration(),
            accident_location: default_accident_location(),
            rsu_locations: default_rsu_locations(),
        }
    }
}

impl NetworkConfig {
    /// Returns true if the location lies inside the network rectangle
    /// extended by `margin` meters on every side.
    pub fn contains(&self, location: &Location, margin: f64) -> bool {
        location.x >= -margin
            && location.x <= self.length + margin
            && location.y >= -margin
            && location.y <= self.width + margin
    }
}

impl VehicleConfig {
    /// Normalize a speed against the nominal velocity band.
    ///
    /// Speeds outside the band map outside `[0, 1]`; callers that need a
    /// bounded value clamp it themselves.
    pub fn normalized_speed(&self, speed: f64) -> f64 {
        (speed - self.min_velocity) / (self.max_velocity - self.min_velocity)
    }
}

impl SimulationConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: SimulationConfig = toml::from_str(&contents)?;
            config.validate()?;
            tracing::debug!(path = %path.display(), "loaded simulation config");
            Ok(config)
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject parameter combinations the routing and trust layers cannot use.
    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |msg: String| Err(CoreError::InvalidConfig(msg));

        if self.network.length <= 0.0 || self.network.width <= 0.0 {
            return invalid(format!(
                "network dimensions must be positive: {} x {}",
                self.network.length, self.network.width
            ));
        }
        if self.network.max_v2v_range <= 0.0 || self.network.rsu_radius <= 0.0 {
            return invalid("radio ranges must be positive".into());
        }
        if self.vehicles.min_velocity >= self.vehicles.max_velocity {
            return invalid(format!(
                "min_velocity ({}) must be below max_velocity ({})",
                self.vehicles.min_velocity, self.vehicles.max_velocity
            ));
        }
        if self.vehicles.max_count == 0 || self.vehicles.min_count > self.vehicles.max_count {
            return invalid(format!(
                "invalid vehicle count bounds: {}..={}",
                self.vehicles.min_count, self.vehicles.max_count
            ));
        }
        if self.routing.proximity_threshold <= 0.0 || self.routing.junction_spacing <= 0.0 {
            return invalid("proximity threshold and junction spacing must be positive".into());
        }
        if self.trust.suspicion_threshold == 0 {
            return invalid("suspicion threshold must be at least 1".into());
        }
        if self.trust.speed_tolerance <= 0.0 || self.trust.kinematic_slack <= 0.0 {
            return invalid("speed tolerance and kinematic slack must be positive".into());
        }
        if self.trust.peer_window_secs < 0.0 || self.trust.activity_window_secs < 0.0 {
            return invalid("time windows must be non-negative".into());
        }
        Ok(())
    }
}
