use serde::{Deserialize, Serialize};
use vanet_core::{Location, NeighborMap, VehicleConfig};

use crate::error::RoutingError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

fn check_sum(sum: f64) -> Result<(), RoutingError> {
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(RoutingError::InvalidScoringWeights { sum });
    }
    Ok(())
}

/// Weights for scoring a single vehicle-to-vehicle hop.
///
/// `score = progress * meters_gained + speed * normalized_speed + congestion * (1 - congestion_level)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HopWeights {
    pub progress: f64,
    pub speed: f64,
    pub congestion: f64,
}

impl HopWeights {
    pub fn new(progress: f64, speed: f64, congestion: f64) -> Result<Self, RoutingError> {
        let weights = Self {
            progress,
            speed,
            congestion,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), RoutingError> {
        check_sum(self.progress + self.speed + self.congestion)
    }

    /// Weights used by traffic-aware greedy forwarding.
    pub fn greedy() -> Self {
        Self {
            progress: 0.5,
            speed: 0.3,
            congestion: 0.2,
        }
    }

    /// Weights used when hopping toward a junction. Congestion plays no part.
    pub fn toward_junction() -> Self {
        Self {
            progress: 0.7,
            speed: 0.3,
            congestion: 0.0,
        }
    }

    pub fn score(&self, progress: f64, normalized_speed: f64, congestion_level: f64) -> f64 {
        self.progress * progress
            + self.speed * normalized_speed
            + self.congestion * (1.0 - congestion_level)
    }
}

impl Default for HopWeights {
    fn default() -> Self {
        Self::greedy()
    }
}

/// Weights for choosing the next junction on the virtual grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JunctionWeights {
    pub direction: f64,
    pub density: f64,
    pub congestion: f64,
}

impl JunctionWeights {
    pub fn new(direction: f64, density: f64, congestion: f64) -> Result<Self, RoutingError> {
        let weights = Self {
            direction,
            density,
            congestion,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), RoutingError> {
        check_sum(self.direction + self.density + self.congestion)
    }

    pub fn score(&self, direction_progress: f64, density: f64, congestion_level: f64) -> f64 {
        self.direction * direction_progress
            + self.density * density
            + self.congestion * (1.0 - congestion_level)
    }
}

impl Default for JunctionWeights {
    fn default() -> Self {
        Self {
            direction: 0.4,
            density: 0.4,
            congestion: 0.2,
        }
    }
}

/// Weights for the stability estimate of a single link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkWeights {
    pub speed: f64,
    pub distance: f64,
}

impl LinkWeights {
    pub fn new(speed: f64, distance: f64) -> Result<Self, RoutingError> {
        let weights = Self { speed, distance };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), RoutingError> {
        check_sum(self.speed + self.distance)
    }

    /// Stability of a link between two nodes with the given normalized speeds.
    ///
    /// Similar speeds and short links score higher.
    pub fn stability(&self, norm_speed_a: f64, norm_speed_b: f64, distance: f64, range: f64) -> f64 {
        self.speed * (1.0 - (norm_speed_a - norm_speed_b).abs())
            + self.distance * (1.0 - distance / range)
    }
}

impl Default for LinkWeights {
    fn default() -> Self {
        Self {
            speed: 0.5,
            distance: 0.5,
        }
    }
}

/// Weights for the overall route score used by flood discovery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteWeights {
    pub hops: f64,
    pub stability: f64,
}

impl RouteWeights {
    pub fn new(hops: f64, stability: f64) -> Result<Self, RoutingError> {
        let weights = Self { hops, stability };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), RoutingError> {
        check_sum(self.hops + self.stability)
    }
}

impl Default for RouteWeights {
    fn default() -> Self {
        Self {
            hops: 0.4,
            stability: 0.6,
        }
    }
}

/// The result of scoring a discovered route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteScore {
    /// The composite score value. Higher is better.
    pub value: f64,
    /// `1 / hop_count`.
    pub hop_component: f64,
    /// Stability of the weakest link.
    pub stability_component: f64,
}

impl RouteScore {
    /// `score = hops * (1 / hop_count) + stability * min_link_stability`
    pub fn compute(hop_count: usize, min_stability: f64, weights: &RouteWeights) -> Self {
        let hop_component = if hop_count == 0 {
            1.0
        } else {
            1.0 / hop_count as f64
        };
        let value = weights.hops * hop_component + weights.stability * min_stability;
        Self {
            value,
            hop_component,
            stability_component: min_stability,
        }
    }
}

impl PartialOrd for RouteScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

/// Distance reduction toward `target` gained by moving from `current` to
/// `candidate`. `None` unless the candidate is strictly closer.
pub fn forward_progress(current: &Location, candidate: &Location, target: &Location) -> Option<f64> {
    let progress = current.distance_to(target) - candidate.distance_to(target);
    (progress > 0.0).then_some(progress)
}

/// Fraction of the remaining distance to `destination` that moving to
/// `junction` removes. Negative when the junction leads away.
pub fn direction_progress(current: &Location, junction: &Location, destination: &Location) -> f64 {
    let remaining = current.distance_to(destination);
    if remaining <= 0.0 {
        return 0.0;
    }
    (remaining - junction.distance_to(destination)) / remaining
}

/// Vehicle density around a junction, saturating at one tenth of the
/// maximum vehicle population.
pub fn local_density(
    junction: &Location,
    neighbors: &NeighborMap,
    range: f64,
    vehicles: &VehicleConfig,
) -> f64 {
    let nearby = neighbors.within_range(junction, range).count() as f64;
    let saturation = 0.1 * vehicles.max_count as f64;
    if saturation <= 0.0 {
        return 1.0;
    }
    (nearby / saturation).min(1.0)
}
