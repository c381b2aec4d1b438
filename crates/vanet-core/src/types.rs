use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::CoreError;

/// A planar position in meters inside the simulated road network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    /// Create a new location.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another location, in meters.
    pub fn distance_to(&self, other: &Location) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Returns true if `other` lies within `range` meters (inclusive).
    pub fn is_within(&self, other: &Location, range: f64) -> bool {
        self.distance_to(other) <= range
    }

    /// Canonical key with both coordinates rounded to 0.1 m.
    ///
    /// Two locations with the same key are treated as the same place by the
    /// route cache and the flood-discovery visited set.
    pub fn key(&self) -> String {
        format!("{:.1},{:.1}", self.x, self.y)
    }

    /// Returns true if both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Fail fast on NaN or infinite coordinates.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.is_finite() {
            return Err(CoreError::InvalidLocation {
                x: self.x,
                y: self.y,
                reason: "coordinates must be finite".into(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Identifier of a vehicle (e.g. `V_12`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for VehicleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a roadside unit (e.g. `RSU_0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RsuId(String);

impl RsuId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RsuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RsuId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Telemetry reported by a vehicle beacon.
///
/// Snapshots are ephemeral: the mobility layer supplies them per call and the
/// core never owns them beyond the last-known state kept by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    /// Reporting vehicle.
    pub vehicle_id: VehicleId,
    /// Reported position.
    pub location: Location,
    /// Reported speed in km/h.
    pub speed: f64,
    /// Heading in degrees.
    pub direction: f64,
    /// Whether the vehicle claims to see the accident, when it reports it at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sees_accident: Option<bool>,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
}

impl VehicleSnapshot {
    /// Create a snapshot without an accident-visibility flag.
    pub fn new(
        vehicle_id: impl Into<VehicleId>,
        location: Location,
        speed: f64,
        direction: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            location,
            speed,
            direction,
            sees_accident: None,
            timestamp,
        }
    }

    /// Attach an accident-visibility flag.
    pub fn with_accident_report(mut self, sees_accident: bool) -> Self {
        self.sees_accident = Some(sees_accident);
        self
    }

    /// Reported speed converted to meters per second.
    pub fn speed_mps(&self) -> f64 {
        self.speed * 1000.0 / 3600.0
    }

    /// Parse a beacon payload. Missing fields are a contract violation.
    pub fn from_json(data: &str) -> Result<Self, CoreError> {
        let snapshot: Self = serde_json::from_str(data)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Validate that all fields hold usable values.
    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |reason: &str| CoreError::InvalidSnapshot {
            vehicle_id: self.vehicle_id.to_string(),
            reason: reason.to_string(),
        };

        if self.vehicle_id.as_str().is_empty() {
            return Err(invalid("vehicle id is empty"));
        }
        if !self.location.is_finite() {
            return Err(invalid("location is not finite"));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(invalid("speed must be finite and non-negative"));
        }
        if !self.direction.is_finite() {
            return Err(invalid("direction is not finite"));
        }
        Ok(())
    }
}

/// Neighbor snapshot keyed by vehicle id.
///
/// Iteration follows vehicle-id order so that every strategy resolves score
/// ties the same way for the same input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeighborMap {
    vehicles: BTreeMap<VehicleId, VehicleSnapshot>,
}

impl NeighborMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot for its vehicle. Returns the previous one.
    pub fn insert(&mut self, snapshot: VehicleSnapshot) -> Option<VehicleSnapshot> {
        self.vehicles.insert(snapshot.vehicle_id.clone(), snapshot)
    }

    pub fn get(&self, vehicle_id: &VehicleId) -> Option<&VehicleSnapshot> {
        self.vehicles.get(vehicle_id)
    }

    pub fn remove(&mut self, vehicle_id: &VehicleId) -> Option<VehicleSnapshot> {
        self.vehicles.remove(vehicle_id)
    }

    pub fn contains(&self, vehicle_id: &VehicleId) -> bool {
        self.vehicles.contains_key(vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VehicleId, &VehicleSnapshot)> {
        self.vehicles.iter()
    }

    /// All snapshots in vehicle-id order.
    pub fn snapshots(&self) -> impl Iterator<Item = &VehicleSnapshot> {
        self.vehicles.values()
    }

    /// Snapshots within `range` meters of `location`.
    pub fn within_range<'a>(
        &'a self,
        location: &'a Location,
        range: f64,
    ) -> impl Iterator<Item = &'a VehicleSnapshot> + 'a {
        self.vehicles
            .values()
            .filter(move |s| s.location.is_within(location, range))
    }

    /// Copy of this map without the excluded vehicles.
    pub fn without(&self, excluded: &HashSet<VehicleId>) -> NeighborMap {
        let vehicles = self
            .vehicles
            .iter()
            .filter(|(id, _)| !excluded.contains(*id))
            .map(|(id, s)| (id.clone(), s.clone()))
            .collect();
        NeighborMap { vehicles }
    }

    /// Validate every snapshot, including that each key matches its snapshot id.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (id, snapshot) in &self.vehicles {
            if *id != snapshot.vehicle_id {
                return Err(CoreError::InvalidSnapshot {
                    vehicle_id: id.to_string(),
                    reason: format!("keyed under a different id than {}", snapshot.vehicle_id),
                });
            }
            snapshot.validate()?;
        }
        Ok(())
    }
}

impl FromIterator<VehicleSnapshot> for NeighborMap {
    fn from_iter<I: IntoIterator<Item = VehicleSnapshot>>(iter: I) -> Self {
        let mut map = NeighborMap::new();
        for snapshot in iter {
            map.insert(snapshot);
        }
        map
    }
}

/// Traffic conditions aggregated by a roadside unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrafficSummary {
    /// Number of active vehicles.
    pub vehicle_count: usize,
    /// Mean speed of active vehicles in km/h.
    pub average_speed: f64,
    /// Congestion level in `[0, 1]`.
    pub congestion_level: f64,
}

impl TrafficSummary {
    pub fn new(vehicle_count: usize, average_speed: f64, congestion_level: f64) -> Self {
        Self {
            vehicle_count,
            average_speed,
            congestion_level,
        }
    }

    /// Validate that the summary respects its documented ranges.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.average_speed.is_finite() || self.average_speed < 0.0 {
            return Err(CoreError::InvalidTraffic(format!(
                "average speed must be finite and non-negative, got {}",
                self.average_speed
            )));
        }
        if !(0.0..=1.0).contains(&self.congestion_level) {
            return Err(CoreError::InvalidTraffic(format!(
                "congestion level out of range [0, 1]: {}",
                self.congestion_level
            )));
        }
        Ok(())
    }
}
