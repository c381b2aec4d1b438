use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use vanet_core::{Location, RsuId, SimulationConfig, VehicleId, VehicleSnapshot};

use crate::error::TrustError;
use crate::shared::SharedLedger;

/// Why a single update looked implausible.
#[derive(Debug, Clone, PartialEq)]
pub enum SuspicionReason {
    /// Reported speed above the tolerated multiple of the maximum velocity.
    ImpossibleSpeed { speed: f64 },
    /// Moved further than the previous speed allows in the elapsed time.
    ImpossibleMovement { distance: f64, elapsed_secs: f64 },
    /// Reported position outside the network rectangle plus margin.
    OutsideBounds { location: Location },
    /// Accident flag disagrees with the majority of recent nearby peers.
    InconsistentAccidentReport {
        reported: bool,
        majority: bool,
        peers: usize,
    },
}

impl fmt::Display for SuspicionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuspicionReason::ImpossibleSpeed { speed } => {
                write!(f, "impossible speed: {speed:.1} km/h")
            }
            SuspicionReason::ImpossibleMovement {
                distance,
                elapsed_secs,
            } => write!(f, "impossible movement: {distance:.1}m in {elapsed_secs:.1}s"),
            SuspicionReason::OutsideBounds { location } => {
                write!(f, "position outside bounds: {location}")
            }
            SuspicionReason::InconsistentAccidentReport {
                reported,
                majority,
                peers,
            } => write!(
                f,
                "inconsistent accident report: reported {reported} while {peers} nearby vehicles reported {majority}"
            ),
        }
    }
}

/// Result of evaluating one telemetry update.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// The vehicle is already marked malicious; the update was discarded.
    Rejected,
    /// First update from this vehicle; stored without checks.
    FirstSeen,
    /// Plausible update; stored.
    Accepted,
    /// Implausible update below the marking threshold; stored and counted.
    Suspicious {
        count: u32,
        reasons: Vec<SuspicionReason>,
    },
    /// Threshold reached: the vehicle was marked, evicted, and this update
    /// discarded. `block_index` is `None` if another RSU marked it first.
    MarkedMalicious {
        block_index: Option<u64>,
        reasons: Vec<SuspicionReason>,
    },
}

impl DetectionOutcome {
    /// True if the update was stored as the vehicle's latest state.
    pub fn is_stored(&self) -> bool {
        matches!(
            self,
            DetectionOutcome::FirstSeen
                | DetectionOutcome::Accepted
                | DetectionOutcome::Suspicious { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct TrackedVehicle {
    snapshot: VehicleSnapshot,
    suspicion: u32,
}

/// Per-RSU plausibility checks over vehicle telemetry.
///
/// Each tracked vehicle carries a suspicion counter that only grows. When it
/// reaches the configured threshold the vehicle is marked malicious in the
/// shared ledger and forgotten locally.
pub struct AnomalyDetector {
    rsu_id: RsuId,
    config: SimulationConfig,
    tracked: HashMap<VehicleId, TrackedVehicle>,
    ledger: SharedLedger,
}

impl AnomalyDetector {
    pub fn new(rsu_id: RsuId, config: SimulationConfig, ledger: SharedLedger) -> Self {
        Self {
            rsu_id,
            config,
            tracked: HashMap::new(),
            ledger,
        }
    }

    /// Evaluate an update and apply its effect on tracking state and ledger.
    pub fn evaluate(&mut self, snapshot: VehicleSnapshot) -> Result<DetectionOutcome, TrustError> {
        let vehicle_id = snapshot.vehicle_id.clone();

        if self.ledger.is_malicious(&vehicle_id) {
            tracing::debug!(
                rsu_id = %self.rsu_id,
                vehicle_id = %vehicle_id,
                "rejected update from malicious vehicle"
            );
            return Ok(DetectionOutcome::Rejected);
        }
        snapshot.validate()?;

        let Some(previous) = self.tracked.get(&vehicle_id) else {
            self.tracked.insert(
                vehicle_id,
                TrackedVehicle {
                    snapshot,
                    suspicion: 0,
                },
            );
            return Ok(DetectionOutcome::FirstSeen);
        };

        let reasons = self.check(&previous.snapshot, &snapshot);
        if reasons.is_empty() {
            self.store(snapshot);
            return Ok(DetectionOutcome::Accepted);
        }

        let count = previous.suspicion + 1;
        tracing::info!(
            rsu_id = %self.rsu_id,
            vehicle_id = %vehicle_id,
            count,
            reasons = %join_reasons(&reasons),
            "suspicious activity"
        );

        if count >= self.config.trust.suspicion_threshold {
            let block = self.ledger.add_malicious_vehicle(&vehicle_id)?;
            self.tracked.remove(&vehicle_id);
            tracing::warn!(
                rsu_id = %self.rsu_id,
                vehicle_id = %vehicle_id,
                evidence = count,
                "marking vehicle as malicious"
            );
            return Ok(DetectionOutcome::MarkedMalicious {
                block_index: block.map(|b| b.index),
                reasons,
            });
        }

        self.tracked.insert(
            vehicle_id,
            TrackedVehicle {
                snapshot,
                suspicion: count,
            },
        );
        Ok(DetectionOutcome::Suspicious { count, reasons })
    }

    /// Run every plausibility check of `current` against `previous`.
    ///
    /// Nothing is checked unless time moved forward between the two.
    fn check(&self, previous: &VehicleSnapshot, current: &VehicleSnapshot) -> Vec<SuspicionReason> {
        let elapsed = seconds_between(previous.timestamp, current.timestamp);
        if elapsed <= 0.0 {
            return Vec::new();
        }

        let trust = &self.config.trust;
        let mut reasons = Vec::new();

        let speed_limit = self.config.vehicles.max_velocity * trust.speed_tolerance;
        if current.speed > speed_limit {
            reasons.push(SuspicionReason::ImpossibleSpeed {
                speed: current.speed,
            });
        }

        let reachable = previous.speed_mps() * elapsed * trust.kinematic_slack;
        let distance = previous.location.distance_to(&current.location);
        if distance > reachable {
            reasons.push(SuspicionReason::ImpossibleMovement {
                distance,
                elapsed_secs: elapsed,
            });
        }

        if !self
            .config
            .network
            .contains(&current.location, trust.geofence_margin)
        {
            reasons.push(SuspicionReason::OutsideBounds {
                location: current.location,
            });
        }

        if let Some(reason) = self.check_accident_report(current) {
            reasons.push(reason);
        }

        reasons
    }

    /// Compare the accident flag with recent reports from nearby peers.
    ///
    /// Skipped unless the update carries a flag and at least two other
    /// tracked vehicles reported one within the peer window.
    fn check_accident_report(&self, current: &VehicleSnapshot) -> Option<SuspicionReason> {
        let reported = current.sees_accident?;
        let trust = &self.config.trust;

        let peer_reports: Vec<bool> = self
            .tracked
            .values()
            .map(|tracked| &tracked.snapshot)
            .filter(|peer| peer.vehicle_id != current.vehicle_id)
            .filter(|peer| peer.location.is_within(&current.location, trust.peer_range))
            .filter(|peer| seconds_between(peer.timestamp, current.timestamp) < trust.peer_window_secs)
            .filter_map(|peer| peer.sees_accident)
            .collect();

        if peer_reports.len() < 2 {
            return None;
        }

        let seen = peer_reports.iter().filter(|&&flag| flag).count();
        let majority = seen * 2 > peer_reports.len();
        (reported != majority).then_some(SuspicionReason::InconsistentAccidentReport {
            reported,
            majority,
            peers: peer_reports.len(),
        })
    }

    fn store(&mut self, snapshot: VehicleSnapshot) {
        if let Some(tracked) = self.tracked.get_mut(&snapshot.vehicle_id) {
            tracked.snapshot = snapshot;
        }
    }

    pub fn rsu_id(&self) -> &RsuId {
        &self.rsu_id
    }

    /// Suspicion count of a tracked vehicle.
    pub fn suspicion_count(&self, vehicle_id: &VehicleId) -> Option<u32> {
        self.tracked.get(vehicle_id).map(|t| t.suspicion)
    }

    pub fn is_tracked(&self, vehicle_id: &VehicleId) -> bool {
        self.tracked.contains_key(vehicle_id)
    }

    /// Last stored snapshot of a tracked vehicle.
    pub fn last_snapshot(&self, vehicle_id: &VehicleId) -> Option<&VehicleSnapshot> {
        self.tracked.get(vehicle_id).map(|t| &t.snapshot)
    }

    /// All tracked snapshots, in no particular order.
    pub fn tracked_snapshots(&self) -> impl Iterator<Item = &VehicleSnapshot> {
        self.tracked.values().map(|t| &t.snapshot)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }
}

fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}

fn join_reasons(reasons: &[SuspicionReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
