use chrono::{DateTime, Utc};
use vanet_core::{Location, RsuId, SimulationConfig, TrafficSummary, VehicleId, VehicleSnapshot};

use crate::block::LedgerBlock;
use crate::detector::{AnomalyDetector, DetectionOutcome};
use crate::error::TrustError;
use crate::shared::SharedLedger;

/// A fixed roadside unit.
///
/// Owns the anomaly detector for its coverage area and the traffic summary
/// it derives from the vehicles it tracks.
pub struct RoadsideUnit {
    id: RsuId,
    location: Location,
    config: SimulationConfig,
    detector: AnomalyDetector,
    ledger: SharedLedger,
    traffic: TrafficSummary,
}

impl RoadsideUnit {
    pub fn new(
        id: RsuId,
        location: Location,
        config: SimulationConfig,
        ledger: SharedLedger,
    ) -> Self {
        let detector = AnomalyDetector::new(id.clone(), config.clone(), ledger.clone());
        Self {
            id,
            location,
            config,
            detector,
            ledger,
            traffic: TrafficSummary::default(),
        }
    }

    /// One unit per configured RSU position, named `RSU_0`, `RSU_1`, ...
    pub fn from_config(config: &SimulationConfig, ledger: &SharedLedger) -> Vec<Self> {
        config
            .scenario
            .rsu_locations
            .iter()
            .enumerate()
            .map(|(i, location)| {
                Self::new(
                    RsuId::new(format!("RSU_{i}")),
                    *location,
                    config.clone(),
                    ledger.clone(),
                )
            })
            .collect()
    }

    pub fn id(&self) -> &RsuId {
        &self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// The most recently computed traffic summary.
    pub fn traffic(&self) -> TrafficSummary {
        self.traffic
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    /// Evaluate a vehicle's telemetry through the detector.
    pub fn handle_telemetry(
        &mut self,
        snapshot: VehicleSnapshot,
    ) -> Result<DetectionOutcome, TrustError> {
        let vehicle_id = snapshot.vehicle_id.clone();
        let outcome = self.detector.evaluate(snapshot)?;
        tracing::trace!(rsu_id = %self.id, vehicle_id = %vehicle_id, ?outcome, "telemetry evaluated");
        Ok(outcome)
    }

    /// Recompute the traffic summary from vehicles seen within the activity
    /// window before `now`.
    ///
    /// With no active vehicles the previous summary is kept.
    pub fn update_traffic(&mut self, now: DateTime<Utc>) -> TrafficSummary {
        let window = self.config.trust.activity_window_secs;
        let speeds: Vec<f64> = self
            .detector
            .tracked_snapshots()
            .filter(|s| {
                let age = (now - s.timestamp).num_milliseconds() as f64 / 1000.0;
                age < window
            })
            .filter(|s| !self.ledger.is_malicious(&s.vehicle_id))
            .map(|s| s.speed)
            .collect();

        if speeds.is_empty() {
            return self.traffic;
        }

        let count = speeds.len();
        let average_speed = speeds.iter().sum::<f64>() / count as f64;
        self.traffic = TrafficSummary::new(
            count,
            average_speed,
            self.congestion_level(count, average_speed),
        );
        tracing::debug!(
            rsu_id = %self.id,
            vehicles = count,
            average_speed,
            congestion = self.traffic.congestion_level,
            "traffic updated"
        );
        self.traffic
    }

    /// Congestion in `[0, 1]`: the mean of how slow traffic is relative to
    /// the velocity band and how full the area is relative to half the
    /// maximum population.
    fn congestion_level(&self, vehicle_count: usize, average_speed: f64) -> f64 {
        let vehicles = &self.config.vehicles;
        let slowness = 1.0 - vehicles.normalized_speed(average_speed);
        let half_population = vehicles.max_count as f64 / 2.0;
        let fullness = if half_population > 0.0 {
            (vehicle_count as f64 / half_population).min(1.0)
        } else {
            1.0
        };
        ((slowness + fullness) / 2.0).clamp(0.0, 1.0)
    }

    /// Refresh traffic and record this unit's view in the ledger.
    pub fn publish_snapshot(&mut self, now: DateTime<Utc>) -> Result<LedgerBlock, TrustError> {
        let traffic = self.update_traffic(now);
        let connected = self.tracked_vehicles();
        self.ledger.record_rsu_data(self.id.clone(), connected, traffic)
    }

    /// True if `location` lies within this unit's coverage radius.
    pub fn in_coverage(&self, location: &Location) -> bool {
        self.location.is_within(location, self.config.network.rsu_radius)
    }

    /// Tracked, non-malicious vehicles within `range` of `location`.
    pub fn nearby_vehicles(&self, location: &Location, range: f64) -> Vec<VehicleSnapshot> {
        let malicious = self.ledger.malicious_vehicles();
        let mut nearby: Vec<VehicleSnapshot> = self
            .detector
            .tracked_snapshots()
            .filter(|s| s.location.is_within(location, range))
            .filter(|s| !malicious.contains(&s.vehicle_id))
            .cloned()
            .collect();
        nearby.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        nearby
    }

    /// Ids of every tracked vehicle, sorted.
    pub fn tracked_vehicles(&self) -> Vec<VehicleId> {
        let mut ids: Vec<VehicleId> = self
            .detector
            .tracked_snapshots()
            .map(|s| s.vehicle_id.clone())
            .collect();
        ids.sort();
        ids
    }
}
