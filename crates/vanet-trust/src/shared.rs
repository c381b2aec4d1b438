use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use vanet_core::{Location, NeighborMap, RsuId, TrafficSummary, VehicleId};

use crate::block::LedgerBlock;
use crate::error::TrustError;
use crate::ledger::TrustLedger;

/// Process-wide handle to the single [`TrustLedger`].
///
/// Every component holds a clone of this handle; none keeps a private copy
/// of the chain. Each call takes the lock for the duration of one ledger
/// operation only.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<TrustLedger>>,
}

#[allow(clippy::len_without_is_empty)]
impl SharedLedger {
    pub fn new(ledger: TrustLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// A fresh ledger holding only the genesis block.
    pub fn genesis() -> Result<Self, TrustError> {
        Ok(Self::new(TrustLedger::new()?))
    }

    pub fn record_vehicle_data(
        &self,
        vehicle_id: VehicleId,
        location: Location,
        speed: f64,
        direction: f64,
        message: impl Into<String>,
    ) -> Result<LedgerBlock, TrustError> {
        let mut ledger = self.inner.lock();
        ledger
            .record_vehicle_data(vehicle_id, location, speed, direction, message)
            .cloned()
    }

    pub fn record_rsu_data(
        &self,
        rsu_id: RsuId,
        connected_vehicles: Vec<VehicleId>,
        traffic: TrafficSummary,
    ) -> Result<LedgerBlock, TrustError> {
        let mut ledger = self.inner.lock();
        ledger
            .record_rsu_data(rsu_id, connected_vehicles, traffic)
            .cloned()
    }

    /// Mark a vehicle malicious. `None` if it already was.
    pub fn add_malicious_vehicle(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<LedgerBlock>, TrustError> {
        let mut ledger = self.inner.lock();
        Ok(ledger.add_malicious_vehicle(vehicle_id)?.cloned())
    }

    pub fn is_malicious(&self, vehicle_id: &VehicleId) -> bool {
        self.inner.lock().is_malicious(vehicle_id)
    }

    /// Copy of the current malicious-vehicle set.
    pub fn malicious_vehicles(&self) -> HashSet<VehicleId> {
        self.inner.lock().malicious_vehicles().clone()
    }

    /// Neighbors with every currently marked vehicle removed.
    ///
    /// The malicious set is copied under the lock and applied afterwards, so
    /// a vehicle marked while filtering may still appear in the result.
    pub fn trusted_neighbors(&self, neighbors: &NeighborMap) -> NeighborMap {
        let malicious = self.malicious_vehicles();
        if malicious.is_empty() {
            return neighbors.clone();
        }
        neighbors.without(&malicious)
    }

    pub fn validate(&self) -> Option<u64> {
        self.inner.lock().validate()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn latest(&self) -> LedgerBlock {
        self.inner.lock().latest().clone()
    }

    /// Run `f` with read access to the ledger while holding the lock.
    pub fn with<R>(&self, f: impl FnOnce(&TrustLedger) -> R) -> R {
        f(&self.inner.lock())
    }
}

impl From<TrustLedger> for SharedLedger {
    fn from(ledger: TrustLedger) -> Self {
        Self::new(ledger)
    }
}
