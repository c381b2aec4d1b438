use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vanet_core::{Location, RsuId, TrafficSummary, VehicleId};

use crate::error::TrustError;
use crate::hashing::hash_hex;

/// What a ledger block records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockPayload {
    /// Sentinel payload of the first block.
    Genesis { message: String },
    /// A vehicle was permanently marked malicious.
    MaliciousVehicle { vehicle_id: VehicleId },
    /// A vehicle's reported state.
    VehicleData {
        vehicle_id: VehicleId,
        location: Location,
        speed: f64,
        direction: f64,
        message: String,
    },
    /// A roadside unit's view of its coverage area.
    RsuData {
        rsu_id: RsuId,
        connected_vehicles: Vec<VehicleId>,
        traffic: TrafficSummary,
    },
}

impl BlockPayload {
    /// The marked vehicle, if this is a malicious-vehicle payload.
    pub fn malicious_vehicle(&self) -> Option<&VehicleId> {
        match self {
            BlockPayload::MaliciousVehicle { vehicle_id } => Some(vehicle_id),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BlockPayload::Genesis { .. } => "genesis",
            BlockPayload::MaliciousVehicle { .. } => "malicious_vehicle",
            BlockPayload::VehicleData { .. } => "vehicle_data",
            BlockPayload::RsuData { .. } => "rsu_data",
        }
    }
}

/// A single link in the trust ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerBlock {
    /// Position in the chain, starting at 0 for genesis.
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: BlockPayload,
    /// Hex digest of the preceding block, or the root sentinel for genesis.
    pub previous_hash: String,
    /// Hex digest over the other four fields.
    pub hash: String,
}

/// The hashed fields, in canonical order.
#[derive(Serialize)]
struct HashedFields<'a> {
    index: u64,
    timestamp: &'a DateTime<Utc>,
    payload: &'a BlockPayload,
    previous_hash: &'a str,
}

impl LedgerBlock {
    /// Create a block and seal it with its hash.
    pub fn new(
        index: u64,
        timestamp: DateTime<Utc>,
        payload: BlockPayload,
        previous_hash: String,
    ) -> Result<Self, TrustError> {
        let hash = seal(index, &timestamp, &payload, &previous_hash)?;
        Ok(Self {
            index,
            timestamp,
            payload,
            previous_hash,
            hash,
        })
    }

    /// Recompute the hash from the block's current contents.
    pub fn compute_hash(&self) -> Result<String, TrustError> {
        seal(self.index, &self.timestamp, &self.payload, &self.previous_hash)
    }

    /// True if the stored hash matches the block's contents.
    pub fn is_sealed(&self) -> bool {
        matches!(self.compute_hash(), Ok(hash) if hash == self.hash)
    }
}

fn seal(
    index: u64,
    timestamp: &DateTime<Utc>,
    payload: &BlockPayload,
    previous_hash: &str,
) -> Result<String, TrustError> {
    let fields = HashedFields {
        index,
        timestamp,
        payload,
        previous_hash,
    };
    let bytes = serde_json::to_vec(&fields)?;
    Ok(hash_hex(&bytes))
}
