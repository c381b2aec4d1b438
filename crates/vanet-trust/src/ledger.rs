use std::collections::HashSet;

use chrono::{DateTime, Utc};
use vanet_core::{CoreError, Location, RsuId, TrafficSummary, VehicleId};

use crate::block::{BlockPayload, LedgerBlock};
use crate::error::TrustError;

/// Root previous-hash carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Message stored in the genesis payload.
pub const GENESIS_MESSAGE: &str = "Genesis Block";

/// Append-only, hash-chained record of trust decisions.
///
/// Blocks are never modified once appended. The set of malicious vehicles
/// is cached as marking blocks are appended and always agrees with
/// [`TrustLedger::scan_malicious_vehicles`].
#[derive(Debug, Clone)]
pub struct TrustLedger {
    blocks: Vec<LedgerBlock>,
    malicious: HashSet<VehicleId>,
}

#[allow(clippy::len_without_is_empty)]
impl TrustLedger {
    /// Create a ledger holding only the genesis block, stamped now.
    pub fn new() -> Result<Self, TrustError> {
        Self::with_genesis_time(Utc::now())
    }

    /// Create a ledger whose genesis block carries `timestamp`.
    pub fn with_genesis_time(timestamp: DateTime<Utc>) -> Result<Self, TrustError> {
        let genesis = LedgerBlock::new(
            0,
            timestamp,
            BlockPayload::Genesis {
                message: GENESIS_MESSAGE.to_string(),
            },
            GENESIS_PREVIOUS_HASH.to_string(),
        )?;
        Ok(Self {
            blocks: vec![genesis],
            malicious: HashSet::new(),
        })
    }

    /// Append a payload stamped now.
    pub fn append(&mut self, payload: BlockPayload) -> Result<&LedgerBlock, TrustError> {
        self.append_at(payload, Utc::now())
    }

    /// Append a payload with an explicit timestamp.
    pub fn append_at(
        &mut self,
        payload: BlockPayload,
        timestamp: DateTime<Utc>,
    ) -> Result<&LedgerBlock, TrustError> {
        let latest = self.latest();
        let block = LedgerBlock::new(latest.index + 1, timestamp, payload, latest.hash.clone())?;

        if let Some(vehicle_id) = block.payload.malicious_vehicle() {
            self.malicious.insert(vehicle_id.clone());
        }
        tracing::trace!(index = block.index, kind = block.payload.kind(), "ledger block appended");

        self.blocks.push(block);
        Ok(self.latest())
    }

    /// Record a vehicle's reported state. Non-finite values are rejected
    /// before anything is appended.
    pub fn record_vehicle_data(
        &mut self,
        vehicle_id: VehicleId,
        location: Location,
        speed: f64,
        direction: f64,
        message: impl Into<String>,
    ) -> Result<&LedgerBlock, TrustError> {
        location.validate()?;
        if !speed.is_finite() || speed < 0.0 || !direction.is_finite() {
            return Err(CoreError::InvalidSnapshot {
                vehicle_id: vehicle_id.to_string(),
                reason: format!("speed {speed} and direction {direction} must be finite, speed non-negative"),
            }
            .into());
        }
        self.append(BlockPayload::VehicleData {
            vehicle_id,
            location,
            speed,
            direction,
            message: message.into(),
        })
    }

    pub fn record_rsu_data(
        &mut self,
        rsu_id: RsuId,
        connected_vehicles: Vec<VehicleId>,
        traffic: TrafficSummary,
    ) -> Result<&LedgerBlock, TrustError> {
        traffic.validate()?;
        self.append(BlockPayload::RsuData {
            rsu_id,
            connected_vehicles,
            traffic,
        })
    }

    /// Permanently mark a vehicle as malicious.
    ///
    /// Returns the new marking block, or `None` if the vehicle was already
    /// marked. No duplicate block is written.
    pub fn add_malicious_vehicle(
        &mut self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<&LedgerBlock>, TrustError> {
        if self.malicious.contains(vehicle_id) {
            return Ok(None);
        }
        let block = self.append(BlockPayload::MaliciousVehicle {
            vehicle_id: vehicle_id.clone(),
        })?;
        tracing::warn!(vehicle_id = %vehicle_id, index = block.index, "vehicle marked malicious");
        Ok(Some(block))
    }

    /// The malicious-vehicle set, maintained as blocks are appended.
    pub fn malicious_vehicles(&self) -> &HashSet<VehicleId> {
        &self.malicious
    }

    /// The malicious-vehicle set, rebuilt by walking the chain.
    pub fn scan_malicious_vehicles(&self) -> HashSet<VehicleId> {
        self.blocks
            .iter()
            .filter_map(|block| block.payload.malicious_vehicle())
            .cloned()
            .collect()
    }

    pub fn is_malicious(&self, vehicle_id: &VehicleId) -> bool {
        self.malicious.contains(vehicle_id)
    }

    /// Walk the chain once and return the position of the first block whose
    /// hash or linkage is wrong, or `None` if the chain is intact.
    pub fn validate(&self) -> Option<u64> {
        self.verify_chain().err().and_then(|err| match err {
            TrustError::HashMismatch { index } | TrustError::BrokenLink { index } => Some(index),
            _ => None,
        })
    }

    /// Like [`TrustLedger::validate`], but reports which check failed.
    pub fn verify_chain(&self) -> Result<(), TrustError> {
        for (position, block) in self.blocks.iter().enumerate() {
            let index = position as u64;
            if !block.is_sealed() {
                tracing::error!(index, "ledger block hash does not match its contents");
                return Err(TrustError::HashMismatch { index });
            }
            let expected_previous = match position {
                0 => GENESIS_PREVIOUS_HASH,
                _ => self.blocks[position - 1].hash.as_str(),
            };
            if block.index != index || block.previous_hash != expected_previous {
                tracing::error!(index, stored_index = block.index, "ledger chain link broken");
                return Err(TrustError::BrokenLink { index });
            }
        }
        Ok(())
    }

    pub fn blocks(&self) -> &[LedgerBlock] {
        &self.blocks
    }

    pub fn latest(&self) -> &LedgerBlock {
        // The genesis block is never removed.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Export the chain as JSON.
    pub fn to_json(&self) -> Result<String, TrustError> {
        Ok(serde_json::to_string_pretty(&self.blocks)?)
    }

    /// Import a chain exported by [`TrustLedger::to_json`].
    ///
    /// The chain is taken as-is and never repaired; call
    /// [`TrustLedger::validate`] to check it.
    pub fn from_json(data: &str) -> Result<Self, TrustError> {
        let blocks: Vec<LedgerBlock> = serde_json::from_str(data)?;
        if blocks.is_empty() {
            return Err(TrustError::EmptyLedger);
        }
        let mut ledger = Self {
            blocks,
            malicious: HashSet::new(),
        };
        ledger.malicious = ledger.scan_malicious_vehicles();
        Ok(ledger)
    }
}
