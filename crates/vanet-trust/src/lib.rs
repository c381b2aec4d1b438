//! VANET Trust: misbehavior detection and its permanent record.
//!
//! This crate provides:
//! - [`TrustLedger`]: an append-only, hash-chained record of vehicle data,
//!   roadside unit snapshots and malicious-vehicle decisions.
//! - [`SharedLedger`]: the process-wide handle every component holds.
//! - [`AnomalyDetector`]: per-RSU plausibility checks and suspicion counting.
//! - [`RoadsideUnit`] and [`RsuHandle`]: the RSU state and its actor task.

pub mod actor;
pub mod block;
pub mod detector;
pub mod error;
pub mod hashing;
pub mod ledger;
pub mod rsu;
pub mod shared;

#[cfg(test)]
mod proptests;

// Re-exports for convenience.
pub use actor::{RsuCommand, RsuHandle};
pub use block::{BlockPayload, LedgerBlock};
pub use detector::{AnomalyDetector, DetectionOutcome, SuspicionReason};
pub use error::TrustError;
pub use ledger::{TrustLedger, GENESIS_MESSAGE, GENESIS_PREVIOUS_HASH};
pub use rsu::RoadsideUnit;
pub use shared::SharedLedger;
