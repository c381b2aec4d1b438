use vanet_core::CoreError;

/// Errors that can occur within the trust layer.
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("block {index} hash does not match its contents")]
    HashMismatch { index: u64 },

    #[error("block {index} does not link to its predecessor")]
    BrokenLink { index: u64 },

    #[error("ledger holds no blocks")]
    EmptyLedger,

    #[error("invalid telemetry: {0}")]
    InvalidTelemetry(#[from] CoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("roadside unit {0} is not running")]
    RsuStopped(String),
}
