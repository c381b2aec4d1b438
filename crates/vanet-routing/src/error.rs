use vanet_core::CoreError;

/// Errors that can occur within the routing layer.
///
/// Failing to find a multi-hop route is not an error: every strategy falls
/// back to a direct path. Only malformed caller input is rejected.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("invalid routing input: {0}")]
    InvalidInput(#[from] CoreError),

    #[error("a path needs at least two waypoints, got {len}")]
    PathTooShort { len: usize },

    #[error("unknown routing algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("scoring weights must sum to 1.0, got {sum}")]
    InvalidScoringWeights { sum: f64 },
}
