/// Core data-model and configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid location ({x}, {y}): {reason}")]
    InvalidLocation { x: f64, y: f64, reason: String },

    #[error("invalid snapshot for vehicle {vehicle_id}: {reason}")]
    InvalidSnapshot { vehicle_id: String, reason: String },

    #[error("invalid traffic summary: {0}")]
    InvalidTraffic(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
