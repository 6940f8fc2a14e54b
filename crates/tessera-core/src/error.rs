//! Error types for Tessera.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Artifact errors
    #[error("Invalid license signature: {0}")]
    InvalidSignature(String),

    #[error("Malformed license artifact: {0}")]
    MalformedArtifact(String),

    // Validity window
    #[error("License expired")]
    Expired,

    #[error("License not yet valid")]
    NotYetValid,

    // Policy errors
    #[error("License is for product {actual}, expected {expected}")]
    ProductMismatch { expected: String, actual: String },

    #[error("License does not include feature: {0}")]
    MissingFeature(String),

    #[error("License quantity exceeded: requested {requested}, licensed {limit}")]
    QuantityExceeded { requested: u64, limit: u64 },

    // Key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // Configuration
    #[error("Configuration error: {0}")]
    Config(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
