//! Error types for wallet generation and distribution

use alloy_primitives::U256;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, DistributorError>;

/// Main error type for the library
#[derive(Debug, Error)]
pub enum DistributorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Distribution amount is zero or unparseable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Malformed recipient address
    #[error("Invalid recipient address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Wallet count outside the accepted range
    #[error("Invalid wallet count: {0} (must be at least 1)")]
    InvalidCount(usize),

    /// Funding wallet cannot cover the whole batch
    #[error("Insufficient balance: need {required} wei but have {available} wei")]
    InsufficientBalance { required: U256, available: U256 },

    /// Funding credential file missing or malformed
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Network or node-level RPC failure
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Local key handling or signing failure
    #[error("Signature error: {0}")]
    Signature(String),

    /// Persistence failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
