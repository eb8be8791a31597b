//! Error types for quadnet.

use thiserror::Error;

/// The main error type for quadnet operations.
#[derive(Debug, Error)]
pub enum QuadnetError {
    /// Candle tensor operation failed
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Entity name not present in the fixed index
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// Relation name not present in the fixed index
    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    /// Name supplied twice (or colliding with a generated inverse) at construction
    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    /// Unrecognised layer variant, policy type, device or out-of-range option
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Qualifier value that cannot be reified as an entity
    #[error("invalid qualifier {key}: {reason}")]
    InvalidQualifier { key: String, reason: String },

    /// Encoded batch disagrees with itself
    #[error("consistency violation: expected {expected}, got {got}")]
    Consistency { expected: usize, got: usize },

    /// Sample without an `agent` node reached the explore head
    #[error("sample {sample} has no agent node")]
    MissingAgent { sample: usize },

    /// Question without exactly one `?` in head or tail position
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    /// JSON input or configuration failed to parse
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a configuration or batch file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for quadnet operations.
pub type Result<T> = std::result::Result<T, QuadnetError>;
