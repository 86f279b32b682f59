//! Error types for the railflow analytics engine

use thiserror::Error;

/// Result type alias for railflow operations
pub type Result<T> = std::result::Result<T, RailflowError>;

/// Main error type for the analytics engine.
///
/// Insufficient-data conditions never surface here: the engine degrades
/// those to documented defaults (empty predictions, zero correlation, no
/// flags). These variants cover caller contract violations and internal
/// shape mismatches only.
#[derive(Error, Debug, Clone)]
pub enum RailflowError {
    /// Caller passed an argument outside its contract (k = 0, k > n, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Series shapes do not line up for a pairwise computation
    #[error("Shape mismatch: {0}")]
    ShapeError(String),

    /// Data-level failure (empty registry in a context that requires one)
    #[error("Data error: {0}")]
    DataError(String),
}
