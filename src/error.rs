//! Error types for longbox-canon
//!
//! Absent metadata is never an error here: a field with no surviving
//! candidate is simply omitted from the canonical record. Errors are
//! reserved for caller mistakes (bad policy) and configuration I/O.

use thiserror::Error;

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, ResolutionError>;

/// Resolution engine errors
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Missing or invalid resolution policy (precondition failure,
    /// distinct from "no candidates")
    #[error("Policy error: {0}")]
    Policy(String),

    /// Configuration loading or parse error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (policy file read)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
