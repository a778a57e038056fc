//! Error types for the proof registry.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::ProofStatus;

/// Errors that can occur across the registry and verification path.
#[derive(Error, Debug)]
pub enum ProofError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unknown proof link
    #[error("proof not found: {0}")]
    NotFound(String),

    /// Visibility or ownership violation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Unsupported algorithm or invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed key or signature on the signing side; verification
    /// failures never raise this, they fail closed to `false`.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Proof link generation retries exhausted
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invalid status transition
    #[error("invalid state transition for proof {proof_id}: {from} -> {to}")]
    InvalidStateTransition {
        proof_id: Uuid,
        from: ProofStatus,
        to: ProofStatus,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProofError {
    /// Whether this is a unique-constraint violation from the store,
    /// used by proof-link generation to retry on collision.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            ProofError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, ProofError>;
