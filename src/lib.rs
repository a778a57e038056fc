//! Proof registry library
//!
//! Trust layer for verifiable content: fingerprint a piece of content,
//! mint an unguessable shareable proof link for it, and let anyone holding
//! the link verify integrity later. Every verification attempt is recorded
//! in an append-only audit trail, and verification fails closed.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (proofs, statuses, audit records)
//! - [`crypto`] - Fingerprinting, signature checks, signed receipts
//! - [`registry`] - Proof creation, link issuance, retrieval, deletion
//! - [`verify`] - The verification protocol and signal aggregation
//! - [`policy`] - Visibility and download policy
//! - [`ai`] - External tamper-analysis collaborator
//! - [`infra`] - Storage implementations (PostgreSQL, SQLite), expiry sweeper
//! - [`auth`] - Authentication (API keys, JWT)
//! - [`metrics`] - Observability counters
//! - [`api`] - REST API routes

pub mod ai;
pub mod api;
pub mod auth;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod metrics;
pub mod migrations;
pub mod policy;
pub mod registry;
pub mod server;
pub mod verify;

// Re-export commonly used types
pub use domain::{
    HashAlgorithm, Proof, ProofStatus, ProofType, ProofVerification, Requester,
    SignatureAlgorithm, VerificationMethod, VerifierContext,
};

pub use infra::{PgProofStore, ProofError, ProofStore, Result, SqliteProofStore};

pub use registry::{CreateProof, ProofContent, ProofRegistry};

pub use verify::{VerificationService, VerifyOutcome, VerifyRequest};
