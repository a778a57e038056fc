//! Core domain types for the proof registry.
//!
//! Everything a proof is made of lives here: the content-addressed `Proof`
//! record, its append-only `ProofVerification` audit entries, and the closed
//! enums that make invalid states unrepresentable.

mod proof;
mod verification;

pub use proof::{
    HashAlgorithm, Proof, ProofStatus, ProofType, SignatureAlgorithm, VerificationMethod,
};
pub use verification::{ProofVerification, Requester, VerifierContext, ANONYMOUS_VERIFIER};
