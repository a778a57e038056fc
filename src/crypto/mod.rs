//! Cryptographic primitives for the proof registry.
//!
//! Provides:
//! - Content fingerprinting (SHA-256/SHA-512, legacy MD5), one-shot and
//!   streaming
//! - Ed25519 signature creation and fail-closed verification
//! - Receipt signing for verification outcomes

mod fingerprint;
mod signing;

pub use fingerprint::{digests_equal, fingerprint, Fingerprinter};
pub use signing::{
    derive_public_key, generate_signing_key, sign_fingerprint, verify_fingerprint_signature,
    ReceiptSigner, SignedReceipt,
};

#[cfg(test)]
mod tests;
