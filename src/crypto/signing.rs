//! Ed25519 signature operations for proof authenticity.
//!
//! Owner-side `sign_fingerprint` raises `ProofError::Crypto` on malformed
//! input. Verification is fail-closed: a malformed key, malformed
//! signature, or any decode failure resolves to `false`, never to an
//! assumed pass.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use ed25519_dalek::{
    Signature, Signer, SigningKey, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH,
    SIGNATURE_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::SignatureAlgorithm;
use crate::infra::{ProofError, Result};

/// Domain prefix for receipt hashing.
const DOMAIN_RECEIPT: &[u8] = b"PROOF_RECEIPT_V1";

/// Generate a fresh Ed25519 signing key, base64-encoded.
pub fn generate_signing_key() -> String {
    let key = SigningKey::generate(&mut OsRng);
    BASE64.encode(key.to_bytes())
}

/// Derive the base64 public key for a base64-encoded Ed25519 secret key.
pub fn derive_public_key(secret_key_b64: &str) -> Result<String> {
    let bytes = BASE64
        .decode(secret_key_b64)
        .map_err(|_| ProofError::Crypto("malformed secret key encoding".to_string()))?;
    let bytes: [u8; SECRET_KEY_LENGTH] = bytes
        .try_into()
        .map_err(|_| ProofError::Crypto("invalid secret key length".to_string()))?;
    let key = SigningKey::from_bytes(&bytes);
    Ok(BASE64.encode(key.verifying_key().to_bytes()))
}

/// Sign a fingerprint with a base64-encoded Ed25519 secret key.
///
/// Returns the signature base64-encoded.
pub fn sign_fingerprint(
    fingerprint: &str,
    secret_key_b64: &str,
    algorithm: SignatureAlgorithm,
) -> Result<String> {
    match algorithm {
        SignatureAlgorithm::Ed25519 => {
            let bytes = BASE64
                .decode(secret_key_b64)
                .map_err(|_| ProofError::Crypto("malformed secret key encoding".to_string()))?;
            let bytes: [u8; SECRET_KEY_LENGTH] = bytes
                .try_into()
                .map_err(|_| ProofError::Crypto("invalid secret key length".to_string()))?;
            let key = SigningKey::from_bytes(&bytes);
            let signature = key.sign(fingerprint.as_bytes());
            Ok(BASE64.encode(signature.to_bytes()))
        }
    }
}

/// Verify a base64-encoded signature over a fingerprint.
///
/// Any malformed input yields `false`.
pub fn verify_fingerprint_signature(
    fingerprint: &str,
    signature_b64: &str,
    public_key_b64: &str,
    algorithm: SignatureAlgorithm,
) -> bool {
    match algorithm {
        SignatureAlgorithm::Ed25519 => {
            let Ok(key_bytes) = BASE64.decode(public_key_b64) else {
                debug!("signature check failed: public key is not valid base64");
                return false;
            };
            let Ok(key_bytes) = <[u8; PUBLIC_KEY_LENGTH]>::try_from(key_bytes.as_slice()) else {
                debug!("signature check failed: public key has wrong length");
                return false;
            };
            let Ok(public_key) = VerifyingKey::from_bytes(&key_bytes) else {
                debug!("signature check failed: public key is not a valid curve point");
                return false;
            };

            let Ok(sig_bytes) = BASE64.decode(signature_b64) else {
                debug!("signature check failed: signature is not valid base64");
                return false;
            };
            let Ok(sig_bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(sig_bytes.as_slice()) else {
                debug!("signature check failed: signature has wrong length");
                return false;
            };
            let signature = Signature::from_bytes(&sig_bytes);

            public_key.verify(fingerprint.as_bytes(), &signature).is_ok()
        }
    }
}

/// Countersigned verification outcome returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedReceipt {
    /// Hex hash of the receipt preimage.
    pub receipt_hash: String,
    /// Base64 Ed25519 signature over the receipt hash.
    pub signature: String,
    /// Base64 public key of the signing service.
    pub public_key: String,
    pub signature_alg: String,
}

/// Process-wide key-management object for receipt signing.
///
/// Constructed once at startup from configuration and passed by reference
/// to the verification service; never a hidden global.
pub struct ReceiptSigner {
    key: SigningKey,
}

impl ReceiptSigner {
    /// Load the signing key from its base64 encoding.
    pub fn from_base64(secret_key_b64: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(secret_key_b64)
            .map_err(|_| ProofError::Crypto("malformed receipt signing key".to_string()))?;
        let bytes: [u8; SECRET_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| ProofError::Crypto("invalid receipt signing key length".to_string()))?;
        Ok(Self {
            key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Generate an ephemeral signer (tests, local development).
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.key.verifying_key().to_bytes())
    }

    /// Countersign a verification outcome.
    pub fn sign_receipt(
        &self,
        proof_link: &str,
        valid: bool,
        verified_at: DateTime<Utc>,
    ) -> SignedReceipt {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_RECEIPT);
        hasher.update(proof_link.as_bytes());
        hasher.update([valid as u8]);
        hasher.update(verified_at.to_rfc3339().as_bytes());
        let receipt_hash = hasher.finalize();

        let signature = self.key.sign(&receipt_hash);

        SignedReceipt {
            receipt_hash: hex::encode(receipt_hash),
            signature: BASE64.encode(signature.to_bytes()),
            public_key: self.public_key_base64(),
            signature_alg: SignatureAlgorithm::Ed25519.as_str().to_string(),
        }
    }
}
