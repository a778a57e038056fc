//! Unit tests for fingerprinting and signature operations.

use proptest::prelude::*;

use super::fingerprint::{digests_equal, fingerprint, Fingerprinter};
use super::signing::{
    derive_public_key, generate_signing_key, sign_fingerprint, verify_fingerprint_signature,
    ReceiptSigner,
};
use crate::domain::{HashAlgorithm, SignatureAlgorithm};

// ============================================================================
// Known-answer vectors
// ============================================================================

#[test]
fn sha256_hello_world_vector() {
    assert_eq!(
        fingerprint(b"hello world", HashAlgorithm::Sha256),
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
}

#[test]
fn sha512_hello_world_vector() {
    assert_eq!(
        fingerprint(b"hello world", HashAlgorithm::Sha512),
        "309ecc489c12d6eb4cc40f50c902f2b4d0ed77ee511a7c7a9bcd3ca86d4cd86f\
         989dd35bc5ff499670da34255b45b0cfd830e81f605dcf7dc5542e93ae9cd76f"
    );
}

#[test]
fn md5_hello_world_vector() {
    assert_eq!(
        fingerprint(b"hello world", HashAlgorithm::Md5),
        "5eb63bbbe01eeed093cb22bb8f5acdc3"
    );
}

#[test]
fn single_byte_change_alters_digest() {
    let base = fingerprint(b"hello world", HashAlgorithm::Sha256);
    let changed = fingerprint(b"hello world!", HashAlgorithm::Sha256);
    assert_ne!(base, changed);
}

#[test]
fn digest_comparison_ignores_hex_case() {
    let digest = fingerprint(b"hello world", HashAlgorithm::Sha256);
    assert!(digests_equal(&digest, &digest.to_uppercase()));
    assert!(!digests_equal(&digest, &digest[..32]));
}

// ============================================================================
// Streaming computation
// ============================================================================

#[test]
fn streaming_matches_one_shot() {
    let content = vec![0xabu8; 1 << 16];
    for algorithm in [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
        HashAlgorithm::Md5,
    ] {
        let mut hasher = Fingerprinter::new(algorithm);
        for chunk in content.chunks(4096) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finalize(), fingerprint(&content, algorithm));
    }
}

// ============================================================================
// Property-based tests
// ============================================================================

proptest! {
    /// Identical bytes and algorithm always yield an identical digest.
    #[test]
    fn prop_fingerprint_deterministic(data in any::<Vec<u8>>()) {
        prop_assert_eq!(
            fingerprint(&data, HashAlgorithm::Sha256),
            fingerprint(&data, HashAlgorithm::Sha256)
        );
        prop_assert_eq!(
            fingerprint(&data, HashAlgorithm::Sha512),
            fingerprint(&data, HashAlgorithm::Sha512)
        );
    }

    /// Distinct inputs produce distinct SHA-256 digests.
    #[test]
    fn prop_fingerprint_sensitivity(
        data1 in any::<Vec<u8>>(),
        data2 in any::<Vec<u8>>()
    ) {
        if data1 != data2 {
            prop_assert_ne!(
                fingerprint(&data1, HashAlgorithm::Sha256),
                fingerprint(&data2, HashAlgorithm::Sha256)
            );
        }
    }

    /// Digest length is fixed per algorithm.
    #[test]
    fn prop_fingerprint_length(data in any::<Vec<u8>>()) {
        prop_assert_eq!(fingerprint(&data, HashAlgorithm::Sha256).len(), 64);
        prop_assert_eq!(fingerprint(&data, HashAlgorithm::Sha512).len(), 128);
        prop_assert_eq!(fingerprint(&data, HashAlgorithm::Md5).len(), 32);
    }

    /// Streaming over arbitrary chunk splits equals the one-shot digest.
    #[test]
    fn prop_streaming_split(data in any::<Vec<u8>>(), split in any::<usize>()) {
        let split = if data.is_empty() { 0 } else { split % data.len() };
        let mut hasher = Fingerprinter::new(HashAlgorithm::Sha256);
        hasher.update(&data[..split]);
        hasher.update(&data[split..]);
        prop_assert_eq!(hasher.finalize(), fingerprint(&data, HashAlgorithm::Sha256));
    }
}

// ============================================================================
// Signature operations
// ============================================================================

#[test]
fn sign_and_verify_round_trip() {
    let secret = generate_signing_key();
    let digest = fingerprint(b"signed content", HashAlgorithm::Sha256);

    let signature = sign_fingerprint(&digest, &secret, SignatureAlgorithm::Ed25519).unwrap();
    let public_key = derive_public_key(&secret).unwrap();

    assert!(verify_fingerprint_signature(
        &digest,
        &signature,
        &public_key,
        SignatureAlgorithm::Ed25519
    ));
}

#[test]
fn verification_rejects_wrong_fingerprint() {
    let secret = generate_signing_key();
    let digest = fingerprint(b"signed content", HashAlgorithm::Sha256);
    let other = fingerprint(b"other content", HashAlgorithm::Sha256);

    let signature = sign_fingerprint(&digest, &secret, SignatureAlgorithm::Ed25519).unwrap();
    let public_key = derive_public_key(&secret).unwrap();

    assert!(!verify_fingerprint_signature(
        &other,
        &signature,
        &public_key,
        SignatureAlgorithm::Ed25519
    ));
}

#[test]
fn verification_fails_closed_on_malformed_input() {
    let secret = generate_signing_key();
    let digest = fingerprint(b"content", HashAlgorithm::Sha256);
    let signature = sign_fingerprint(&digest, &secret, SignatureAlgorithm::Ed25519).unwrap();
    let public_key = derive_public_key(&secret).unwrap();

    // Garbage public key
    assert!(!verify_fingerprint_signature(
        &digest,
        &signature,
        "not base64 !!!",
        SignatureAlgorithm::Ed25519
    ));
    // Truncated public key
    assert!(!verify_fingerprint_signature(
        &digest,
        &signature,
        "AAAA",
        SignatureAlgorithm::Ed25519
    ));
    // Garbage signature
    assert!(!verify_fingerprint_signature(
        &digest,
        "%%%%",
        &public_key,
        SignatureAlgorithm::Ed25519
    ));
    // Empty everything
    assert!(!verify_fingerprint_signature(
        &digest,
        "",
        "",
        SignatureAlgorithm::Ed25519
    ));
}

#[test]
fn signing_rejects_malformed_secret_key() {
    let digest = fingerprint(b"content", HashAlgorithm::Sha256);
    assert!(sign_fingerprint(&digest, "bad key", SignatureAlgorithm::Ed25519).is_err());
    assert!(sign_fingerprint(&digest, "AAAA", SignatureAlgorithm::Ed25519).is_err());
}

// ============================================================================
// Receipt signing
// ============================================================================

#[test]
fn receipt_signature_verifies_against_receipt_hash() {
    let signer = ReceiptSigner::generate();
    let verified_at = chrono::Utc::now();
    let receipt = signer.sign_receipt("pl_example", true, verified_at);

    assert_eq!(receipt.signature_alg, "ed25519");
    assert!(verify_fingerprint_signature_raw(
        &hex::decode(&receipt.receipt_hash).unwrap(),
        &receipt.signature,
        &receipt.public_key,
    ));

    // Flipping the outcome produces a different receipt hash.
    let other = signer.sign_receipt("pl_example", false, verified_at);
    assert_ne!(receipt.receipt_hash, other.receipt_hash);
}

fn verify_fingerprint_signature_raw(message: &[u8], signature_b64: &str, public_key_b64: &str) -> bool {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    let key_bytes: [u8; 32] = BASE64.decode(public_key_b64).unwrap().try_into().unwrap();
    let key = VerifyingKey::from_bytes(&key_bytes).unwrap();
    let sig_bytes: [u8; 64] = BASE64.decode(signature_b64).unwrap().try_into().unwrap();
    key.verify(message, &Signature::from_bytes(&sig_bytes)).is_ok()
}
