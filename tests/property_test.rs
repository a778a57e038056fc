//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold for any valid input.

use proptest::prelude::*;

use prooflink_registry::ai::AiAssessment;
use prooflink_registry::crypto::{
    derive_public_key, fingerprint, generate_signing_key, sign_fingerprint,
    verify_fingerprint_signature,
};
use prooflink_registry::domain::{HashAlgorithm, SignatureAlgorithm};
use prooflink_registry::registry::{generate_proof_link, PROOF_LINK_PREFIX};
use prooflink_registry::verify::{aggregate, TamperSignals};

// ============================================================================
// Custom Strategies
// ============================================================================

fn arb_content() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..2048)
}

fn arb_ai() -> impl Strategy<Value = Option<AiAssessment>> {
    prop_oneof![
        Just(None),
        (any::<bool>(), 0.0f64..=1.0).prop_map(|(tamper_detected, confidence)| {
            Some(AiAssessment {
                tamper_detected,
                confidence,
            })
        }),
    ]
}

fn arb_signals() -> impl Strategy<Value = TamperSignals> {
    (any::<bool>(), any::<Option<bool>>(), arb_ai()).prop_map(
        |(hash_match, signature_match, ai)| TamperSignals {
            hash_match,
            signature_match,
            ai,
        },
    )
}

// ============================================================================
// Proof Link Properties
// ============================================================================

proptest! {
    #[test]
    fn proof_links_are_url_safe_and_prefixed(_seed in any::<u8>()) {
        let link = generate_proof_link();
        prop_assert!(link.starts_with(PROOF_LINK_PREFIX));
        let token = &link[PROOF_LINK_PREFIX.len()..];
        // 24 random bytes in unpadded base64.
        prop_assert_eq!(token.len(), 32);
        prop_assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}

#[test]
fn proof_links_do_not_repeat() {
    let mut links = std::collections::HashSet::new();
    for _ in 0..1000 {
        assert!(links.insert(generate_proof_link()));
    }
}

// ============================================================================
// Signature Properties
// ============================================================================

proptest! {
    #[test]
    fn signature_round_trip_verifies(content in arb_content()) {
        let secret = generate_signing_key();
        let public = derive_public_key(&secret).unwrap();
        let digest = fingerprint(&content, HashAlgorithm::Sha256);

        let signature =
            sign_fingerprint(&digest, &secret, SignatureAlgorithm::Ed25519).unwrap();
        prop_assert!(verify_fingerprint_signature(
            &digest,
            &signature,
            &public,
            SignatureAlgorithm::Ed25519
        ));
    }

    #[test]
    fn signature_binds_the_fingerprint(a in arb_content(), b in arb_content()) {
        prop_assume!(a != b);
        let secret = generate_signing_key();
        let public = derive_public_key(&secret).unwrap();
        let digest_a = fingerprint(&a, HashAlgorithm::Sha256);
        let digest_b = fingerprint(&b, HashAlgorithm::Sha256);

        let signature =
            sign_fingerprint(&digest_a, &secret, SignatureAlgorithm::Ed25519).unwrap();
        prop_assert!(!verify_fingerprint_signature(
            &digest_b,
            &signature,
            &public,
            SignatureAlgorithm::Ed25519
        ));
    }

    #[test]
    fn malformed_signature_material_never_verifies(
        content in arb_content(),
        garbage in "[a-zA-Z0-9+/=]{0,100}",
    ) {
        let secret = generate_signing_key();
        let public = derive_public_key(&secret).unwrap();
        let digest = fingerprint(&content, HashAlgorithm::Sha256);

        let signature =
            sign_fingerprint(&digest, &secret, SignatureAlgorithm::Ed25519).unwrap();
        prop_assume!(garbage != signature);
        prop_assert!(!verify_fingerprint_signature(
            &digest,
            &garbage,
            &public,
            SignatureAlgorithm::Ed25519
        ));
    }
}

// ============================================================================
// Signal Aggregation Properties
// ============================================================================

proptest! {
    #[test]
    fn valid_verdict_requires_every_check(signals in arb_signals()) {
        let verdict = aggregate(&signals);
        if verdict.valid {
            prop_assert!(signals.hash_match);
            prop_assert!(signals.signature_match.unwrap_or(true));
            prop_assert!(!signals.ai.as_ref().map(|a| a.tamper_detected).unwrap_or(false));
        }
    }

    #[test]
    fn ai_tamper_flag_always_vetoes(
        hash_match in any::<bool>(),
        signature_match in any::<Option<bool>>(),
        confidence in 0.0f64..=1.0,
    ) {
        let verdict = aggregate(&TamperSignals {
            hash_match,
            signature_match,
            ai: Some(AiAssessment {
                tamper_detected: true,
                confidence,
            }),
        });
        prop_assert!(!verdict.valid);
    }

    #[test]
    fn confidence_is_always_a_probability(signals in arb_signals()) {
        let verdict = aggregate(&signals);
        prop_assert!((0.0..=1.0).contains(&verdict.confidence));
    }
}
