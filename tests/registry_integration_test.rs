//! Registry integration tests over an in-memory SQLite store.
//!
//! Cover proof creation, link issuance, listing, history access control,
//! download policy, and cascade deletion.

mod common;

use common::*;

use prooflink_registry::domain::{
    HashAlgorithm, ProofStatus, Requester, SignatureAlgorithm, VerificationMethod,
};
use prooflink_registry::registry::PROOF_LINK_PREFIX;
use prooflink_registry::ProofError;

const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

#[tokio::test]
async fn create_persists_pending_proof_with_fingerprint() {
    let h = harness().await;

    let proof = h
        .registry
        .create(create_request(test_owner_id(), b"hello world"))
        .await
        .unwrap();

    assert!(proof.proof_link.starts_with(PROOF_LINK_PREFIX));
    assert_eq!(proof.status, ProofStatus::Pending);
    assert_eq!(proof.file_hash, HELLO_SHA256);
    assert_eq!(proof.hash_algorithm, HashAlgorithm::Sha256);
    assert_eq!(proof.verification_count, 0);
    assert_eq!(proof.view_count, 0);
    assert_eq!(proof.download_count, 0);

    // And it round-trips through the store.
    let fetched = h.registry.get(&proof.proof_link).await.unwrap();
    assert_eq!(fetched.id, proof.id);
    assert_eq!(fetched.file_hash, HELLO_SHA256);
    assert_eq!(fetched.status, ProofStatus::Pending);
}

#[tokio::test]
async fn same_content_yields_distinct_links() {
    let h = harness().await;

    let a = h
        .registry
        .create(create_request(test_owner_id(), b"duplicate content"))
        .await
        .unwrap();
    let b = h
        .registry
        .create(create_request(test_owner_id(), b"duplicate content"))
        .await
        .unwrap();

    assert_eq!(a.file_hash, b.file_hash);
    assert_ne!(a.proof_link, b.proof_link);
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn precomputed_fingerprint_is_validated() {
    let h = harness().await;

    let proof = h
        .registry
        .create(precomputed_request(test_owner_id(), HELLO_SHA256))
        .await
        .unwrap();
    assert_eq!(proof.file_hash, HELLO_SHA256);
    assert_eq!(proof.file_size, None);

    // Uppercase digests normalize to lowercase.
    let upper = h
        .registry
        .create(precomputed_request(
            test_owner_id(),
            &HELLO_SHA256.to_uppercase(),
        ))
        .await
        .unwrap();
    assert_eq!(upper.file_hash, HELLO_SHA256);

    // Wrong length for the algorithm is rejected.
    let err = h
        .registry
        .create(precomputed_request(test_owner_id(), "deadbeef"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::Configuration(_)));

    // Non-hex is rejected.
    let err = h
        .registry
        .create(precomputed_request(
            test_owner_id(),
            &"z".repeat(HELLO_SHA256.len()),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::Configuration(_)));
}

#[tokio::test]
async fn signature_method_requires_material() {
    let h = harness().await;

    let mut request = create_request(test_owner_id(), b"signed content");
    request.verification_method = VerificationMethod::Combined;
    // No signature or public key supplied.
    let err = h.registry.create(request).await.unwrap_err();
    assert!(matches!(err, ProofError::Configuration(_)));

    // With material, creation succeeds and defaults the algorithm.
    let secret = prooflink_registry::crypto::generate_signing_key();
    let digest =
        prooflink_registry::crypto::fingerprint(b"signed content", HashAlgorithm::Sha256);
    let signature = prooflink_registry::crypto::sign_fingerprint(
        &digest,
        &secret,
        SignatureAlgorithm::Ed25519,
    )
    .unwrap();
    let public_key = prooflink_registry::crypto::derive_public_key(&secret).unwrap();

    let mut request = create_request(test_owner_id(), b"signed content");
    request.verification_method = VerificationMethod::Combined;
    request.signature = Some(signature);
    request.public_key = Some(public_key);
    let proof = h.registry.create(request).await.unwrap();
    assert_eq!(proof.signature_algorithm, Some(SignatureAlgorithm::Ed25519));
}

#[tokio::test]
async fn past_expiry_is_rejected_at_create() {
    let h = harness().await;

    let mut request = create_request(test_owner_id(), b"late");
    request.expires_at = Some(chrono::Utc::now() - chrono::Duration::hours(1));
    let err = h.registry.create(request).await.unwrap_err();
    assert!(matches!(err, ProofError::Configuration(_)));
}

#[tokio::test]
async fn unknown_link_is_not_found() {
    let h = harness().await;
    let err = h.registry.get("pl_does_not_exist").await.unwrap_err();
    assert!(matches!(err, ProofError::NotFound(_)));
}

#[tokio::test]
async fn private_proof_is_hidden_from_strangers() {
    let h = harness().await;

    let proof = h
        .registry
        .create(private_create_request(test_owner_id(), b"secret"))
        .await
        .unwrap();

    // Owner sees it.
    h.registry
        .get_visible(&proof.proof_link, &Requester::User(test_owner_id()))
        .await
        .unwrap();

    // Admin sees it.
    h.registry
        .get_visible(&proof.proof_link, &Requester::Admin(test_admin_id()))
        .await
        .unwrap();

    // A stranger does not.
    let err = h
        .registry
        .get_visible(&proof.proof_link, &Requester::User(other_owner_id()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::PermissionDenied(_)));

    // Nor does an anonymous caller.
    let err = h
        .registry
        .get_visible(&proof.proof_link, &Requester::Anonymous)
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::PermissionDenied(_)));
}

#[tokio::test]
async fn owner_listing_pages_newest_first() {
    let h = harness().await;

    for i in 0..5 {
        h.registry
            .create(create_request(
                test_owner_id(),
                format!("content {i}").as_bytes(),
            ))
            .await
            .unwrap();
    }
    // Another owner's proof must not leak into the listing.
    h.registry
        .create(create_request(other_owner_id(), b"not mine"))
        .await
        .unwrap();

    let (page, total) = h.registry.list_owned(test_owner_id(), 3, 0).await.unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(total, 5);
    assert!(page.iter().all(|p| p.owner_id == test_owner_id()));

    let (rest, total) = h.registry.list_owned(test_owner_id(), 3, 3).await.unwrap();
    assert_eq!(rest.len(), 2);
    assert_eq!(total, 5);
}

#[tokio::test]
async fn batch_create_mints_every_proof() {
    let h = harness().await;

    let requests = (0..4)
        .map(|i| create_request(test_owner_id(), format!("batch {i}").as_bytes()))
        .collect();
    let proofs = h.registry.create_batch(requests).await.unwrap();

    assert_eq!(proofs.len(), 4);
    let mut links: Vec<_> = proofs.iter().map(|p| p.proof_link.clone()).collect();
    links.sort();
    links.dedup();
    assert_eq!(links.len(), 4);
}

#[tokio::test]
async fn history_is_owner_or_admin_only() {
    let h = harness().await;

    let proof = h
        .registry
        .create(create_request(test_owner_id(), b"audited"))
        .await
        .unwrap();

    h.registry
        .history(&Requester::User(test_owner_id()), &proof.proof_link, 10, 0)
        .await
        .unwrap();
    h.registry
        .history(&Requester::Admin(test_admin_id()), &proof.proof_link, 10, 0)
        .await
        .unwrap();

    let err = h
        .registry
        .history(&Requester::User(other_owner_id()), &proof.proof_link, 10, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::PermissionDenied(_)));
}

#[tokio::test]
async fn download_requires_policy_and_counts() {
    let h = harness().await;

    // Not downloadable: even the owner is refused.
    let mut request = create_request(test_owner_id(), b"no downloads");
    request.content_url = Some("https://store.example/obj/1".to_string());
    let sealed = h.registry.create(request).await.unwrap();
    let err = h
        .registry
        .download_url(&Requester::User(test_owner_id()), &sealed.proof_link)
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::PermissionDenied(_)));

    // Downloadable: URL comes back and the counter moves.
    let mut request = create_request(test_owner_id(), b"downloadable");
    request.is_downloadable = true;
    request.content_url = Some("https://store.example/obj/2".to_string());
    let open = h.registry.create(request).await.unwrap();

    let url = h
        .registry
        .download_url(&Requester::User(test_owner_id()), &open.proof_link)
        .await
        .unwrap();
    assert_eq!(url, "https://store.example/obj/2");

    let after = h.registry.get(&open.proof_link).await.unwrap();
    assert_eq!(after.download_count, 1);
}

#[tokio::test]
async fn delete_is_owner_or_admin_only_and_cascades() {
    let h = harness().await;

    let proof = h
        .registry
        .create(create_request(test_owner_id(), b"to delete"))
        .await
        .unwrap();

    // A verification exists before deletion.
    h.verifier
        .verify(
            prooflink_registry::VerifyRequest {
                proof_link: proof.proof_link.clone(),
                content: Some(b"to delete".to_vec()),
                fingerprint: None,
            },
            &anonymous_context(),
        )
        .await
        .unwrap();

    // A stranger may not delete.
    let err = h
        .registry
        .delete(&Requester::User(other_owner_id()), &proof.proof_link)
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::PermissionDenied(_)));

    // The owner may; link and audit rows are gone afterwards.
    h.registry
        .delete(&Requester::User(test_owner_id()), &proof.proof_link)
        .await
        .unwrap();

    let err = h.registry.get(&proof.proof_link).await.unwrap_err();
    assert!(matches!(err, ProofError::NotFound(_)));

    use prooflink_registry::ProofStore;
    let orphans = h.store.list_verifications(proof.id, 10, 0).await.unwrap();
    assert!(orphans.is_empty());
}
