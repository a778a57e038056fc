//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use prooflink_registry::domain::{ProofType, Requester, VerifierContext};
use prooflink_registry::infra::SqliteProofStore;
use prooflink_registry::policy::{AccessPolicyGuard, NoShareGrants};
use prooflink_registry::registry::{CreateProof, ProofContent, ProofRegistry};
use prooflink_registry::verify::VerificationService;
use prooflink_registry::ProofStore;

/// Test owner ID
pub fn test_owner_id() -> Uuid {
    Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap()
}

/// A second, unrelated owner
pub fn other_owner_id() -> Uuid {
    Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap()
}

/// Test admin ID
pub fn test_admin_id() -> Uuid {
    Uuid::parse_str("33333333-3333-3333-3333-333333333333").unwrap()
}

/// Anonymous verifier context with fixed request attribution.
pub fn anonymous_context() -> VerifierContext {
    VerifierContext {
        requester: None,
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("tests/1.0".to_string()),
    }
}

/// Verifier context for a known user.
pub fn user_context(owner_id: Uuid) -> VerifierContext {
    VerifierContext {
        requester: Some(Requester::User(owner_id)),
        ip_address: None,
        user_agent: None,
    }
}

/// In-memory SQLite store with migrations applied.
///
/// A single connection keeps every handle on the same in-memory database.
pub async fn memory_store() -> Arc<SqliteProofStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("sqlite in-memory pool");
    prooflink_registry::migrations::run_sqlite(&pool)
        .await
        .expect("sqlite migrations");
    Arc::new(SqliteProofStore::new(pool))
}

/// Registry and verifier wired over one in-memory store.
pub struct TestHarness {
    pub store: Arc<SqliteProofStore>,
    pub registry: ProofRegistry,
    pub verifier: VerificationService,
}

pub async fn harness() -> TestHarness {
    let store = memory_store().await;
    let guard = Arc::new(AccessPolicyGuard::new(Arc::new(NoShareGrants)));
    let dyn_store: Arc<dyn ProofStore> = store.clone();
    let registry = ProofRegistry::new(dyn_store.clone(), guard.clone());
    let verifier = VerificationService::new(dyn_store, guard);
    TestHarness {
        store,
        registry,
        verifier,
    }
}

/// Minimal public create request over raw bytes.
pub fn create_request(owner_id: Uuid, content: &[u8]) -> CreateProof {
    CreateProof::from_bytes(owner_id, ProofType::File, content.to_vec())
}

/// Private variant of [`create_request`].
pub fn private_create_request(owner_id: Uuid, content: &[u8]) -> CreateProof {
    let mut request = create_request(owner_id, content);
    request.is_public = false;
    request
}

/// Precomputed-fingerprint create request.
pub fn precomputed_request(owner_id: Uuid, fingerprint: &str) -> CreateProof {
    let mut request = create_request(owner_id, b"");
    request.content = ProofContent::Precomputed {
        fingerprint: fingerprint.to_string(),
    };
    request
}
