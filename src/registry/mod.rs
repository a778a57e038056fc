//! Proof registry: creation, identifier issuance, retrieval, deletion.
//!
//! The registry orchestrates; durable storage belongs to the store, policy
//! decisions to the guard. Its own responsibilities are fingerprinting the
//! submitted content, issuing a globally unique unguessable proof link,
//! and authorization on delete/history/download.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::crypto::fingerprint;
use crate::domain::{
    HashAlgorithm, Proof, ProofStatus, ProofType, ProofVerification, Requester,
    SignatureAlgorithm, VerificationMethod,
};
use crate::infra::{ProofError, ProofStore, Result};
use crate::policy::AccessPolicyGuard;

/// Prefix marking registry-issued proof links.
pub const PROOF_LINK_PREFIX: &str = "pl_";

/// Random bytes per proof link; 24 bytes is comfortably past the
/// 16-byte unguessability floor.
const PROOF_LINK_BYTES: usize = 24;

/// Attempts before giving up on link generation.
const MAX_LINK_ATTEMPTS: u32 = 5;

/// Generate a cryptographically random, URL-safe proof link.
pub fn generate_proof_link() -> String {
    let mut bytes = [0u8; PROOF_LINK_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("{}{}", PROOF_LINK_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
}

/// Content submitted at creation time: raw bytes to fingerprint here, or
/// a digest the client computed themselves.
#[derive(Debug, Clone)]
pub enum ProofContent {
    Bytes(Vec<u8>),
    Precomputed { fingerprint: String },
}

/// Everything needed to mint a proof.
#[derive(Debug, Clone)]
pub struct CreateProof {
    pub owner_id: Uuid,
    pub proof_type: ProofType,
    pub content: ProofContent,
    pub hash_algorithm: HashAlgorithm,
    pub verification_method: VerificationMethod,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub content_url: Option<String>,
    pub signature: Option<String>,
    pub signature_algorithm: Option<SignatureAlgorithm>,
    pub public_key: Option<String>,
    pub is_public: bool,
    pub is_downloadable: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl CreateProof {
    /// Minimal request for content bytes; everything else defaulted.
    pub fn from_bytes(owner_id: Uuid, proof_type: ProofType, content: Vec<u8>) -> Self {
        Self {
            owner_id,
            proof_type,
            content: ProofContent::Bytes(content),
            hash_algorithm: HashAlgorithm::default(),
            verification_method: VerificationMethod::default(),
            file_name: None,
            content_type: None,
            content_url: None,
            signature: None,
            signature_algorithm: None,
            public_key: None,
            is_public: true,
            is_downloadable: false,
            expires_at: None,
            metadata: serde_json::json!({}),
        }
    }
}

/// Orchestrates proof lifecycle against the durable store.
pub struct ProofRegistry {
    store: Arc<dyn ProofStore>,
    guard: Arc<AccessPolicyGuard>,
}

impl ProofRegistry {
    pub fn new(store: Arc<dyn ProofStore>, guard: Arc<AccessPolicyGuard>) -> Self {
        Self { store, guard }
    }

    /// Create a proof: fingerprint content, issue a link, persist with
    /// `status = pending` and all counters zero.
    #[instrument(skip(self, request), fields(owner_id = %request.owner_id, proof_type = %request.proof_type))]
    pub async fn create(&self, request: CreateProof) -> Result<Proof> {
        let (file_hash, file_size) = match &request.content {
            ProofContent::Bytes(bytes) => (
                fingerprint(bytes, request.hash_algorithm),
                Some(bytes.len() as i64),
            ),
            ProofContent::Precomputed { fingerprint } => {
                let digest = fingerprint.trim().to_lowercase();
                let expected = request.hash_algorithm.digest_len() * 2;
                if digest.len() != expected || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(ProofError::Configuration(format!(
                        "precomputed fingerprint is not a valid {} digest",
                        request.hash_algorithm
                    )));
                }
                (digest, None)
            }
        };

        if request.hash_algorithm.is_weak() {
            warn!(
                algorithm = %request.hash_algorithm,
                "creating proof with a weak hash algorithm; legacy compatibility only"
            );
        }

        if request.verification_method.includes_signature()
            && (request.signature.is_none() || request.public_key.is_none())
        {
            return Err(ProofError::Configuration(format!(
                "verification method {} requires a signature and public key",
                request.verification_method
            )));
        }

        let now = Utc::now();
        if let Some(expires_at) = request.expires_at {
            if expires_at <= now {
                return Err(ProofError::Configuration(
                    "expires_at must be in the future".to_string(),
                ));
            }
        }

        let signature_algorithm = match (&request.signature, request.signature_algorithm) {
            (Some(_), None) => Some(SignatureAlgorithm::Ed25519),
            (_, algorithm) => algorithm,
        };

        let mut proof = Proof {
            id: Uuid::new_v4(),
            proof_link: String::new(),
            owner_id: request.owner_id,
            proof_type: request.proof_type,
            status: ProofStatus::Pending,
            file_name: request.file_name,
            file_size,
            content_type: request.content_type,
            content_url: request.content_url,
            file_hash,
            hash_algorithm: request.hash_algorithm,
            signature: request.signature,
            signature_algorithm,
            public_key: request.public_key,
            verification_method: request.verification_method,
            is_public: request.is_public,
            is_downloadable: request.is_downloadable,
            expires_at: request.expires_at,
            ai_verified: false,
            ai_confidence_score: None,
            ai_tamper_detected: false,
            verification_count: 0,
            last_verified_at: None,
            view_count: 0,
            download_count: 0,
            metadata: request.metadata,
            created_at: now,
        };

        for attempt in 1..=MAX_LINK_ATTEMPTS {
            proof.proof_link = generate_proof_link();
            match self.store.insert_proof(&proof).await {
                Ok(()) => {
                    info!(proof_link = %proof.proof_link, "proof created");
                    return Ok(proof);
                }
                Err(e) if e.is_unique_violation() => {
                    warn!(attempt, "proof link collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(ProofError::Conflict(format!(
            "proof link generation exhausted after {MAX_LINK_ATTEMPTS} attempts"
        )))
    }

    /// Create several proofs in one call. Fails fast on the first error.
    pub async fn create_batch(&self, requests: Vec<CreateProof>) -> Result<Vec<Proof>> {
        let mut proofs = Vec::with_capacity(requests.len());
        for request in requests {
            proofs.push(self.create(request).await?);
        }
        Ok(proofs)
    }

    /// Fetch a proof by link.
    pub async fn get(&self, proof_link: &str) -> Result<Proof> {
        self.store
            .get_by_link(proof_link)
            .await?
            .ok_or_else(|| ProofError::NotFound(proof_link.to_string()))
    }

    /// Fetch a proof the requester is allowed to see.
    pub async fn get_visible(&self, proof_link: &str, requester: &Requester) -> Result<Proof> {
        let proof = self.get(proof_link).await?;
        self.guard.check_visible(&proof, requester).await?;
        Ok(proof)
    }

    /// Page through a requester's own proofs.
    pub async fn list_owned(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Proof>, i64)> {
        self.store.list_by_owner(owner_id, limit, offset).await
    }

    /// Read a proof's verification history. Owner or admin only.
    pub async fn history(
        &self,
        requester: &Requester,
        proof_link: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProofVerification>> {
        let proof = self.get(proof_link).await?;
        if !requester.is_admin() && requester.user_id() != Some(proof.owner_id) {
            return Err(ProofError::PermissionDenied(
                "verification history is restricted to the owner".to_string(),
            ));
        }
        self.store.list_verifications(proof.id, limit, offset).await
    }

    /// Resolve the external object-store URL for download, after the
    /// download policy check, and bump the download counter.
    pub async fn download_url(&self, requester: &Requester, proof_link: &str) -> Result<String> {
        let proof = self.get(proof_link).await?;
        self.guard.check_download(&proof, requester).await?;

        let url = proof.content_url.clone().ok_or_else(|| {
            ProofError::NotFound(format!("no stored content for {proof_link}"))
        })?;

        self.store.record_download(proof.id).await?;
        Ok(url)
    }

    /// Delete a proof and its verification history. Owner or admin only.
    #[instrument(skip(self, requester))]
    pub async fn delete(&self, requester: &Requester, proof_link: &str) -> Result<()> {
        let proof = self.get(proof_link).await?;
        self.guard.check_delete(&proof, requester)?;

        if self.store.delete_proof(proof.id).await? {
            info!(proof_link, "proof deleted");
            Ok(())
        } else {
            // Lost a race with another deleter.
            Err(ProofError::NotFound(proof_link.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proof_links_are_prefixed_and_url_safe() {
        let link = generate_proof_link();
        assert!(link.starts_with(PROOF_LINK_PREFIX));
        // 24 bytes -> 32 base64 characters, no padding.
        assert_eq!(link.len(), PROOF_LINK_PREFIX.len() + 32);
        assert!(link
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-'));
    }

    #[test]
    fn proof_links_are_independent_draws() {
        let a = generate_proof_link();
        let b = generate_proof_link();
        assert_ne!(a, b);
    }
}
