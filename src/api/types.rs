//! Shared request and response types for REST API handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::SignedReceipt;
use crate::domain::{
    HashAlgorithm, Proof, ProofStatus, ProofType, ProofVerification, SignatureAlgorithm,
    VerificationMethod,
};
use crate::verify::{FailureReason, VerifyOutcome};

// ============================================================================
// Proof creation types
// ============================================================================

/// Request body for proof creation.
///
/// Exactly one of `content_base64` or `fingerprint` must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProofRequest {
    pub proof_type: ProofType,
    /// Base64-encoded content to fingerprint server-side.
    pub content_base64: Option<String>,
    /// Pre-computed hex digest for content that never leaves the client.
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    #[serde(default)]
    pub verification_method: VerificationMethod,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub content_url: Option<String>,
    /// Base64-encoded detached signature over the fingerprint.
    pub signature: Option<String>,
    pub signature_algorithm: Option<SignatureAlgorithm>,
    /// Base64-encoded public key for signature verification.
    pub public_key: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub is_downloadable: bool,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
}

/// Request body for batch proof creation.
#[derive(Debug, Deserialize)]
pub struct CreateProofBatchRequest {
    pub proofs: Vec<CreateProofRequest>,
}

/// A single proof in API responses.
#[derive(Debug, Serialize)]
pub struct ProofResponse {
    pub id: Uuid,
    pub proof_link: String,
    pub owner_id: Uuid,
    pub proof_type: ProofType,
    pub status: ProofStatus,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub content_type: Option<String>,
    pub file_hash: String,
    pub hash_algorithm: HashAlgorithm,
    pub verification_method: VerificationMethod,
    pub is_public: bool,
    pub is_downloadable: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub ai_verified: bool,
    pub ai_confidence_score: Option<f64>,
    pub ai_tamper_detected: bool,
    pub verification_count: i64,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub download_count: i64,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Shareable verification URL for this proof.
    pub verify_url: String,
}

impl ProofResponse {
    pub fn from_proof(proof: &Proof, public_base_url: &str) -> Self {
        Self {
            id: proof.id,
            proof_link: proof.proof_link.clone(),
            owner_id: proof.owner_id,
            proof_type: proof.proof_type,
            status: proof.status,
            file_name: proof.file_name.clone(),
            file_size: proof.file_size,
            content_type: proof.content_type.clone(),
            file_hash: proof.file_hash.clone(),
            hash_algorithm: proof.hash_algorithm,
            verification_method: proof.verification_method,
            is_public: proof.is_public,
            is_downloadable: proof.is_downloadable,
            expires_at: proof.expires_at,
            ai_verified: proof.ai_verified,
            ai_confidence_score: proof.ai_confidence_score,
            ai_tamper_detected: proof.ai_tamper_detected,
            verification_count: proof.verification_count,
            last_verified_at: proof.last_verified_at,
            view_count: proof.view_count,
            download_count: proof.download_count,
            metadata: proof.metadata.clone(),
            created_at: proof.created_at,
            verify_url: format!("{}/v1/verify/{}", public_base_url, proof.proof_link),
        }
    }
}

/// Response for batch proof creation.
#[derive(Debug, Serialize)]
pub struct CreateProofBatchResponse {
    pub proofs: Vec<ProofResponse>,
    pub created: usize,
}

// ============================================================================
// Listing types
// ============================================================================

/// Query parameters for listing the caller's proofs.
#[derive(Debug, Deserialize)]
pub struct ListProofsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Paginated listing of the caller's proofs.
#[derive(Debug, Serialize)]
pub struct ListProofsResponse {
    pub proofs: Vec<ProofResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Query parameters for the verification history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// One entry of a proof's verification history.
#[derive(Debug, Serialize)]
pub struct VerificationEntryResponse {
    pub id: Uuid,
    pub verified_by: String,
    pub verification_result: bool,
    pub verification_method: VerificationMethod,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
    pub verified_at: DateTime<Utc>,
}

impl From<ProofVerification> for VerificationEntryResponse {
    fn from(record: ProofVerification) -> Self {
        Self {
            id: record.id,
            verified_by: record.verified_by,
            verification_result: record.verification_result,
            verification_method: record.verification_method,
            ip_address: record.ip_address,
            user_agent: record.user_agent,
            metadata: record.metadata,
            verified_at: record.verified_at,
        }
    }
}

/// Verification history for a proof.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub proof_link: String,
    pub verifications: Vec<VerificationEntryResponse>,
}

// ============================================================================
// Verification types
// ============================================================================

/// Request body for public verification.
///
/// Supplying `content_base64` or `fingerprint` makes this an
/// evidence-backed verification; omitting both checks the link only.
#[derive(Debug, Deserialize)]
pub struct VerifyRequestBody {
    pub proof_link: String,
    pub content_base64: Option<String>,
    pub fingerprint: Option<String>,
}

/// Response for a verification attempt.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub proof_link: String,
    pub valid: bool,
    pub status: ProofStatus,
    pub verification_method: VerificationMethod,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    pub verification_count: i64,
    pub verified_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SignedReceipt>,
}

impl VerifyResponse {
    pub fn from_outcome(proof_link: String, outcome: VerifyOutcome) -> Self {
        Self {
            proof_link,
            valid: outcome.valid,
            status: outcome.status,
            verification_method: outcome.verification_method,
            confidence: outcome.confidence,
            reason: outcome.reason,
            verification_count: outcome.verification_count,
            verified_at: outcome.verified_at,
            receipt: outcome.receipt,
        }
    }
}

/// Response for the download redirect endpoint.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub proof_link: String,
    pub download_url: String,
}

// ============================================================================
// Default value functions
// ============================================================================

pub fn default_true() -> bool {
    true
}

pub fn default_metadata() -> serde_json::Value {
    serde_json::json!({})
}
