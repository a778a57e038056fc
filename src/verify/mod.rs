//! The verification protocol.
//!
//! Recomputes the fingerprint of submitted content against the stored one,
//! folds in the optional signature and AI signals, appends the audit entry,
//! and settles a pending proof's status on its first evidence-backed
//! verification. Fail-closed throughout: expiry beats a matching hash, a
//! configured-but-missing signature fails, and any internal fault resolves
//! to invalid.

mod aggregator;

pub use aggregator::{aggregate, TamperSignals, Verdict};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::ai::{AiAssessment, TamperAnalysisRequest, TamperAnalyzer};
use crate::crypto::{
    digests_equal, fingerprint, verify_fingerprint_signature, ReceiptSigner, SignedReceipt,
};
use crate::domain::{
    Proof, ProofStatus, ProofVerification, SignatureAlgorithm, VerificationMethod,
    VerifierContext,
};
use crate::infra::{ProofError, ProofStore, Result, VerificationUpdate};
use crate::policy::AccessPolicyGuard;

/// A verification request: the link plus optional re-submitted evidence.
#[derive(Debug, Clone, Default)]
pub struct VerifyRequest {
    pub proof_link: String,
    /// Raw content to re-fingerprint with the proof's stored algorithm.
    pub content: Option<Vec<u8>>,
    /// Pre-computed digest, used only when no content is submitted.
    pub fingerprint: Option<String>,
}

/// Why a verification came back invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Expired,
    HashMismatch,
    SignatureMismatch,
    TamperDetected,
    NotYetVerified,
}

/// Result of one verification attempt.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOutcome {
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

/// Orchestrates the full verify protocol.
pub struct VerificationService {
    store: Arc<dyn ProofStore>,
    guard: Arc<AccessPolicyGuard>,
    analyzer: Option<Arc<dyn TamperAnalyzer>>,
    ai_timeout: Duration,
    receipt_signer: Option<Arc<ReceiptSigner>>,
}

impl VerificationService {
    pub fn new(store: Arc<dyn ProofStore>, guard: Arc<AccessPolicyGuard>) -> Self {
        Self {
            store,
            guard,
            analyzer: None,
            ai_timeout: Duration::from_secs(3),
            receipt_signer: None,
        }
    }

    /// Attach the external AI tamper analyzer with its call timeout.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn TamperAnalyzer>, timeout: Duration) -> Self {
        self.analyzer = Some(analyzer);
        self.ai_timeout = timeout;
        self
    }

    /// Countersign outcomes with the process receipt key.
    pub fn with_receipt_signer(mut self, signer: Arc<ReceiptSigner>) -> Self {
        self.receipt_signer = Some(signer);
        self
    }

    /// Run the verification protocol for one request.
    #[instrument(skip(self, request, context), fields(proof_link = %request.proof_link))]
    pub async fn verify(
        &self,
        request: VerifyRequest,
        context: &VerifierContext,
    ) -> Result<VerifyOutcome> {
        let proof = self
            .store
            .get_by_link(&request.proof_link)
            .await?
            .ok_or_else(|| ProofError::NotFound(request.proof_link.clone()))?;

        self.guard
            .check_visible(&proof, &context.requester())
            .await?;

        // Expiry short-circuits before any hash comparison: a matching
        // digest never resurrects an expired proof. The transition and
        // the audit row commit in one transaction.
        let now = Utc::now();
        if proof.is_expired_at(now) {
            let record = ProofVerification::new(
                proof.id,
                false,
                proof.verification_method,
                context,
                serde_json::json!({"reason": "expired"}),
            );
            let update = VerificationUpdate {
                expire: proof.status.can_transition_to(ProofStatus::Expired),
                ..VerificationUpdate::default()
            };
            let updated = self.store.record_verification(&record, &update).await?;
            return Ok(self.outcome(&updated, false, 0.0, Some(FailureReason::Expired), record.verified_at));
        }

        // Recompute with the proof's stored algorithm; a caller-supplied
        // algorithm would invite confusion attacks.
        let submitted_hash = match (&request.content, &request.fingerprint) {
            (Some(content), _) => Some(fingerprint(content, proof.hash_algorithm)),
            (None, Some(digest)) => Some(digest.trim().to_lowercase()),
            (None, None) => None,
        };

        match submitted_hash {
            Some(submitted) => self.verify_evidence(proof, &submitted, context).await,
            None => self.verify_link_only(proof, context).await,
        }
    }

    /// Evidence-backed verification: hash, optional signature, optional AI.
    async fn verify_evidence(
        &self,
        proof: Proof,
        submitted_hash: &str,
        context: &VerifierContext,
    ) -> Result<VerifyOutcome> {
        let hash_match = digests_equal(submitted_hash, &proof.file_hash);

        let signature_match = if proof.verification_method.includes_signature() {
            Some(self.evaluate_signature(&proof, submitted_hash))
        } else {
            None
        };

        let (ai, ai_skipped) = if proof.verification_method.includes_ai() {
            self.ai_assessment(&proof, submitted_hash, hash_match).await
        } else {
            (None, false)
        };

        let signals = TamperSignals {
            hash_match,
            signature_match,
            ai: ai.clone(),
        };
        let verdict = aggregate(&signals);

        let reason = if verdict.valid {
            None
        } else if !hash_match {
            Some(FailureReason::HashMismatch)
        } else if signature_match == Some(false) {
            Some(FailureReason::SignatureMismatch)
        } else {
            Some(FailureReason::TamperDetected)
        };

        let record = ProofVerification::new(
            proof.id,
            verdict.valid,
            proof.verification_method,
            context,
            serde_json::json!({
                "hash_match": hash_match,
                "signature_match": signature_match,
                "ai_skipped": ai_skipped,
            }),
        );

        // The first evidence-backed verification settles a pending proof;
        // the store applies the transition conditionally, so a concurrent
        // loser records its entry without touching status.
        let first_transition = (proof.status == ProofStatus::Pending).then(|| {
            if verdict.valid {
                ProofStatus::Verified
            } else {
                ProofStatus::Failed
            }
        });

        let updated = self
            .store
            .record_verification(
                &record,
                &VerificationUpdate {
                    first_transition,
                    ai,
                    ..VerificationUpdate::default()
                },
            )
            .await?;

        debug!(
            valid = verdict.valid,
            status = %updated.status,
            "verification recorded"
        );

        Ok(self.outcome(&updated, verdict.valid, verdict.confidence, reason, record.verified_at))
    }

    /// Link-only verification: no evidence submitted, so the outcome
    /// reflects the stored status and never settles a pending proof.
    async fn verify_link_only(
        &self,
        proof: Proof,
        context: &VerifierContext,
    ) -> Result<VerifyOutcome> {
        let valid = proof.status == ProofStatus::Verified;
        let record = ProofVerification::new(
            proof.id,
            valid,
            proof.verification_method,
            context,
            serde_json::json!({"mode": "link_only"}),
        );
        let updated = self
            .store
            .record_verification(&record, &VerificationUpdate::default())
            .await?;

        let confidence = match updated.ai_confidence_score {
            Some(score) if updated.ai_verified => score,
            _ if valid => 1.0,
            _ => 0.0,
        };
        let reason = (!valid).then_some(FailureReason::NotYetVerified);
        Ok(self.outcome(&updated, valid, confidence, reason, record.verified_at))
    }

    /// Signature check over the submitted fingerprint. A configured
    /// method with missing signature material fails closed.
    fn evaluate_signature(&self, proof: &Proof, submitted_hash: &str) -> bool {
        let (Some(signature), Some(public_key)) = (&proof.signature, &proof.public_key) else {
            warn!(proof_link = %proof.proof_link, "signature method configured but material missing");
            return false;
        };
        let algorithm = proof
            .signature_algorithm
            .unwrap_or(SignatureAlgorithm::Ed25519);
        verify_fingerprint_signature(submitted_hash, signature, public_key, algorithm)
    }

    /// Bounded-timeout AI call. Unavailable or timed out means the signal
    /// is absent — never a veto, never a pass — and the skip is recorded.
    async fn ai_assessment(
        &self,
        proof: &Proof,
        submitted_hash: &str,
        hash_match: bool,
    ) -> (Option<AiAssessment>, bool) {
        let Some(analyzer) = &self.analyzer else {
            return (None, true);
        };

        let request = TamperAnalysisRequest::for_proof(proof, submitted_hash, hash_match);
        match tokio::time::timeout(self.ai_timeout, analyzer.analyze(&request)).await {
            Ok(Ok(assessment)) => (Some(assessment), false),
            Ok(Err(e)) => {
                warn!(error = %e, "AI tamper analysis failed; treating signal as absent");
                (None, true)
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.ai_timeout.as_millis() as u64,
                    "AI tamper analysis timed out; treating signal as absent"
                );
                (None, true)
            }
        }
    }

    fn outcome(
        &self,
        proof: &Proof,
        valid: bool,
        confidence: f64,
        reason: Option<FailureReason>,
        verified_at: DateTime<Utc>,
    ) -> VerifyOutcome {
        let receipt = self
            .receipt_signer
            .as_ref()
            .map(|signer| signer.sign_receipt(&proof.proof_link, valid, verified_at));

        VerifyOutcome {
            valid,
            status: proof.status,
            verification_method: proof.verification_method,
            confidence,
            reason,
            verification_count: proof.verification_count,
            verified_at,
            receipt,
        }
    }
}
