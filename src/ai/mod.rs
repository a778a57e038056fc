//! External AI tamper-analysis collaborator.
//!
//! Best-effort and advisory only: the verification service bounds every
//! call with a short timeout and treats an unavailable assessment as
//! absent, never as a veto and never as a pass.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::domain::{Proof, ProofType};
use crate::infra::{ProofError, Result};

/// Assessment returned by the tamper-analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAssessment {
    pub tamper_detected: bool,
    /// Confidence in the assessment, in [0, 1].
    pub confidence: f64,
}

/// What the analyzer is asked to assess.
#[derive(Debug, Clone, Serialize)]
pub struct TamperAnalysisRequest {
    pub proof_link: String,
    pub proof_type: ProofType,
    pub stored_hash: String,
    pub submitted_hash: String,
    pub hash_match: bool,
}

impl TamperAnalysisRequest {
    pub fn for_proof(proof: &Proof, submitted_hash: &str, hash_match: bool) -> Self {
        Self {
            proof_link: proof.proof_link.clone(),
            proof_type: proof.proof_type,
            stored_hash: proof.file_hash.clone(),
            submitted_hash: submitted_hash.to_string(),
            hash_match,
        }
    }
}

/// External tamper-analysis service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TamperAnalyzer: Send + Sync {
    /// Request an assessment for a verification attempt.
    async fn analyze(&self, request: &TamperAnalysisRequest) -> Result<AiAssessment>;
}

/// HTTP client for the tamper-analysis service.
pub struct HttpTamperAnalyzer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTamperAnalyzer {
    /// Build a client with a request-level timeout.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProofError::Configuration(format!("AI analyzer client: {e}")))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl TamperAnalyzer for HttpTamperAnalyzer {
    async fn analyze(&self, request: &TamperAnalysisRequest) -> Result<AiAssessment> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ProofError::Internal(format!("AI analyzer request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ProofError::Internal(format!("AI analyzer returned error: {e}")))?;

        response
            .json::<AiAssessment>()
            .await
            .map_err(|e| ProofError::Internal(format!("AI analyzer response malformed: {e}")))
    }
}
