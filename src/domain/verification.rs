//! Append-only verification audit entries and verifier identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VerificationMethod;

/// Marker recorded for unauthenticated verifiers.
pub const ANONYMOUS_VERIFIER: &str = "anonymous";

/// Who is making a request against the registry.
///
/// Identity resolution itself is the external identity provider's job;
/// this is the resolved result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User(Uuid),
    Admin(Uuid),
}

impl Requester {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Requester::Anonymous => None,
            Requester::User(id) | Requester::Admin(id) => Some(*id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Requester::Admin(_))
    }

    /// Identity string recorded in the audit trail.
    pub fn audit_name(&self) -> String {
        match self {
            Requester::Anonymous => ANONYMOUS_VERIFIER.to_string(),
            Requester::User(id) | Requester::Admin(id) => id.to_string(),
        }
    }
}

/// Request context captured alongside each verification.
#[derive(Debug, Clone, Default)]
pub struct VerifierContext {
    pub requester: Option<Requester>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl VerifierContext {
    pub fn requester(&self) -> Requester {
        self.requester.unwrap_or(Requester::Anonymous)
    }
}

/// One append-only audit entry, owned by its proof.
///
/// Rows are created, never mutated; they disappear only when the parent
/// proof is deleted (cascade).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofVerification {
    pub id: Uuid,
    pub proof_id: Uuid,
    pub verified_by: String,
    pub verification_result: bool,
    pub verification_method: VerificationMethod,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
    pub verified_at: DateTime<Utc>,
}

impl ProofVerification {
    /// Build an audit entry for a verification attempt.
    pub fn new(
        proof_id: Uuid,
        result: bool,
        method: VerificationMethod,
        context: &VerifierContext,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            proof_id,
            verified_by: context.requester().audit_name(),
            verification_result: result,
            verification_method: method,
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
            metadata,
            verified_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_requester_is_recorded_as_such() {
        let ctx = VerifierContext::default();
        let entry = ProofVerification::new(
            Uuid::new_v4(),
            true,
            VerificationMethod::Hash,
            &ctx,
            serde_json::json!({}),
        );
        assert_eq!(entry.verified_by, ANONYMOUS_VERIFIER);
        assert!(entry.verification_result);
    }

    #[test]
    fn user_requester_is_recorded_by_id() {
        let id = Uuid::new_v4();
        let ctx = VerifierContext {
            requester: Some(Requester::User(id)),
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: None,
        };
        let entry = ProofVerification::new(
            Uuid::new_v4(),
            false,
            VerificationMethod::Combined,
            &ctx,
            serde_json::json!({"hash_match": false}),
        );
        assert_eq!(entry.verified_by, id.to_string());
        assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.9"));
    }
}
