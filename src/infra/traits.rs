//! Trait definition for the durable proof store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use crate::ai::AiAssessment;
use crate::domain::{Proof, ProofStatus, ProofVerification};

use super::Result;

/// Changes applied to a proof alongside an audit entry, all in one
/// transaction.
#[derive(Debug, Clone, Default)]
pub struct VerificationUpdate {
    /// `pending -> verified|failed` transition to attempt. The store
    /// applies it conditionally (`WHERE status = 'pending'`), so at most
    /// one concurrent verifier wins the race; losers record their entry
    /// without touching status.
    pub first_transition: Option<ProofStatus>,
    /// AI assessment to persist on the proof, when one was returned.
    pub ai: Option<AiAssessment>,
    /// Transition the proof to `expired` alongside the audit entry.
    /// Applied conditionally (`status <> 'expired'`) in the same
    /// transaction, so the transition and its audit row commit together.
    pub expire: bool,
}

/// Durable, transactional system of record for proofs and their audit
/// trail. Implementations must be safe to share across process instances;
/// nothing here may rely on process-local mutable state.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProofStore: Send + Sync {
    /// Insert a freshly created proof.
    ///
    /// A `proof_link` collision surfaces as a unique-violation database
    /// error so the registry can retry link generation.
    async fn insert_proof(&self, proof: &Proof) -> Result<()>;

    /// Fetch a proof by its external link.
    async fn get_by_link(&self, proof_link: &str) -> Result<Option<Proof>>;

    /// Page through an owner's proofs, newest first. Returns the page and
    /// the owner's total count.
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Proof>, i64)>;

    /// Delete a proof and (cascade) its verification history.
    /// Returns false when the proof did not exist.
    async fn delete_proof(&self, proof_id: Uuid) -> Result<bool>;

    /// Append an audit entry and apply the coupled proof mutations
    /// (counter increment, `last_verified_at`, optional first transition,
    /// optional AI fields) in a single transaction. Returns the updated
    /// proof.
    async fn record_verification(
        &self,
        record: &ProofVerification,
        update: &VerificationUpdate,
    ) -> Result<Proof>;

    /// Read a proof's audit trail, newest first.
    async fn list_verifications(
        &self,
        proof_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProofVerification>>;

    /// Sweep: expire every proof whose `expires_at` is before `now`.
    /// Returns how many rows transitioned.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Increment the view counter.
    async fn record_view(&self, proof_id: Uuid) -> Result<()>;

    /// Increment the download counter.
    async fn record_download(&self, proof_id: Uuid) -> Result<()>;

    /// Connectivity check for health reporting.
    async fn ping(&self) -> Result<()>;
}
