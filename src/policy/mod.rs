//! Visibility, ownership, and download policy evaluation.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use crate::domain::{Proof, Requester};
use crate::infra::{ProofError, Result};

/// External ACL/sharing collaborator: answers whether a requester holds an
/// explicit grant on a proof.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ShareGrants: Send + Sync {
    async fn has_grant(&self, proof_id: Uuid, requester: Uuid) -> Result<bool>;
}

/// Sharing backend that grants nothing; the default when no sharing
/// service is wired in.
pub struct NoShareGrants;

#[async_trait]
impl ShareGrants for NoShareGrants {
    async fn has_grant(&self, _proof_id: Uuid, _requester: Uuid) -> Result<bool> {
        Ok(false)
    }
}

/// Evaluates who may see, download, or delete a proof.
///
/// Expired proofs stay visible for audit purposes; reporting them as
/// currently valid is the verification service's problem, not this one's.
pub struct AccessPolicyGuard {
    grants: Arc<dyn ShareGrants>,
}

impl AccessPolicyGuard {
    pub fn new(grants: Arc<dyn ShareGrants>) -> Self {
        Self { grants }
    }

    /// Public proofs are visible to anyone for verification; private
    /// proofs only to the owner, admins, or explicit grantees.
    pub async fn check_visible(&self, proof: &Proof, requester: &Requester) -> Result<()> {
        if proof.is_public || self.has_access(proof, requester).await? {
            Ok(())
        } else {
            Err(ProofError::PermissionDenied(
                "proof is private".to_string(),
            ))
        }
    }

    /// Download additionally requires the proof to be downloadable.
    pub async fn check_download(&self, proof: &Proof, requester: &Requester) -> Result<()> {
        if !proof.is_downloadable {
            return Err(ProofError::PermissionDenied(
                "proof content is not downloadable".to_string(),
            ));
        }
        if proof.is_public || self.has_access(proof, requester).await? {
            Ok(())
        } else {
            Err(ProofError::PermissionDenied(
                "no download access to this proof".to_string(),
            ))
        }
    }

    /// Deletion is owner-or-admin only; share grants never confer it.
    pub fn check_delete(&self, proof: &Proof, requester: &Requester) -> Result<()> {
        if requester.is_admin() || requester.user_id() == Some(proof.owner_id) {
            Ok(())
        } else {
            Err(ProofError::PermissionDenied(
                "only the owner or an admin may delete a proof".to_string(),
            ))
        }
    }

    async fn has_access(&self, proof: &Proof, requester: &Requester) -> Result<bool> {
        if requester.is_admin() {
            return Ok(true);
        }
        match requester.user_id() {
            Some(user_id) if user_id == proof.owner_id => Ok(true),
            Some(user_id) => self.grants.has_grant(proof.id, user_id).await,
            None => Ok(false),
        }
    }
}
