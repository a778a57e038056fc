//! The `Proof` record and its closed classification enums.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::ProofError;

/// Digest algorithm for content fingerprinting.
///
/// MD5 is retained only so legacy records stay verifiable; it is
/// cryptographically weak and must not be chosen for new proofs where
/// tamper detection matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
    Md5,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Md5 => "md5",
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha512 => 64,
            HashAlgorithm::Md5 => 16,
        }
    }

    /// True for algorithms kept only for legacy-record compatibility.
    pub fn is_weak(&self) -> bool {
        matches!(self, HashAlgorithm::Md5)
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha256
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "md5" => Ok(HashAlgorithm::Md5),
            other => Err(ProofError::Configuration(format!(
                "unsupported hash algorithm: {other}"
            ))),
        }
    }
}

/// What kind of content a proof covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofType {
    File,
    Text,
    Image,
    Document,
    Video,
    Audio,
    Code,
    Other,
}

impl ProofType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofType::File => "file",
            ProofType::Text => "text",
            ProofType::Image => "image",
            ProofType::Document => "document",
            ProofType::Video => "video",
            ProofType::Audio => "audio",
            ProofType::Code => "code",
            ProofType::Other => "other",
        }
    }
}

impl Default for ProofType {
    fn default() -> Self {
        ProofType::File
    }
}

impl From<&str> for ProofType {
    fn from(s: &str) -> Self {
        match s {
            "file" => ProofType::File,
            "text" => ProofType::Text,
            "image" => ProofType::Image,
            "document" => ProofType::Document,
            "video" => ProofType::Video,
            "audio" => ProofType::Audio,
            "code" => ProofType::Code,
            _ => ProofType::Other,
        }
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof lifecycle state.
///
/// Transitions are one-directional: `pending -> {verified, failed}` on the
/// first evidence-backed verification, and any state `-> expired` once past
/// `expires_at`. A proof never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofStatus {
    Pending,
    Verified,
    Failed,
    Expired,
}

impl ProofStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofStatus::Pending => "pending",
            ProofStatus::Verified => "verified",
            ProofStatus::Failed => "failed",
            ProofStatus::Expired => "expired",
        }
    }

    /// Whether `self -> to` is a legal transition.
    pub fn can_transition_to(&self, to: ProofStatus) -> bool {
        match (self, to) {
            (ProofStatus::Pending, ProofStatus::Verified)
            | (ProofStatus::Pending, ProofStatus::Failed) => true,
            (_, ProofStatus::Expired) => !matches!(self, ProofStatus::Expired),
            _ => false,
        }
    }
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofStatus {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProofStatus::Pending),
            "verified" => Ok(ProofStatus::Verified),
            "failed" => Ok(ProofStatus::Failed),
            "expired" => Ok(ProofStatus::Expired),
            other => Err(ProofError::Internal(format!(
                "unknown proof status: {other}"
            ))),
        }
    }
}

/// How a proof is checked at verification time.
///
/// Methods are conjunctive: `combined` requires hash AND signature to pass,
/// `ai_assisted` requires hash AND no AI tamper veto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    Hash,
    Signature,
    Combined,
    AiAssisted,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMethod::Hash => "hash",
            VerificationMethod::Signature => "signature",
            VerificationMethod::Combined => "combined",
            VerificationMethod::AiAssisted => "ai_assisted",
        }
    }

    /// Whether this method requires a passing digital signature check.
    pub fn includes_signature(&self) -> bool {
        matches!(
            self,
            VerificationMethod::Signature | VerificationMethod::Combined
        )
    }

    /// Whether the external AI tamper signal participates in the verdict.
    pub fn includes_ai(&self) -> bool {
        matches!(self, VerificationMethod::AiAssisted)
    }
}

impl Default for VerificationMethod {
    fn default() -> Self {
        VerificationMethod::Hash
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationMethod {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hash" => Ok(VerificationMethod::Hash),
            "signature" => Ok(VerificationMethod::Signature),
            "combined" => Ok(VerificationMethod::Combined),
            "ai_assisted" => Ok(VerificationMethod::AiAssisted),
            other => Err(ProofError::Configuration(format!(
                "unknown verification method: {other}"
            ))),
        }
    }
}

/// Asymmetric signature scheme for proof authenticity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    Ed25519,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Ed25519 => "ed25519",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(SignatureAlgorithm::Ed25519),
            other => Err(ProofError::Crypto(format!(
                "unsupported signature algorithm: {other}"
            ))),
        }
    }
}

/// The content-addressed trust record.
///
/// `file_hash` and `hash_algorithm` are write-once: they are the proof's
/// content identity and no code path updates them after creation.
/// `proof_link` is globally unique and never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    pub id: Uuid,
    pub proof_link: String,
    pub owner_id: Uuid,
    pub proof_type: ProofType,
    pub status: ProofStatus,

    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub content_type: Option<String>,
    /// Reference into the external object store; raw bytes are never
    /// persisted here.
    pub content_url: Option<String>,

    /// Lowercase hex digest of the content.
    pub file_hash: String,
    pub hash_algorithm: HashAlgorithm,

    pub signature: Option<String>,
    pub signature_algorithm: Option<SignatureAlgorithm>,
    pub public_key: Option<String>,

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
}

impl Proof {
    /// Whether the proof is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_algorithm_parsing() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("SHA-512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert!("sha3".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn md5_is_flagged_weak() {
        assert!(HashAlgorithm::Md5.is_weak());
        assert!(!HashAlgorithm::Sha256.is_weak());
        assert!(!HashAlgorithm::Sha512.is_weak());
    }

    #[test]
    fn status_transitions_are_one_directional() {
        use ProofStatus::*;

        assert!(Pending.can_transition_to(Verified));
        assert!(Pending.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Expired));
        assert!(Verified.can_transition_to(Expired));
        assert!(Failed.can_transition_to(Expired));

        assert!(!Verified.can_transition_to(Pending));
        assert!(!Verified.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Verified));
        assert!(!Expired.can_transition_to(Verified));
        assert!(!Expired.can_transition_to(Expired));
    }

    #[test]
    fn verification_method_composition() {
        assert!(!VerificationMethod::Hash.includes_signature());
        assert!(VerificationMethod::Signature.includes_signature());
        assert!(VerificationMethod::Combined.includes_signature());
        assert!(VerificationMethod::AiAssisted.includes_ai());
        assert!(!VerificationMethod::Combined.includes_ai());
    }

    #[test]
    fn expiry_check() {
        let mut proof = test_proof();
        assert!(!proof.is_expired_at(Utc::now()));

        proof.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        assert!(proof.is_expired_at(Utc::now()));

        proof.expires_at = Some(Utc::now() + chrono::Duration::hours(1));
        assert!(!proof.is_expired_at(Utc::now()));
    }

    fn test_proof() -> Proof {
        Proof {
            id: Uuid::new_v4(),
            proof_link: "pl_test".to_string(),
            owner_id: Uuid::new_v4(),
            proof_type: ProofType::File,
            status: ProofStatus::Pending,
            file_name: None,
            file_size: None,
            content_type: None,
            content_url: None,
            file_hash: "00".repeat(32),
            hash_algorithm: HashAlgorithm::Sha256,
            signature: None,
            signature_algorithm: None,
            public_key: None,
            verification_method: VerificationMethod::Hash,
            is_public: true,
            is_downloadable: false,
            expires_at: None,
            ai_verified: false,
            ai_confidence_score: None,
            ai_tamper_detected: false,
            verification_count: 0,
            last_verified_at: None,
            view_count: 0,
            download_count: 0,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }
}
