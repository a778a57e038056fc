//! PostgreSQL proof store.
//!
//! The production system of record. All multi-row writes (audit entry plus
//! the coupled proof mutations) happen inside a single transaction so a
//! cancelled request never leaves a half-written record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    HashAlgorithm, Proof, ProofStatus, ProofType, ProofVerification, SignatureAlgorithm,
    VerificationMethod,
};
use crate::infra::{ProofStore, Result, VerificationUpdate};

const PROOF_COLUMNS: &str = "id, proof_link, owner_id, proof_type, status, \
     file_name, file_size, content_type, content_url, \
     file_hash, hash_algorithm, signature, signature_algorithm, public_key, \
     verification_method, is_public, is_downloadable, expires_at, \
     ai_verified, ai_confidence_score, ai_tamper_detected, \
     verification_count, last_verified_at, view_count, download_count, \
     metadata, created_at";

/// PostgreSQL-backed proof store.
pub struct PgProofStore {
    pool: PgPool,
}

impl PgProofStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create from a connection string.
    pub async fn from_url(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct ProofRow {
    id: Uuid,
    proof_link: String,
    owner_id: Uuid,
    proof_type: String,
    status: String,
    file_name: Option<String>,
    file_size: Option<i64>,
    content_type: Option<String>,
    content_url: Option<String>,
    file_hash: String,
    hash_algorithm: String,
    signature: Option<String>,
    signature_algorithm: Option<String>,
    public_key: Option<String>,
    verification_method: String,
    is_public: bool,
    is_downloadable: bool,
    expires_at: Option<DateTime<Utc>>,
    ai_verified: bool,
    ai_confidence_score: Option<f64>,
    ai_tamper_detected: bool,
    verification_count: i64,
    last_verified_at: Option<DateTime<Utc>>,
    view_count: i64,
    download_count: i64,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProofRow> for Proof {
    type Error = crate::infra::ProofError;

    fn try_from(row: ProofRow) -> Result<Proof> {
        Ok(Proof {
            id: row.id,
            proof_link: row.proof_link,
            owner_id: row.owner_id,
            proof_type: ProofType::from(row.proof_type.as_str()),
            status: row.status.parse::<ProofStatus>()?,
            file_name: row.file_name,
            file_size: row.file_size,
            content_type: row.content_type,
            content_url: row.content_url,
            file_hash: row.file_hash,
            hash_algorithm: row.hash_algorithm.parse::<HashAlgorithm>()?,
            signature: row.signature,
            signature_algorithm: row
                .signature_algorithm
                .as_deref()
                .map(str::parse::<SignatureAlgorithm>)
                .transpose()?,
            public_key: row.public_key,
            verification_method: row.verification_method.parse::<VerificationMethod>()?,
            is_public: row.is_public,
            is_downloadable: row.is_downloadable,
            expires_at: row.expires_at,
            ai_verified: row.ai_verified,
            ai_confidence_score: row.ai_confidence_score,
            ai_tamper_detected: row.ai_tamper_detected,
            verification_count: row.verification_count,
            last_verified_at: row.last_verified_at,
            view_count: row.view_count,
            download_count: row.download_count,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct VerificationRow {
    id: Uuid,
    proof_id: Uuid,
    verified_by: String,
    verification_result: bool,
    verification_method: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    metadata: serde_json::Value,
    verified_at: DateTime<Utc>,
}

impl TryFrom<VerificationRow> for ProofVerification {
    type Error = crate::infra::ProofError;

    fn try_from(row: VerificationRow) -> Result<ProofVerification> {
        Ok(ProofVerification {
            id: row.id,
            proof_id: row.proof_id,
            verified_by: row.verified_by,
            verification_result: row.verification_result,
            verification_method: row.verification_method.parse::<VerificationMethod>()?,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            metadata: row.metadata,
            verified_at: row.verified_at,
        })
    }
}

#[async_trait]
impl ProofStore for PgProofStore {
    async fn insert_proof(&self, proof: &Proof) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO proofs ({PROOF_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
              $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)"
        ))
        .bind(proof.id)
        .bind(&proof.proof_link)
        .bind(proof.owner_id)
        .bind(proof.proof_type.as_str())
        .bind(proof.status.as_str())
        .bind(&proof.file_name)
        .bind(proof.file_size)
        .bind(&proof.content_type)
        .bind(&proof.content_url)
        .bind(&proof.file_hash)
        .bind(proof.hash_algorithm.as_str())
        .bind(&proof.signature)
        .bind(proof.signature_algorithm.map(|a| a.as_str()))
        .bind(&proof.public_key)
        .bind(proof.verification_method.as_str())
        .bind(proof.is_public)
        .bind(proof.is_downloadable)
        .bind(proof.expires_at)
        .bind(proof.ai_verified)
        .bind(proof.ai_confidence_score)
        .bind(proof.ai_tamper_detected)
        .bind(proof.verification_count)
        .bind(proof.last_verified_at)
        .bind(proof.view_count)
        .bind(proof.download_count)
        .bind(&proof.metadata)
        .bind(proof.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_by_link(&self, proof_link: &str) -> Result<Option<Proof>> {
        let row = sqlx::query_as::<_, ProofRow>(&format!(
            "SELECT {PROOF_COLUMNS} FROM proofs WHERE proof_link = $1"
        ))
        .bind(proof_link)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Proof::try_from).transpose()
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Proof>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proofs WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ProofRow>(&format!(
            "SELECT {PROOF_COLUMNS} FROM proofs \
             WHERE owner_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let proofs = rows
            .into_iter()
            .map(Proof::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((proofs, total))
    }

    async fn delete_proof(&self, proof_id: Uuid) -> Result<bool> {
        // Verification rows go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM proofs WHERE id = $1")
            .bind(proof_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_verification(
        &self,
        record: &ProofVerification,
        update: &VerificationUpdate,
    ) -> Result<Proof> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO proof_verifications \
             (id, proof_id, verified_by, verification_result, verification_method, \
              ip_address, user_agent, metadata, verified_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(record.id)
        .bind(record.proof_id)
        .bind(&record.verified_by)
        .bind(record.verification_result)
        .bind(record.verification_method.as_str())
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(&record.metadata)
        .bind(record.verified_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE proofs \
             SET verification_count = verification_count + 1, last_verified_at = $2 \
             WHERE id = $1",
        )
        .bind(record.proof_id)
        .bind(record.verified_at)
        .execute(&mut *tx)
        .await?;

        if let Some(status) = update.first_transition {
            // Only one concurrent verifier observes this transition.
            sqlx::query("UPDATE proofs SET status = $2 WHERE id = $1 AND status = 'pending'")
                .bind(record.proof_id)
                .bind(status.as_str())
                .execute(&mut *tx)
                .await?;
        }

        if update.expire {
            sqlx::query("UPDATE proofs SET status = 'expired' WHERE id = $1 AND status <> 'expired'")
                .bind(record.proof_id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(ai) = &update.ai {
            sqlx::query(
                "UPDATE proofs \
                 SET ai_verified = $2, ai_confidence_score = $3, ai_tamper_detected = $4 \
                 WHERE id = $1",
            )
            .bind(record.proof_id)
            .bind(!ai.tamper_detected)
            .bind(ai.confidence)
            .bind(ai.tamper_detected)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, ProofRow>(&format!(
            "SELECT {PROOF_COLUMNS} FROM proofs WHERE id = $1"
        ))
        .bind(record.proof_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Proof::try_from(row)
    }

    async fn list_verifications(
        &self,
        proof_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProofVerification>> {
        let rows = sqlx::query_as::<_, VerificationRow>(
            "SELECT id, proof_id, verified_by, verification_result, verification_method, \
                    ip_address, user_agent, metadata, verified_at \
             FROM proof_verifications \
             WHERE proof_id = $1 ORDER BY verified_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(proof_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProofVerification::try_from).collect()
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE proofs SET status = 'expired' \
             WHERE expires_at IS NOT NULL AND expires_at < $1 AND status <> 'expired'",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn record_view(&self, proof_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE proofs SET view_count = view_count + 1 WHERE id = $1")
            .bind(proof_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_download(&self, proof_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE proofs SET download_count = download_count + 1 WHERE id = $1")
            .bind(proof_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
