//! SQLite proof store.
//!
//! Used for local development and the integration test suite. UUIDs and
//! timestamps are stored as TEXT (hyphenated / RFC 3339), matching the
//! sqlite migration schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    HashAlgorithm, Proof, ProofStatus, ProofType, ProofVerification, SignatureAlgorithm,
    VerificationMethod,
};
use crate::infra::{ProofError, ProofStore, Result, VerificationUpdate};

const PROOF_COLUMNS: &str = "id, proof_link, owner_id, proof_type, status, \
     file_name, file_size, content_type, content_url, \
     file_hash, hash_algorithm, signature, signature_algorithm, public_key, \
     verification_method, is_public, is_downloadable, expires_at, \
     ai_verified, ai_confidence_score, ai_tamper_detected, \
     verification_count, last_verified_at, view_count, download_count, \
     metadata, created_at";

/// SQLite-backed proof store.
pub struct SqliteProofStore {
    pool: SqlitePool,
}

impl SqliteProofStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and apply migrations.
    pub async fn from_url(url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(url).await?;
        crate::migrations::run_sqlite(&pool)
            .await
            .map_err(|e| ProofError::Internal(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| ProofError::Internal(format!("invalid uuid in store: {e}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ProofError::Internal(format!("invalid timestamp in store: {e}")))
}

fn parse_json(s: &str) -> Result<serde_json::Value> {
    serde_json::from_str(s).map_err(|e| ProofError::Internal(format!("invalid json in store: {e}")))
}

#[derive(FromRow)]
struct ProofRow {
    id: String,
    proof_link: String,
    owner_id: String,
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
    expires_at: Option<String>,
    ai_verified: bool,
    ai_confidence_score: Option<f64>,
    ai_tamper_detected: bool,
    verification_count: i64,
    last_verified_at: Option<String>,
    view_count: i64,
    download_count: i64,
    metadata: String,
    created_at: String,
}

impl TryFrom<ProofRow> for Proof {
    type Error = ProofError;

    fn try_from(row: ProofRow) -> Result<Proof> {
        Ok(Proof {
            id: parse_uuid(&row.id)?,
            proof_link: row.proof_link,
            owner_id: parse_uuid(&row.owner_id)?,
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
            expires_at: row.expires_at.as_deref().map(parse_timestamp).transpose()?,
            ai_verified: row.ai_verified,
            ai_confidence_score: row.ai_confidence_score,
            ai_tamper_detected: row.ai_tamper_detected,
            verification_count: row.verification_count,
            last_verified_at: row
                .last_verified_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            view_count: row.view_count,
            download_count: row.download_count,
            metadata: parse_json(&row.metadata)?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(FromRow)]
struct VerificationRow {
    id: String,
    proof_id: String,
    verified_by: String,
    verification_result: bool,
    verification_method: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    metadata: String,
    verified_at: String,
}

impl TryFrom<VerificationRow> for ProofVerification {
    type Error = ProofError;

    fn try_from(row: VerificationRow) -> Result<ProofVerification> {
        Ok(ProofVerification {
            id: parse_uuid(&row.id)?,
            proof_id: parse_uuid(&row.proof_id)?,
            verified_by: row.verified_by,
            verification_result: row.verification_result,
            verification_method: row.verification_method.parse::<VerificationMethod>()?,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            metadata: parse_json(&row.metadata)?,
            verified_at: parse_timestamp(&row.verified_at)?,
        })
    }
}

#[async_trait]
impl ProofStore for SqliteProofStore {
    async fn insert_proof(&self, proof: &Proof) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO proofs ({PROOF_COLUMNS}) VALUES \
             (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(proof.id.to_string())
        .bind(&proof.proof_link)
        .bind(proof.owner_id.to_string())
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
        .bind(proof.expires_at.map(|t| t.to_rfc3339()))
        .bind(proof.ai_verified)
        .bind(proof.ai_confidence_score)
        .bind(proof.ai_tamper_detected)
        .bind(proof.verification_count)
        .bind(proof.last_verified_at.map(|t| t.to_rfc3339()))
        .bind(proof.view_count)
        .bind(proof.download_count)
        .bind(proof.metadata.to_string())
        .bind(proof.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_by_link(&self, proof_link: &str) -> Result<Option<Proof>> {
        let row = sqlx::query_as::<_, ProofRow>(&format!(
            "SELECT {PROOF_COLUMNS} FROM proofs WHERE proof_link = ?"
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
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proofs WHERE owner_id = ?")
            .bind(owner_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ProofRow>(&format!(
            "SELECT {PROOF_COLUMNS} FROM proofs \
             WHERE owner_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(owner_id.to_string())
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
        // Delete the audit trail explicitly rather than relying on the
        // connection's foreign_keys pragma.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM proof_verifications WHERE proof_id = ?")
            .bind(proof_id.to_string())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM proofs WHERE id = ?")
            .bind(proof_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
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
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(record.proof_id.to_string())
        .bind(&record.verified_by)
        .bind(record.verification_result)
        .bind(record.verification_method.as_str())
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(record.metadata.to_string())
        .bind(record.verified_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE proofs \
             SET verification_count = verification_count + 1, last_verified_at = ? \
             WHERE id = ?",
        )
        .bind(record.verified_at.to_rfc3339())
        .bind(record.proof_id.to_string())
        .execute(&mut *tx)
        .await?;

        if let Some(status) = update.first_transition {
            sqlx::query("UPDATE proofs SET status = ? WHERE id = ? AND status = 'pending'")
                .bind(status.as_str())
                .bind(record.proof_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        if update.expire {
            sqlx::query("UPDATE proofs SET status = 'expired' WHERE id = ? AND status <> 'expired'")
                .bind(record.proof_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        if let Some(ai) = &update.ai {
            sqlx::query(
                "UPDATE proofs \
                 SET ai_verified = ?, ai_confidence_score = ?, ai_tamper_detected = ? \
                 WHERE id = ?",
            )
            .bind(!ai.tamper_detected)
            .bind(ai.confidence)
            .bind(ai.tamper_detected)
            .bind(record.proof_id.to_string())
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, ProofRow>(&format!(
            "SELECT {PROOF_COLUMNS} FROM proofs WHERE id = ?"
        ))
        .bind(record.proof_id.to_string())
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
             WHERE proof_id = ? ORDER BY verified_at DESC LIMIT ? OFFSET ?",
        )
        .bind(proof_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProofVerification::try_from).collect()
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE proofs SET status = 'expired' \
             WHERE expires_at IS NOT NULL AND expires_at < ? AND status <> 'expired'",
        )
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn record_view(&self, proof_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE proofs SET view_count = view_count + 1 WHERE id = ?")
            .bind(proof_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_download(&self, proof_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE proofs SET download_count = download_count + 1 WHERE id = ?")
            .bind(proof_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
