//! Authenticated proof lifecycle handlers.

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, instrument};

use crate::api::error::{mask_existence, ApiError, ErrorCode};
use crate::api::types::{
    CreateProofBatchRequest, CreateProofBatchResponse, CreateProofRequest, DownloadResponse,
    HistoryQuery, HistoryResponse, ListProofsQuery, ListProofsResponse, ProofResponse,
};
use crate::auth::AuthContextExt;
use crate::metrics::metric_names;
use crate::registry::{CreateProof, ProofContent};
use crate::server::AppState;

/// Hard cap on batch creation size.
pub const MAX_BATCH_SIZE: usize = 100;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

fn build_create(
    owner_id: uuid::Uuid,
    request: CreateProofRequest,
) -> Result<CreateProof, ApiError> {
    let content = match (&request.content_base64, &request.fingerprint) {
        (Some(encoded), _) => {
            let bytes = STANDARD.decode(encoded).map_err(|_| {
                ApiError::new(
                    ErrorCode::InvalidRequestBody,
                    "content_base64 is not valid base64",
                )
            })?;
            ProofContent::Bytes(bytes)
        }
        (None, Some(fingerprint)) => ProofContent::Precomputed {
            fingerprint: fingerprint.clone(),
        },
        (None, None) => {
            return Err(ApiError::new(
                ErrorCode::InvalidRequestBody,
                "either content_base64 or fingerprint is required",
            ))
        }
    };

    Ok(CreateProof {
        owner_id,
        proof_type: request.proof_type,
        content,
        hash_algorithm: request.hash_algorithm,
        verification_method: request.verification_method,
        file_name: request.file_name,
        content_type: request.content_type,
        content_url: request.content_url,
        signature: request.signature,
        signature_algorithm: request.signature_algorithm,
        public_key: request.public_key,
        is_public: request.is_public,
        is_downloadable: request.is_downloadable,
        expires_at: request.expires_at,
        metadata: request.metadata,
    })
}

/// POST /api/v1/proofs - Create a proof.
#[instrument(skip(state, auth, request), fields(owner_id = %auth.owner_id))]
pub async fn create_proof(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Json(request): Json<CreateProofRequest>,
) -> Result<(StatusCode, Json<ProofResponse>), ApiError> {
    let create = build_create(auth.owner_id, request)?;
    let proof = state.registry.create(create).await?;

    state.metrics.inc_counter(metric_names::PROOFS_CREATED).await;
    info!(proof_link = %proof.proof_link, "proof created");

    Ok((
        StatusCode::CREATED,
        Json(ProofResponse::from_proof(&proof, &state.public_base_url)),
    ))
}

/// POST /api/v1/proofs/batch - Create several proofs in one request.
#[instrument(skip(state, auth, request), fields(owner_id = %auth.owner_id, count = request.proofs.len()))]
pub async fn create_proof_batch(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Json(request): Json<CreateProofBatchRequest>,
) -> Result<(StatusCode, Json<CreateProofBatchResponse>), ApiError> {
    if request.proofs.is_empty() {
        return Err(ApiError::new(
            ErrorCode::InvalidRequestBody,
            "batch must contain at least one proof",
        ));
    }
    if request.proofs.len() > MAX_BATCH_SIZE {
        return Err(ApiError::new(
            ErrorCode::BatchTooLarge,
            format!("batch size exceeds limit of {MAX_BATCH_SIZE}"),
        ));
    }

    let creates = request
        .proofs
        .into_iter()
        .map(|r| build_create(auth.owner_id, r))
        .collect::<Result<Vec<_>, _>>()?;

    let proofs = state.registry.create_batch(creates).await?;
    state
        .metrics
        .add_counter(metric_names::PROOFS_CREATED, proofs.len() as u64)
        .await;

    let responses: Vec<ProofResponse> = proofs
        .iter()
        .map(|p| ProofResponse::from_proof(p, &state.public_base_url))
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(CreateProofBatchResponse {
            created: responses.len(),
            proofs: responses,
        }),
    ))
}

/// GET /api/v1/proofs - List the caller's proofs, paginated.
#[instrument(skip(state, auth), fields(owner_id = %auth.owner_id))]
pub async fn list_proofs(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Query(query): Query<ListProofsQuery>,
) -> Result<Json<ListProofsResponse>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * page_size;

    let (proofs, total) = state
        .registry
        .list_owned(auth.owner_id, page_size, offset)
        .await?;

    Ok(Json(ListProofsResponse {
        proofs: proofs
            .iter()
            .map(|p| ProofResponse::from_proof(p, &state.public_base_url))
            .collect(),
        total,
        page,
        page_size,
    }))
}

/// GET /api/v1/proofs/:proof_link - Get one proof the caller may see.
///
/// A proof the caller is not allowed to see answers exactly like an
/// unknown link, so authenticated callers cannot probe for the
/// existence of other owners' private proofs.
#[instrument(skip(state, auth))]
pub async fn get_proof(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(proof_link): Path<String>,
) -> Result<Json<ProofResponse>, ApiError> {
    debug!("fetching proof");
    let proof = state
        .registry
        .get_visible(&proof_link, &auth.requester())
        .await
        .map_err(|e| mask_existence(&proof_link, e))?;
    Ok(Json(ProofResponse::from_proof(
        &proof,
        &state.public_base_url,
    )))
}

/// GET /api/v1/proofs/:proof_link/history - Verification audit trail.
#[instrument(skip(state, auth, query))]
pub async fn get_proof_history(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(proof_link): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * page_size;

    let verifications = state
        .registry
        .history(&auth.requester(), &proof_link, page_size, offset)
        .await?;

    Ok(Json(HistoryResponse {
        proof_link,
        verifications: verifications.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/proofs/:proof_link/download - Policy-checked download URL.
#[instrument(skip(state, auth))]
pub async fn download_proof(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(proof_link): Path<String>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let download_url = state
        .registry
        .download_url(&auth.requester(), &proof_link)
        .await?;
    Ok(Json(DownloadResponse {
        proof_link,
        download_url,
    }))
}

/// DELETE /api/v1/proofs/:proof_link - Delete a proof and its history.
#[instrument(skip(state, auth))]
pub async fn delete_proof(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(proof_link): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete(&auth.requester(), &proof_link).await?;
    state.metrics.inc_counter(metric_names::PROOFS_DELETED).await;
    Ok(StatusCode::NO_CONTENT)
}
