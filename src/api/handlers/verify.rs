//! Public verification handlers.
//!
//! Anyone holding a proof link can verify; no credentials required.
//! Private proofs the caller cannot see answer exactly like unknown
//! links so existence never leaks.

use axum::extract::{ConnectInfo, Path, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::SocketAddr;
use tracing::{debug, instrument, warn};

use crate::api::error::{mask_existence, ApiError, ErrorCode};
use crate::api::types::{VerifyRequestBody, VerifyResponse};
use crate::domain::VerifierContext;
use crate::metrics::metric_names;
use crate::server::AppState;
use crate::verify::VerifyRequest;

fn verifier_context(addr: Option<SocketAddr>, headers: &HeaderMap) -> VerifierContext {
    VerifierContext {
        requester: None,
        ip_address: addr.map(|a| a.ip().to_string()),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    }
}

/// POST /v1/verify - Verify content or a fingerprint against a proof.
#[instrument(skip(state, headers, body), fields(proof_link = %body.proof_link))]
pub async fn verify_proof(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<VerifyRequestBody>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let content = match &body.content_base64 {
        Some(encoded) => Some(STANDARD.decode(encoded).map_err(|_| {
            ApiError::new(
                ErrorCode::InvalidRequestBody,
                "content_base64 is not valid base64",
            )
        })?),
        None => None,
    };

    let context = verifier_context(addr.map(|ConnectInfo(a)| a), &headers);
    let request = VerifyRequest {
        proof_link: body.proof_link.clone(),
        content,
        fingerprint: body.fingerprint,
    };

    let outcome = state
        .verifier
        .verify(request, &context)
        .await
        .map_err(|e| mask_existence(&body.proof_link, e))?;

    state
        .metrics
        .inc_counter(metric_names::VERIFICATIONS_TOTAL)
        .await;
    if !outcome.valid {
        state
            .metrics
            .inc_counter(metric_names::VERIFICATIONS_FAILED)
            .await;
    }

    Ok(Json(VerifyResponse::from_outcome(body.proof_link, outcome)))
}

/// GET /v1/verify/:proof_link - Link-only check; bumps the view counter.
#[instrument(skip(state, headers))]
pub async fn check_proof_link(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Path(proof_link): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    debug!("link-only verification");

    let context = verifier_context(addr.map(|ConnectInfo(a)| a), &headers);
    let request = VerifyRequest {
        proof_link: proof_link.clone(),
        content: None,
        fingerprint: None,
    };

    let outcome = state
        .verifier
        .verify(request, &context)
        .await
        .map_err(|e| mask_existence(&proof_link, e))?;

    // The verification is already audited; the view counter is best
    // effort and must not fail the check.
    if let Ok(proof) = state.registry.get(&proof_link).await {
        if let Err(e) = state.store.record_view(proof.id).await {
            warn!(proof_link = %proof_link, error = %e, "failed to record view");
        }
    }

    state
        .metrics
        .inc_counter(metric_names::VERIFICATIONS_LINK_ONLY)
        .await;

    Ok(Json(VerifyResponse::from_outcome(proof_link, outcome)))
}
