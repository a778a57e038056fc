//! REST API endpoints for the proof registry.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::api::handlers::{
    check_proof_link, create_proof, create_proof_batch, delete_proof, download_proof, get_proof,
    get_proof_history, health, list_proofs, metrics, verify_proof,
};
use crate::server::AppState;

/// Build the authenticated `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/proofs", post(create_proof))
        .route("/v1/proofs", get(list_proofs))
        .route("/v1/proofs/batch", post(create_proof_batch))
        .route("/v1/proofs/:proof_link", get(get_proof))
        .route("/v1/proofs/:proof_link", delete(delete_proof))
        .route("/v1/proofs/:proof_link/history", get(get_proof_history))
        .route("/v1/proofs/:proof_link/download", get(download_proof))
}

/// Build the unauthenticated public router.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/v1/verify", post(verify_proof))
        .route("/v1/verify/:proof_link", get(check_proof_link))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
}
