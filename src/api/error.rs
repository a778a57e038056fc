//! Structured API error responses with error codes
//!
//! Consistent error handling across all API endpoints with
//! machine-readable error codes and human-readable messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::infra::ProofError;

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic
/// error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    /// No authentication credentials provided
    AuthRequired,
    /// Invalid API key format or value
    InvalidApiKey,
    /// Invalid or expired JWT token
    InvalidToken,
    /// Insufficient permissions for this operation
    InsufficientPermissions,

    // Validation errors (3xxx)
    /// Request body is malformed
    InvalidRequestBody,
    /// Field value is invalid
    InvalidFieldValue,
    /// Batch size exceeds limit
    BatchTooLarge,

    // Resource errors (4xxx)
    /// Requested resource not found
    ResourceNotFound,
    /// Proof not found
    ProofNotFound,

    // Conflict errors (5xxx)
    /// Proof link collision could not be resolved
    LinkConflict,

    // Crypto errors (6xxx)
    /// Signature or key material is invalid or incomplete
    InvalidSignature,

    // State errors (7xxx)
    /// Invalid proof status transition
    InvalidStateTransition,

    // Infrastructure errors (8xxx)
    /// Database operation failed
    DatabaseError,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            ErrorCode::AuthRequired => 1001,
            ErrorCode::InvalidApiKey => 1002,
            ErrorCode::InvalidToken => 1003,
            ErrorCode::InsufficientPermissions => 1005,

            ErrorCode::InvalidRequestBody => 3001,
            ErrorCode::InvalidFieldValue => 3003,
            ErrorCode::BatchTooLarge => 3005,

            ErrorCode::ResourceNotFound => 4001,
            ErrorCode::ProofNotFound => 4002,

            ErrorCode::LinkConflict => 5001,

            ErrorCode::InvalidSignature => 6001,

            ErrorCode::InvalidStateTransition => 7001,

            ErrorCode::DatabaseError => 8001,
            ErrorCode::InternalError => 8999,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::AuthRequired => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ErrorCode::InsufficientPermissions => StatusCode::FORBIDDEN,

            ErrorCode::InvalidRequestBody => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,
            ErrorCode::BatchTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ProofNotFound => StatusCode::NOT_FOUND,

            ErrorCode::LinkConflict => StatusCode::CONFLICT,

            ErrorCode::InvalidSignature => StatusCode::BAD_REQUEST,

            ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,

            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::InvalidApiKey => "INVALID_API_KEY",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::BatchTooLarge => "BATCH_TOO_LARGE",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::ProofNotFound => "PROOF_NOT_FOUND",
            ErrorCode::LinkConflict => "LINK_CONFLICT",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", code_str)
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

/// Structured error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error details
    pub error: ErrorDetails,
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code for easy categorization
    pub numeric_code: u32,

    /// Human-readable error message
    pub message: String,

    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Related resource ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
                details: None,
                resource_id: None,
            },
        }
    }

    /// Set additional details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Set related resource ID
    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.error.resource_id = Some(id.into());
        self
    }

    /// Error for a proof that does not exist or is not visible to the caller.
    ///
    /// Permission failures on the lookup surface use this same shape so the
    /// response does not reveal whether a private proof exists.
    pub fn proof_not_found(proof_link: &str) -> Self {
        ApiError::new(ErrorCode::ProofNotFound, "Proof not found")
            .with_resource_id(proof_link.to_string())
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.error.code.to_string();
        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

/// Collapse not-found and permission-denied into the uniform 404 so an
/// inaccessible private proof answers exactly like an unknown link.
pub(crate) fn mask_existence(proof_link: &str, err: ProofError) -> ApiError {
    match err {
        ProofError::NotFound(_) | ProofError::PermissionDenied(_) => {
            ApiError::proof_not_found(proof_link)
        }
        other => other.into(),
    }
}

// ============================================================================
// Conversion from ProofError
// ============================================================================

impl From<ProofError> for ApiError {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::Database(e) => {
                ApiError::new(ErrorCode::DatabaseError, format!("Database error: {}", e))
            }
            ProofError::NotFound(link) => {
                ApiError::new(ErrorCode::ProofNotFound, format!("Proof not found: {}", link))
                    .with_resource_id(link)
            }
            ProofError::PermissionDenied(msg) => {
                ApiError::new(ErrorCode::InsufficientPermissions, msg)
            }
            ProofError::Configuration(msg) => {
                ApiError::new(ErrorCode::InvalidFieldValue, msg)
            }
            ProofError::Crypto(msg) => ApiError::new(ErrorCode::InvalidSignature, msg),
            ProofError::Conflict(msg) => ApiError::new(ErrorCode::LinkConflict, msg),
            ProofError::InvalidStateTransition { proof_id, from, to } => ApiError::new(
                ErrorCode::InvalidStateTransition,
                format!("Invalid status transition {} -> {}", from, to),
            )
            .with_resource_id(proof_id.to_string())
            .with_details(serde_json::json!({
                "from": from.as_str(),
                "to": to.as_str(),
            })),
            ProofError::Internal(msg) => ApiError::new(ErrorCode::InternalError, msg),
        }
    }
}
