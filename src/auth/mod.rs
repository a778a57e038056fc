//! Identity resolution for registry callers.
//!
//! Two credential kinds from the external identity layer: hashed API keys
//! and HS256 JWTs. Both resolve to an [`AuthContext`] carrying the owner
//! id and an admin flag. The public verify surface accepts anonymous
//! requests; everything under `/api` does not.

mod api_key;
mod jwt;
mod middleware;

pub use api_key::{ApiKeyRecord, ApiKeyValidator, API_KEY_PREFIX};
pub use jwt::{Claims, JwtValidator};
pub use middleware::{auth_middleware, AuthContextExt, AuthMiddlewareState, Authenticator};

use thiserror::Error;
use uuid::Uuid;

use crate::domain::Requester;

/// Resolved caller identity.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub owner_id: Uuid,
    pub is_admin: bool,
}

impl AuthContext {
    pub fn user(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            is_admin: false,
        }
    }

    pub fn admin(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            is_admin: true,
        }
    }

    pub fn requester(&self) -> Requester {
        if self.is_admin {
            Requester::Admin(self.owner_id)
        } else {
            Requester::User(self.owner_id)
        }
    }
}

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authentication credentials")]
    MissingAuth,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,
}
