//! API key authentication.
//!
//! Keys are formatted as `plk_<random>`; only the SHA-256 hash is ever
//! stored or compared.

use std::collections::HashMap;
use std::sync::RwLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{AuthContext, AuthError};

/// API key prefix.
pub const API_KEY_PREFIX: &str = "plk_";

/// Stored API key metadata.
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    /// SHA-256 hash of the key; plaintext is never stored.
    pub key_hash: String,
    /// Owner this key authenticates as.
    pub owner_id: Uuid,
    /// Whether the key grants admin rights.
    pub admin: bool,
    /// Whether the key is active.
    pub active: bool,
}

/// Validates API keys against registered records.
pub struct ApiKeyValidator {
    keys: RwLock<HashMap<String, ApiKeyRecord>>,
}

impl ApiKeyValidator {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a new key for an owner. Returns (plaintext, hash).
    pub fn generate_key() -> (String, String) {
        let mut bytes = [0u8; 24];
        OsRng.fill_bytes(&mut bytes);
        let plaintext = format!("{}{}", API_KEY_PREFIX, URL_SAFE_NO_PAD.encode(bytes));
        let hash = Self::hash_key(&plaintext);
        (plaintext, hash)
    }

    /// Hash a key for storage or lookup.
    pub fn hash_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Register a key record.
    pub fn register_key(&self, record: ApiKeyRecord) {
        let mut keys = self.keys.write().expect("api key lock poisoned");
        keys.insert(record.key_hash.clone(), record);
    }

    /// Validate a plaintext key and resolve its identity.
    pub fn validate(&self, key: &str) -> Result<AuthContext, AuthError> {
        if !key.starts_with(API_KEY_PREFIX) {
            return Err(AuthError::InvalidApiKey);
        }

        let key_hash = Self::hash_key(key);
        let keys = self.keys.read().expect("api key lock poisoned");
        let record = keys.get(&key_hash).ok_or(AuthError::InvalidApiKey)?;

        if !record.active {
            return Err(AuthError::InvalidApiKey);
        }

        Ok(AuthContext {
            owner_id: record.owner_id,
            is_admin: record.admin,
        })
    }
}

impl Default for ApiKeyValidator {
    fn default() -> Self {
        Self::new()
    }
}
