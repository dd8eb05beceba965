//! Signed-claims bearer token generation.
//!
//! Every decoration call produces a fresh short-lived token with its own
//! `jti` and expiry; tokens are never cached or shared between requests.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::error::ConfigError;

/// Token lifetime in seconds.
const TOKEN_TTL_SECS: u64 = 900;

/// Credentials for bearer-token auth backed by signed claims.
#[derive(Clone)]
pub struct JwtAuth {
    application_id: String,
    key: EncodingKey,
    algorithm: Algorithm,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct Claims {
    pub application_id: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

impl JwtAuth {
    /// Create from an application id and an RSA private key in PEM format.
    pub fn new(
        application_id: impl Into<String>,
        private_key_pem: &[u8],
    ) -> Result<Self, ConfigError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;
        Ok(Self::with_key(application_id, key, Algorithm::RS256))
    }

    /// Create from a pre-built signing key and algorithm.
    pub fn with_key(
        application_id: impl Into<String>,
        key: EncodingKey,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            key,
            algorithm,
        }
    }

    /// The application id the claims are issued for.
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Sign a fresh token. Called once per outbound request.
    pub(crate) fn generate_token(&self) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = Claims {
            application_id: self.application_id.clone(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth")
            .field("application_id", &self.application_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
