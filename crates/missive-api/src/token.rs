use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::Identity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token is bound to.
    pub sub: String,
    pub exp: usize,
}

/// Process-wide token material, built once at startup from the configured
/// secret and injected into shared state. Rotation is a redeploy, not a
/// runtime mutation.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, validity: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validity,
        }
    }

    pub fn sign(&self, username: &str) -> Result<String, ApiError> {
        let claims = Claims {
            sub: username.to_string(),
            exp: (Utc::now() + self.validity).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("token signing failed: {e}")))
    }

    /// Malformed, mis-signed, and expired tokens all yield the same failure.
    pub fn verify(&self, token: &str) -> Result<Identity, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| ApiError::Unauthenticated)?;

        Ok(Identity::new(data.claims.sub))
    }
}
