//! Access token codec: encodes a verified identity into a signed HS256 token
//! and decodes/verifies it back. Pure function of (secret, input) with no I/O;
//! every failure mode collapses to the single `invalid_token` error so callers
//! never learn whether a bad token was tampered, malformed or expired.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::identity::Principal;

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Signed claims payload. `sub` carries the user id, `usr` the username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub usr: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(principal: &Principal, ttl: Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: principal.user_id.clone(),
            usr: principal.username.clone(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal { user_id: self.sub.clone(), username: self.usr.clone() }
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding: jsonwebtoken::EncodingKey,
    decoding: jsonwebtoken::DecodingKey,
    validation: jsonwebtoken::Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = jsonwebtoken::Validation::default();
        // No leeway: a token past its exp is invalid immediately.
        validation.leeway = 0;
        Self {
            encoding: jsonwebtoken::EncodingKey::from_secret(secret),
            decoding: jsonwebtoken::DecodingKey::from_secret(secret),
            validation,
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign the identity into a token string.
    pub fn issue(&self, principal: &Principal) -> AppResult<String> {
        let claims = Claims::new(principal, self.ttl);
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::internal("token_encode".to_string(), e.to_string()))
    }

    /// Issue with explicit issued-at/expiry timestamps. Used for lifetime tests.
    pub fn issue_at(&self, principal: &Principal, iat: i64, exp: i64) -> AppResult<String> {
        let claims = Claims { sub: principal.user_id.clone(), usr: principal.username.clone(), iat, exp };
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::internal("token_encode".to_string(), e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded identity.
    /// Callers decide what an *absent* token means; this only judges present ones.
    pub fn verify(&self, token: &str) -> AppResult<Principal> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.principal())
            .map_err(|_| AppError::invalid_token())
    }
}
