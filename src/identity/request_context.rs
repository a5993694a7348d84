use axum::http::HeaderMap;

use crate::error::{AppError, AppResult};
use crate::storage::SharedStore;
use crate::token::TokenCodec;

use super::Principal;

/// Per-request execution context: the verified identity (if any) plus the
/// data-access handle. Built once per request and discarded with it; it never
/// caches anything across requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub store: SharedStore,
}

impl RequestContext {
    /// Build a context from the inbound headers.
    ///
    /// No `authorization` header (or an empty one, which the client sends when
    /// unauthenticated) yields an anonymous context. A present, non-empty
    /// credential must verify; a rejected credential is a hard error rather
    /// than a silent downgrade to anonymous.
    pub fn build(headers: &HeaderMap, codec: &TokenCodec, store: SharedStore) -> AppResult<Self> {
        let raw = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or("");
        let principal = if raw.is_empty() {
            None
        } else {
            Some(codec.verify(raw)?)
        };
        Ok(Self { principal, store })
    }

    pub fn anonymous(store: SharedStore) -> Self {
        Self { principal: None, store }
    }

    pub fn authenticated(principal: Principal, store: SharedStore) -> Self {
        Self { principal: Some(principal), store }
    }

    /// The identity, or the authorization error an anonymous caller gets on
    /// identity-requiring operations.
    pub fn require_principal(&self) -> AppResult<&Principal> {
        self.principal.as_ref().ok_or_else(AppError::sign_in_required)
    }
}
