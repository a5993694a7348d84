use reqwest::header::AUTHORIZATION;

use crate::error::{AppError, AppResult};

use super::credentials::CredentialStore;

/// Outbound-request middleware with a `(request) -> request'` contract: reads
/// the current credential and attaches it as the `authorization` header,
/// merged with whatever headers the request already carries. The read is
/// awaited before the request proceeds, so the header is never stale or
/// partially resolved. An absent credential attaches an empty header; the
/// request stays sendable while unauthenticated.
#[derive(Debug, Clone)]
pub struct AuthLink<S> {
    store: S,
}

impl<S: CredentialStore> AuthLink<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn apply(&self, request: reqwest::RequestBuilder) -> AppResult<reqwest::RequestBuilder> {
        let token = self.store.get().await?.unwrap_or_default();
        let value = reqwest::header::HeaderValue::from_str(&token)
            .map_err(|e| AppError::internal("bad_credential".to_string(), e.to_string()))?;
        Ok(request.header(AUTHORIZATION, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::credentials::MemoryCredentialStore;

    fn builder() -> reqwest::RequestBuilder {
        reqwest::Client::new().post("http://localhost:0/api")
    }

    #[tokio::test]
    async fn attaches_stored_credential() {
        let store = MemoryCredentialStore::new();
        store.set("tok-abc").await.unwrap();
        let link = AuthLink::new(store);
        let req = link.apply(builder()).await.unwrap().build().unwrap();
        assert_eq!(req.headers().get(AUTHORIZATION).unwrap(), "tok-abc");
    }

    #[tokio::test]
    async fn absent_credential_yields_empty_header_not_failure() {
        let link = AuthLink::new(MemoryCredentialStore::new());
        let req = link.apply(builder()).await.unwrap().build().unwrap();
        assert_eq!(req.headers().get(AUTHORIZATION).unwrap(), "");
    }

    #[tokio::test]
    async fn existing_headers_are_preserved() {
        let store = MemoryCredentialStore::new();
        store.set("tok-xyz").await.unwrap();
        let link = AuthLink::new(store);
        let req = link
            .apply(builder().header("x-client", "cli"))
            .await
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.headers().get("x-client").unwrap(), "cli");
        assert_eq!(req.headers().get(AUTHORIZATION).unwrap(), "tok-xyz");
    }
}
