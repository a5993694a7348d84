use reqwest::Url;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::schema::{ApiRequest, ApiResponse};

use super::auth_link::AuthLink;
use super::credentials::CredentialStore;
use super::login_state::LoginStateCache;

/// One client session against the API: base URI, HTTP client, auth link and
/// the derived login state. Constructed once at startup and passed down to
/// whatever drives it; sign-in/sign-out mutate the credential store and then
/// the derived state, in that order, as explicit sequential steps.
pub struct ApiSession<S> {
    base: Url,
    client: reqwest::Client,
    link: AuthLink<S>,
    store: S,
    login: LoginStateCache<S>,
}

fn network_err(e: reqwest::Error) -> AppError {
    AppError::internal("network".to_string(), e.to_string())
}

/// Rebuild the typed error from the wire triple (status, code, message).
fn error_from_wire(status: u16, code: String, message: String) -> AppError {
    match status {
        401 => AppError::Auth { code, message },
        403 => AppError::Forbidden { code, message },
        404 => AppError::NotFound { code, message },
        409 => AppError::Conflict { code, message },
        400 if code.ends_with("_exceeded") => AppError::Guard { code, message },
        400 => AppError::UserInput { code, message },
        _ => AppError::Internal { code, message },
    }
}

impl<S: CredentialStore + Clone> ApiSession<S> {
    /// Build a session. The login state is computed from the credential
    /// store immediately, before anything can read it.
    pub async fn connect(base: &str, store: S) -> AppResult<Self> {
        let base = Url::parse(base)
            .map_err(|e| AppError::user("bad_uri".to_string(), e.to_string()))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(network_err)?;
        let login = LoginStateCache::new(store.clone()).await?;
        Ok(Self { base, client, link: AuthLink::new(store.clone()), store, login })
    }

    pub fn is_logged_in(&self) -> bool {
        self.login.is_logged_in()
    }

    pub fn credential_store(&self) -> &S {
        &self.store
    }

    /// Send one typed operation through the auth link and decode the typed
    /// response or the typed error.
    pub async fn execute(&self, request: &ApiRequest) -> AppResult<ApiResponse> {
        let url = self.base.join("/api")
            .map_err(|e| AppError::user("bad_uri".to_string(), e.to_string()))?;
        let builder = self.client.post(url).json(request);
        let builder = self.link.apply(builder).await?;
        let resp = builder.send().await.map_err(network_err)?;
        let status = resp.status();
        let body: serde_json::Value = resp.json().await.map_err(network_err)?;
        if status.is_success() && body.get("status").and_then(|s| s.as_str()) == Some("ok") {
            let data = body.get("data").cloned().unwrap_or(serde_json::Value::Null);
            serde_json::from_value(data)
                .map_err(|e| AppError::internal("bad_response".to_string(), e.to_string()))
        } else {
            let code = body.get("code").and_then(|c| c.as_str()).unwrap_or("internal").to_string();
            let message = body.get("message").and_then(|m| m.as_str()).unwrap_or("request failed").to_string();
            debug!(target: "client", status = status.as_u16(), code = %code, "api error");
            Err(error_from_wire(status.as_u16(), code, message))
        }
    }

    async fn authenticate(&self, request: ApiRequest) -> AppResult<()> {
        let response = self.execute(&request).await?;
        let ApiResponse::Token { token } = response else {
            return Err(AppError::internal("bad_response".to_string(), "expected a token".to_string()));
        };
        // Store first, then recompute the derived state; navigation (or any
        // other follow-up) happens after this returns.
        self.store.set(&token).await?;
        self.login.refresh().await?;
        Ok(())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<()> {
        self.authenticate(ApiRequest::SignIn { email: email.to_string(), password: password.to_string() }).await
    }

    pub async fn sign_up(&self, username: &str, email: &str, password: &str) -> AppResult<()> {
        self.authenticate(ApiRequest::SignUp {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }).await
    }

    /// Delete the stored credential and recompute the derived state.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.store.delete().await?;
        self.login.refresh().await?;
        Ok(())
    }
}
