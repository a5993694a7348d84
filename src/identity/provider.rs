use tracing::info;

use crate::error::{AppError, AppResult};
use crate::security;
use crate::storage::SharedStore;
use crate::token::TokenCodec;

use super::Principal;

#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Issues credentials. Success returns a signed token; the caller is
/// responsible for delivering it to the client, which stores it.
pub trait AuthProvider: Send + Sync {
    fn sign_up(&self, req: &SignUpRequest) -> AppResult<String>;
    fn sign_in(&self, req: &SignInRequest) -> AppResult<String>;
}

pub struct LocalAuthProvider {
    store: SharedStore,
    codec: TokenCodec,
}

impl LocalAuthProvider {
    pub fn new(store: SharedStore, codec: TokenCodec) -> Self {
        Self { store, codec }
    }
}

/// Derive a generated-avatar URL from the email. FNV-1a over the normalized
/// address: the hash is fixed by definition, so the URL persisted at sign-up
/// never drifts across releases.
fn avatar_for(email: &str) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut h = FNV_OFFSET;
    for b in email.trim().to_lowercase().bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    format!("https://www.gravatar.com/avatar/{:016x}?d=retro", h)
}

impl AuthProvider for LocalAuthProvider {
    fn sign_up(&self, req: &SignUpRequest) -> AppResult<String> {
        let username = req.username.trim();
        let email = req.email.trim();
        if username.is_empty() || email.is_empty() || req.password.is_empty() {
            return Err(AppError::user("missing_fields", "username, email and password are required"));
        }
        let phc = security::hash_password(&req.password)
            .map_err(|e| AppError::internal("hash_failed".to_string(), e.to_string()))?;
        let created = {
            let mut guard = self.store.0.lock();
            guard.create_user(username, email, &phc, &avatar_for(email))
                .map_err(AppError::from)?
        };
        let Some(user) = created else {
            return Err(AppError::conflict("account_exists", "username or email already in use"));
        };
        info!(target: "auth", user = %user.id, username = %user.username, "sign_up");
        let principal = Principal { user_id: user.id, username: user.username };
        self.codec.issue(&principal)
    }

    fn sign_in(&self, req: &SignInRequest) -> AppResult<String> {
        // Single failure path whether the email or the password was wrong.
        let invalid = || AppError::auth("invalid_credentials", "Invalid email or password");
        let user = {
            let guard = self.store.0.lock();
            guard.user_by_email(req.email.trim()).cloned()
        };
        let Some(user) = user else { return Err(invalid()) };
        if !security::verify_password(&user.password_hash, &req.password) {
            return Err(invalid());
        }
        info!(target: "auth", user = %user.id, username = %user.username, "sign_in");
        let principal = Principal { user_id: user.id, username: user.username };
        self.codec.issue(&principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn provider() -> (LocalAuthProvider, TokenCodec, tempfile::TempDir) {
        let tmp = tempdir().unwrap();
        let codec = TokenCodec::new(b"provider-test-secret");
        let store = SharedStore::new(tmp.path()).unwrap();
        (LocalAuthProvider::new(store, codec.clone()), codec, tmp)
    }

    #[test]
    fn sign_up_then_sign_in_issue_verifiable_tokens() {
        let (p, codec, _tmp) = provider();
        let req = SignUpRequest { username: "fern".into(), email: "fern@example.com".into(), password: "secret".into() };
        let token = p.sign_up(&req).unwrap();
        let principal = codec.verify(&token).unwrap();
        assert_eq!(principal.username, "fern");

        let token = p.sign_in(&SignInRequest { email: "fern@example.com".into(), password: "secret".into() }).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), principal);
    }

    #[test]
    fn wrong_password_and_unknown_email_fail_alike() {
        let (p, _codec, _tmp) = provider();
        p.sign_up(&SignUpRequest { username: "gil".into(), email: "gil@example.com".into(), password: "pw".into() }).unwrap();
        let a = p.sign_in(&SignInRequest { email: "gil@example.com".into(), password: "wrong".into() }).unwrap_err();
        let b = p.sign_in(&SignInRequest { email: "nobody@example.com".into(), password: "pw".into() }).unwrap_err();
        assert_eq!(a.code_str(), "invalid_credentials");
        assert_eq!(a.code_str(), b.code_str());
    }

    #[test]
    fn avatar_url_is_stable_and_case_insensitive() {
        let url = avatar_for("hal@example.com");
        assert_eq!(url, "https://www.gravatar.com/avatar/e55f9e4b50c00793?d=retro");
        assert_eq!(avatar_for("  HAL@Example.COM "), url);
    }

    #[test]
    fn duplicate_sign_up_conflicts() {
        let (p, _codec, _tmp) = provider();
        let req = SignUpRequest { username: "hal".into(), email: "hal@example.com".into(), password: "pw".into() };
        p.sign_up(&req).unwrap();
        assert_eq!(p.sign_up(&req).unwrap_err().code_str(), "account_exists");
    }
}
