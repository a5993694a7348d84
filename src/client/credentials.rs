use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::AppResult;

/// The single fixed key under which the credential lives.
pub const TOKEN_KEY: &str = "token";

/// Secure key-value persistence boundary for the credential. At most one
/// value is stored; absent is the valid "unauthenticated" state. Reads and
/// writes suspend, so callers can await them before anything observes the
/// credential.
#[allow(async_fn_in_trait)]
pub trait CredentialStore: Send + Sync {
    async fn get(&self) -> AppResult<Option<String>>;
    async fn set(&self, token: &str) -> AppResult<()>;
    async fn delete(&self) -> AppResult<()>;
}

/// File-backed store: the credential lives in `<root>/token`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    root: PathBuf,
}

impl FileCredentialStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn token_path(&self) -> PathBuf {
        self.root.join(TOKEN_KEY)
    }
}

impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> AppResult<Option<String>> {
        match tokio::fs::read_to_string(self.token_path()).await {
            Ok(raw) => {
                let trimmed = raw.trim();
                Ok(if trimmed.is_empty() { None } else { Some(trimmed.to_string()) })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, token: &str) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.token_path(), token).await?;
        Ok(())
    }

    async fn delete(&self) -> AppResult<()> {
        match tokio::fs::remove_file(self.token_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> AppResult<Option<String>> {
        Ok(self.inner.read().clone())
    }

    async fn set(&self, token: &str) -> AppResult<()> {
        *self.inner.write() = Some(token.to_string());
        Ok(())
    }

    async fn delete(&self) -> AppResult<()> {
        *self.inner.write() = None;
        Ok(())
    }
}
