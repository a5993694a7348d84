use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::AppResult;

use super::credentials::CredentialStore;

/// Locally-derived "is logged in" view, functionally dependent on credential
/// presence. The invariant: after any full reset of derived state, the value
/// is recomputed from the credential store before `reset` returns, so no
/// reader ever observes the transient cleared state.
#[derive(Debug)]
pub struct LoginStateCache<S> {
    store: S,
    signed_in: AtomicBool,
}

impl<S: CredentialStore> LoginStateCache<S> {
    /// Build the cache and write the initial value immediately.
    pub async fn new(store: S) -> AppResult<Self> {
        let cache = Self { store, signed_in: AtomicBool::new(false) };
        cache.refresh().await?;
        Ok(cache)
    }

    /// Recompute from the credential store and publish the result.
    pub async fn refresh(&self) -> AppResult<bool> {
        let present = self.store.get().await?.is_some();
        self.signed_in.store(present, Ordering::SeqCst);
        Ok(present)
    }

    pub fn is_logged_in(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    /// Full cache reset. Derived state is cleared and then rewritten from the
    /// credential store within the same awaited call.
    pub async fn reset(&self) -> AppResult<bool> {
        self.signed_in.store(false, Ordering::SeqCst);
        self.refresh().await
    }
}
