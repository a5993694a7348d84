use crate::error::AppResult;

use super::credentials::CredentialStore;

/// Navigation roots the startup gate can choose between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Authenticated application root.
    App,
    /// Unauthenticated sign-in/sign-up flow.
    Auth,
}

/// One-shot startup check: read the credential store and pick the initial
/// route. This decides the *initial* root only; sign-in and sign-out flows
/// navigate explicitly afterwards.
pub async fn initial_route<S: CredentialStore>(store: &S) -> AppResult<Route> {
    Ok(match store.get().await? {
        Some(_) => Route::App,
        None => Route::Auth,
    })
}
