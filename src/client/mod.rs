//! Client-side building blocks: the credential store boundary, the auth link
//! middleware that attaches the credential to outbound requests, the derived
//! login-state cache, the startup auth gate, and the API session that ties
//! them together. Everything here is constructed explicitly and passed down;
//! there is no process-global client state.

mod api;
mod auth_link;
mod credentials;
mod gate;
mod login_state;

pub use api::ApiSession;
pub use auth_link::AuthLink;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TOKEN_KEY};
pub use gate::{initial_route, Route};
pub use login_state::LoginStateCache;
