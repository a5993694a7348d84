//! Identity handling: the verified principal, the per-request execution
//! context, and the credential-issuing auth provider.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod provider;
mod request_context;

pub use principal::Principal;
pub use provider::{AuthProvider, LocalAuthProvider, SignInRequest, SignUpRequest};
pub use request_context::RequestContext;
