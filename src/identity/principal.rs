use serde::{Deserialize, Serialize};

/// The verified identity behind a request. Reconstructed from the access
/// token on every request; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
}
