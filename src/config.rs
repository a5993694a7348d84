//! Environment-driven configuration for the server and client binaries.
//! All knobs are plain environment variables so deployment stays a matter of
//! exporting values; nothing here is read again after startup.

use std::env;

/// Server-side configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port for the HTTP API.
    pub http_port: u16,
    /// Root folder for persisted users/notes.
    pub db_root: String,
    /// Secret used to sign and verify access tokens.
    pub jwt_secret: String,
    /// True when running in production; controls error detail suppression.
    pub production: bool,
    pub guard: GuardConfig,
}

/// Thresholds for the pre-execution query guard.
#[derive(Debug, Clone, Copy)]
pub struct GuardConfig {
    pub max_depth: usize,
    pub max_complexity: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self { max_depth: 5, max_complexity: 1000 }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            http_port: env_parse("NOTEDLY_HTTP_PORT", 4000),
            db_root: env::var("NOTEDLY_DB_FOLDER").unwrap_or_else(|_| "dbs".to_string()),
            jwt_secret: env::var("NOTEDLY_JWT_SECRET").unwrap_or_default(),
            production: env::var("NOTEDLY_ENV").map(|v| v.eq_ignore_ascii_case("production")).unwrap_or(false),
            guard: GuardConfig {
                max_depth: env_parse("NOTEDLY_MAX_DEPTH", GuardConfig::default().max_depth),
                max_complexity: env_parse("NOTEDLY_MAX_COMPLEXITY", GuardConfig::default().max_complexity),
            },
        }
    }
}

/// Base URI of the API as seen from the client; used by the CLI.
pub fn api_uri() -> String {
    env::var("NOTEDLY_API_URI").unwrap_or_else(|_| "http://127.0.0.1:4000".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_defaults_match_policy() {
        let g = GuardConfig::default();
        assert_eq!(g.max_depth, 5);
        assert_eq!(g.max_complexity, 1000);
    }
}
