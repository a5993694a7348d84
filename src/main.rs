use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use notedly::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let config = ServerConfig::from_env();
    info!(
        target: "notedly",
        "Notedly starting: RUST_LOG='{}', http_port={}, db_root='{}', env={}, guard depth={} complexity={}",
        rust_log,
        config.http_port,
        config.db_root,
        if config.production { "production" } else { "development" },
        config.guard.max_depth,
        config.guard.max_complexity
    );
    if config.jwt_secret.is_empty() {
        tracing::warn!(target: "notedly", "NOTEDLY_JWT_SECRET is unset; tokens are signed with an empty secret");
    }

    notedly::server::run(config).await
}
