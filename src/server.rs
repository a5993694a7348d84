//!
//! notedly HTTP server
//! --------------------
//! Axum-based HTTP API exposing the single `/api` endpoint.
//!
//! Responsibilities:
//! - Per-request pipeline: query guard, then context construction, then
//!   typed dispatch; guard rejection short-circuits before any resolver runs.
//! - Generic 404 for unmatched routes and panic containment for handlers.
//! - Error detail suppression in production mode.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::FutureExt;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::guard::QueryGuard;
use crate::identity::{AuthProvider, LocalAuthProvider, RequestContext};
use crate::resolvers;
use crate::schema::ApiRequest;
use crate::storage::SharedStore;
use crate::token::TokenCodec;

/// Shared server state injected into all handlers. Only the store and the
/// signing secret outlive a request; everything identity-related is rebuilt
/// per request.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub codec: Arc<TokenCodec>,
    pub guard: Arc<QueryGuard>,
    pub provider: Arc<LocalAuthProvider>,
    pub production: bool,
    /// Counts resolver dispatches; lets operators (and tests) confirm that
    /// guard rejections consume no resolver work.
    pub resolved: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let store = SharedStore::new(&config.db_root)?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: &ServerConfig, store: SharedStore) -> Self {
        let codec = Arc::new(TokenCodec::new(config.jwt_secret.as_bytes()));
        let provider = Arc::new(LocalAuthProvider::new(store.clone(), (*codec).clone()));
        Self {
            store,
            codec,
            guard: Arc::new(QueryGuard::new(config.guard)),
            provider,
            production: config.production,
            resolved: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Start the HTTP server on the configured port.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(&config)?;
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "notedly ok" }))
        .route("/api", post(api_handler))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"status":"error","code":"not_found","message":"not found"})),
    )
}

/// The guarded request pipeline, separated from the axum handler so it can be
/// exercised directly in tests: guard first, context second, dispatch last.
pub fn execute(state: &AppState, headers: &HeaderMap, body: &serde_json::Value) -> AppResult<serde_json::Value> {
    let shape = state.guard.evaluate(body)?;
    let request: ApiRequest = serde_json::from_value(body.clone())
        .map_err(|e| AppError::user("bad_request".to_string(), e.to_string()))?;
    let ctx = RequestContext::build(headers, &state.codec, state.store.clone())?;
    state.resolved.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(target: "api", depth = shape.depth, cost = shape.cost, "dispatch");
    let response = resolvers::dispatch(&ctx, state.provider.as_ref() as &dyn AuthProvider, request)?;
    Ok(json!({"status":"ok","data": response}))
}

fn error_response(state: &AppState, err: &AppError) -> (StatusCode, Json<serde_json::Value>) {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "status": "error",
            "code": err.code_str(),
            "message": err.client_message(state.production)
        })),
    )
}

async fn api_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let fut = async { execute(&state, &headers, &body) };
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => (StatusCode::OK, Json(value)),
        Ok(Err(err)) => {
            match &err {
                AppError::Internal { .. } => error!("api error: {}", err),
                AppError::Guard { .. } | AppError::Auth { .. } => warn!("api rejected: {}", err),
                _ => {}
            }
            error_response(&state, &err)
        }
        Err(panic_payload) => {
            // Convert panics to a 500 error response without crashing the server task.
            let msg = if let Some(s) = panic_payload.downcast_ref::<&str>() { *s }
                      else if let Some(s) = panic_payload.downcast_ref::<String>() { s.as_str() }
                      else { "panic" };
            error!(target: "panic", "api_handler panic: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status":"error",
                    "code":"internal_panic",
                    "message":"internal server error"
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardConfig;
    use tempfile::tempdir;

    fn test_state() -> (AppState, tempfile::TempDir) {
        let tmp = tempdir().unwrap();
        let config = ServerConfig {
            http_port: 0,
            db_root: tmp.path().to_string_lossy().into_owned(),
            jwt_secret: "server-test-secret".into(),
            production: false,
            guard: GuardConfig::default(),
        };
        (AppState::new(&config).unwrap(), tmp)
    }

    fn deep(levels: usize) -> serde_json::Value {
        let mut doc = json!("leaf");
        for _ in 0..levels {
            doc = json!({ "child": doc });
        }
        doc
    }

    #[test]
    fn guard_rejection_short_circuits_resolvers() {
        let (state, _tmp) = test_state();
        let err = execute(&state, &HeaderMap::new(), &deep(6)).unwrap_err();
        assert_eq!(err.code_str(), "depth_exceeded");
        assert_eq!(state.resolved.load(Ordering::Relaxed), 0);

        let err = execute(&state, &HeaderMap::new(), &json!({"op":"notes","limit": 5000})).unwrap_err();
        assert_eq!(err.code_str(), "complexity_exceeded");
        assert_eq!(state.resolved.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn malformed_payload_is_typed_user_error_not_guard_error() {
        let (state, _tmp) = test_state();
        let err = execute(&state, &HeaderMap::new(), &json!({})).unwrap_err();
        assert_eq!(err.code_str(), "bad_request");
        assert_eq!(err.http_status(), 400);
        assert_eq!(state.resolved.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn accepted_request_reaches_resolver() {
        let (state, _tmp) = test_state();
        let out = execute(&state, &HeaderMap::new(), &json!({"op":"notes"})).unwrap();
        assert_eq!(out["status"], "ok");
        assert_eq!(state.resolved.load(Ordering::Relaxed), 1);
    }
}
