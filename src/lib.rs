// Library root - exports for the binary and tests

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{LedgerError, StorageError};
pub use services::{LedgerEngine, LedgerSettings};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LedgerEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by fresh in-memory stores.
    pub fn in_memory(config: Arc<Config>) -> Self {
        let (wallets, transactions) = storage::in_memory();
        let engine = LedgerEngine::new(wallets, transactions, config.ledger_settings());
        Self {
            engine: Arc::new(engine),
            config,
        }
    }
}

/// Full API router with middleware layers applied.
pub fn app(state: AppState) -> Router {
    let rate_limiter = middleware::RateLimiter::new(
        state.config.rate_limit_max,
        state.config.rate_limit_window_secs,
    );

    Router::new()
        .route("/health", get(health_check))
        .route("/wallets", post(handlers::create_wallet).get(handlers::list_wallets))
        .route("/wallets/transfer", post(handlers::transfer))
        .route("/wallets/:id", get(handlers::get_wallet))
        .route("/wallets/:id/fund", post(handlers::fund_wallet))
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::security_headers_middleware))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
