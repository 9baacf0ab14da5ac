//! Router assembly and server lifecycle.

use std::sync::Arc;

use axum::middleware;
use axum::{extract::State, response::Json, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog;
use crate::config::Config;
use crate::ledger::Ledger;
use crate::store::{JsonFileSink, LedgerStore};

use super::auth;
use super::budgets as budgets_api;
use super::expenses as expenses_api;
use super::invitations as invitations_api;
use super::templates as templates_api;
use super::types::*;
use super::user as user_api;
use super::vaults as vaults_api;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub ledger: Ledger,
}

/// Build the full router around `state`.
pub fn app(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/categories", get(categories));

    let protected_routes = Router::new()
        .nest("/api/me", user_api::routes())
        .nest("/api/invitations", invitations_api::routes())
        .nest("/api/vaults", vaults_api::routes())
        .nest(
            "/api/vaults/:vault_id/invitations",
            invitations_api::vault_routes(),
        )
        .nest("/api/vaults/:vault_id/expenses", expenses_api::routes())
        .nest("/api/vaults/:vault_id/templates", templates_api::routes())
        .nest("/api/vaults/:vault_id/budgets", budgets_api::routes())
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = LedgerStore::open(Box::new(JsonFileSink::in_dir(&config.data_dir))).await;
    let ledger = Ledger::new(store, config.ledger_settings());

    if config.dev_mode {
        tracing::warn!("DEV_MODE is on: requests are trusted without token verification");
    } else if config.auth.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET is not set: protected endpoints will refuse every request");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState { config, ledger });
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Setup graceful shutdown on SIGTERM/SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, finishing in-flight requests...");
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dev_mode: state.config.dev_mode,
        auth_required: state.config.auth.auth_required(state.config.dev_mode),
    })
}

async fn categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        groups: catalog::groups(),
        categories: catalog::categories(),
    })
}
