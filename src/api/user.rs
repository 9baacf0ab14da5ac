//! Current-user endpoints.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthUser;
use super::routes::AppState;
use crate::ledger::Me;

/// Create current-user routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(me))
        .route("/display-name", post(sync_display_name))
}

#[derive(Debug, Deserialize)]
pub struct DisplayNameRequest {
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct DisplayNameResponse {
    pub display_name: String,
    pub updated_memberships: usize,
}

/// GET /api/me - Profile and pending invitation count.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<Me> {
    Json(state.ledger.me(&user.actor()).await)
}

/// POST /api/me/display-name - Rename the caller across all vaults.
async fn sync_display_name(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<DisplayNameRequest>,
) -> Result<Json<DisplayNameResponse>, (StatusCode, String)> {
    let updated_memberships = state
        .ledger
        .sync_display_name(&user.actor(), &req.display_name)
        .await?;
    Ok(Json(DisplayNameResponse {
        display_name: req.display_name.trim().to_string(),
        updated_memberships,
    }))
}
