//! Vault and membership API endpoints.
//!
//! Provides endpoints for:
//! - Listing, creating, reading, updating and deleting vaults
//! - Choosing a default vault and leaving a vault
//! - Changing member roles and removing members
//! - Spending statistics

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AuthUser;
use super::routes::AppState;
use super::types::OkResponse;
use crate::ledger::{MemberView, NewVault, VaultDetails, VaultPatch, VaultSummary};
use crate::statistics::VaultStatistics;
use crate::vault::{MemberRole, Vault};

/// Create vault routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_vaults).post(create_vault))
        .route(
            "/:vault_id",
            get(get_vault).put(update_vault).delete(delete_vault),
        )
        .route("/:vault_id/default", post(set_default))
        .route("/:vault_id/leave", post(leave_vault))
        .route("/:vault_id/statistics", get(statistics))
        .route(
            "/:vault_id/members/:user_id",
            put(update_member).delete(remove_member),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: MemberRole,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/vaults - Vaults the caller belongs to.
async fn list_vaults(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<VaultSummary>> {
    Json(state.ledger.list_vaults(&user.actor()).await)
}

/// POST /api/vaults - Create a vault owned by the caller.
async fn create_vault(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewVault>,
) -> Result<Json<VaultDetails>, (StatusCode, String)> {
    Ok(Json(state.ledger.create_vault(&user.actor(), req).await?))
}

/// GET /api/vaults/:vault_id - Vault, the caller's membership and the members.
async fn get_vault(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
) -> Result<Json<VaultDetails>, (StatusCode, String)> {
    Ok(Json(state.ledger.get_vault(&user.actor(), vault_id).await?))
}

/// PUT /api/vaults/:vault_id - Update vault settings.
async fn update_vault(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Json(req): Json<VaultPatch>,
) -> Result<Json<Vault>, (StatusCode, String)> {
    Ok(Json(
        state.ledger.update_vault(&user.actor(), vault_id, req).await?,
    ))
}

/// DELETE /api/vaults/:vault_id - Delete a vault (owner only).
async fn delete_vault(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    state.ledger.delete_vault(&user.actor(), vault_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// POST /api/vaults/:vault_id/default - Make this the caller's default vault.
async fn set_default(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    state.ledger.set_default_vault(&user.actor(), vault_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// POST /api/vaults/:vault_id/leave - Leave a vault.
async fn leave_vault(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    state.ledger.leave_vault(&user.actor(), vault_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// GET /api/vaults/:vault_id/statistics - Spending totals and breakdowns.
async fn statistics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<VaultStatistics>, (StatusCode, String)> {
    let stats = state
        .ledger
        .vault_statistics(
            &user.actor(),
            vault_id,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .await?;
    Ok(Json(stats))
}

/// PUT /api/vaults/:vault_id/members/:user_id - Change a member's role.
async fn update_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, member_id)): Path<(Uuid, String)>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<MemberView>, (StatusCode, String)> {
    let member = state
        .ledger
        .update_member_role(&user.actor(), vault_id, &member_id, req.role)
        .await?;
    Ok(Json(member))
}

/// DELETE /api/vaults/:vault_id/members/:user_id - Remove a member.
async fn remove_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, member_id)): Path<(Uuid, String)>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    state
        .ledger
        .remove_member(&user.actor(), vault_id, &member_id)
        .await?;
    Ok(Json(OkResponse::ok()))
}
