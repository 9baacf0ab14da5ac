//! Invitation API endpoints.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AuthUser;
use super::routes::AppState;
use super::types::OkResponse;
use crate::ledger::{NewInvitation, PendingInvitation};
use crate::vault::{Invitation, VaultMember};

/// Invitations addressed to the caller.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_pending))
        .route("/:id/accept", post(accept))
        .route("/:id/decline", post(decline))
}

/// Sending invitations, nested under a vault.
pub fn vault_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(invite))
}

/// GET /api/invitations - Pending invitations for the caller.
async fn list_pending(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<PendingInvitation>> {
    Json(state.ledger.list_pending_invitations(&user.actor()).await)
}

/// POST /api/vaults/:vault_id/invitations - Invite a user by email.
async fn invite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Json(req): Json<NewInvitation>,
) -> Result<Json<Invitation>, (StatusCode, String)> {
    Ok(Json(state.ledger.invite(&user.actor(), vault_id, req).await?))
}

/// POST /api/invitations/:id/accept
async fn accept(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<VaultMember>, (StatusCode, String)> {
    Ok(Json(state.ledger.accept_invitation(&user.actor(), id).await?))
}

/// POST /api/invitations/:id/decline
async fn decline(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    state.ledger.decline_invitation(&user.actor(), id).await?;
    Ok(Json(OkResponse::ok()))
}
