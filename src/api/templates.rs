//! Expense template API endpoints, nested under `/api/vaults/:vault_id/templates`.

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
use crate::expense::{ExpenseDraft, ExpenseTemplate};
use crate::ledger::{NewTemplate, TemplatePatch};

/// Create template routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route(
            "/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/:id/apply", post(apply_template))
}

/// GET /api/vaults/:vault_id/templates
async fn list_templates(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
) -> Result<Json<Vec<ExpenseTemplate>>, (StatusCode, String)> {
    Ok(Json(
        state.ledger.list_templates(&user.actor(), vault_id).await?,
    ))
}

/// POST /api/vaults/:vault_id/templates
async fn create_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Json(req): Json<NewTemplate>,
) -> Result<Json<ExpenseTemplate>, (StatusCode, String)> {
    Ok(Json(
        state
            .ledger
            .create_template(&user.actor(), vault_id, req)
            .await?,
    ))
}

/// GET /api/vaults/:vault_id/templates/:id
async fn get_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ExpenseTemplate>, (StatusCode, String)> {
    Ok(Json(
        state.ledger.get_template(&user.actor(), vault_id, id).await?,
    ))
}

/// PUT /api/vaults/:vault_id/templates/:id
async fn update_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
    Json(req): Json<TemplatePatch>,
) -> Result<Json<ExpenseTemplate>, (StatusCode, String)> {
    Ok(Json(
        state
            .ledger
            .update_template(&user.actor(), vault_id, id, req)
            .await?,
    ))
}

/// DELETE /api/vaults/:vault_id/templates/:id
async fn delete_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    state
        .ledger
        .delete_template(&user.actor(), vault_id, id)
        .await?;
    Ok(Json(OkResponse::ok()))
}

/// POST /api/vaults/:vault_id/templates/:id/apply - Pre-filled expense values.
async fn apply_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ExpenseDraft>, (StatusCode, String)> {
    Ok(Json(
        state
            .ledger
            .apply_template(&user.actor(), vault_id, id)
            .await?,
    ))
}
