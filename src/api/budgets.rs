//! Budget API endpoints, nested under `/api/vaults/:vault_id/budgets`.
//!
//! Progress endpoints accept `as_of=YYYY-MM-DD`; without it they use today (UTC).

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AuthUser;
use super::routes::AppState;
use super::types::OkResponse;
use crate::budget::{Budget, BudgetPatch, BudgetProgress, BudgetSummary, CalendarDay, NewBudget};
use crate::ledger::BudgetFilter;

/// Create budget routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_budgets).post(create_budget))
        .route("/progress", get(all_progress))
        .route("/summary", get(summary))
        .route(
            "/:id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route("/:id/progress", get(budget_progress))
        .route("/:id/calendar", get(calendar))
}

// ─────────────────────────────────────────────────────────────────────────────
// Query Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/vaults/:vault_id/budgets?is_active&category_name&user_id
async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Query(filter): Query<BudgetFilter>,
) -> Result<Json<Vec<Budget>>, (StatusCode, String)> {
    Ok(Json(
        state
            .ledger
            .list_budgets(&user.actor(), vault_id, &filter)
            .await?,
    ))
}

/// POST /api/vaults/:vault_id/budgets
async fn create_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Json(req): Json<NewBudget>,
) -> Result<Json<Budget>, (StatusCode, String)> {
    Ok(Json(
        state.ledger.create_budget(&user.actor(), vault_id, req).await?,
    ))
}

/// GET /api/vaults/:vault_id/budgets/progress - All active budgets.
async fn all_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<Vec<BudgetProgress>>, (StatusCode, String)> {
    Ok(Json(
        state
            .ledger
            .budgets_progress(&user.actor(), vault_id, query.as_of)
            .await?,
    ))
}

/// GET /api/vaults/:vault_id/budgets/summary - Lifetime spending per active budget.
async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
) -> Result<Json<Vec<BudgetSummary>>, (StatusCode, String)> {
    Ok(Json(
        state.ledger.budgets_summary(&user.actor(), vault_id).await?,
    ))
}

/// GET /api/vaults/:vault_id/budgets/:id
async fn get_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Budget>, (StatusCode, String)> {
    Ok(Json(
        state.ledger.get_budget(&user.actor(), vault_id, id).await?,
    ))
}

/// PUT /api/vaults/:vault_id/budgets/:id
async fn update_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
    Json(req): Json<BudgetPatch>,
) -> Result<Json<Budget>, (StatusCode, String)> {
    Ok(Json(
        state
            .ledger
            .update_budget(&user.actor(), vault_id, id, req)
            .await?,
    ))
}

/// DELETE /api/vaults/:vault_id/budgets/:id
async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    state
        .ledger
        .delete_budget(&user.actor(), vault_id, id)
        .await?;
    Ok(Json(OkResponse::ok()))
}

/// GET /api/vaults/:vault_id/budgets/:id/progress
async fn budget_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<BudgetProgress>, (StatusCode, String)> {
    Ok(Json(
        state
            .ledger
            .budget_progress(&user.actor(), vault_id, id, query.as_of)
            .await?,
    ))
}

/// GET /api/vaults/:vault_id/budgets/:id/calendar?year&month
async fn calendar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarDay>>, (StatusCode, String)> {
    Ok(Json(
        state
            .ledger
            .budget_calendar(&user.actor(), vault_id, id, query.year, query.month)
            .await?,
    ))
}
