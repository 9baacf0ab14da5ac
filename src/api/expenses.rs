//! Expense API endpoints, nested under `/api/vaults/:vault_id/expenses`.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AuthUser;
use super::routes::AppState;
use super::types::OkResponse;
use crate::expense::{DayGroup, ExpenseQuery, Page};
use crate::ledger::{ExpensePatch, ExpenseView, NewExpense};

/// Create expense routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route("/daily", get(list_by_day))
        .route(
            "/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

/// GET /api/vaults/:vault_id/expenses - Filtered, paginated, newest first.
async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<Page<ExpenseView>>, (StatusCode, String)> {
    let page = state
        .ledger
        .list_expenses(&user.actor(), vault_id, &query)
        .await?;
    Ok(Json(page))
}

/// GET /api/vaults/:vault_id/expenses/daily - Same listing grouped by day.
async fn list_by_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<Page<DayGroup<ExpenseView>>>, (StatusCode, String)> {
    let page = state
        .ledger
        .list_expenses_by_day(&user.actor(), vault_id, &query)
        .await?;
    Ok(Json(page))
}

/// POST /api/vaults/:vault_id/expenses
async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vault_id): Path<Uuid>,
    Json(req): Json<NewExpense>,
) -> Result<Json<ExpenseView>, (StatusCode, String)> {
    Ok(Json(
        state.ledger.create_expense(&user.actor(), vault_id, req).await?,
    ))
}

/// GET /api/vaults/:vault_id/expenses/:id
async fn get_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ExpenseView>, (StatusCode, String)> {
    Ok(Json(
        state.ledger.get_expense(&user.actor(), vault_id, id).await?,
    ))
}

/// PUT /api/vaults/:vault_id/expenses/:id
async fn update_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ExpensePatch>,
) -> Result<Json<ExpenseView>, (StatusCode, String)> {
    Ok(Json(
        state
            .ledger
            .update_expense(&user.actor(), vault_id, id, req)
            .await?,
    ))
}

/// DELETE /api/vaults/:vault_id/expenses/:id
async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((vault_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    state
        .ledger
        .delete_expense(&user.actor(), vault_id, id)
        .await?;
    Ok(Json(OkResponse::ok()))
}
