//! HTTP API.
//!
//! JSON over axum. Handlers return `Result<Json<T>, (StatusCode, String)>`;
//! ledger errors convert into that pair so handlers can use `?`.

mod auth;
mod budgets;
mod expenses;
mod invitations;
mod routes;
mod templates;
mod types;
mod user;
mod vaults;

pub use auth::AuthUser;
pub use routes::{app, serve, AppState};
pub use types::*;

use axum::http::StatusCode;

use crate::error::LedgerError;

impl From<LedgerError> for (StatusCode, String) {
    fn from(e: LedgerError) -> Self {
        let status = match &e {
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::Conflict(_) | LedgerError::LimitReached(_) => StatusCode::CONFLICT,
            LedgerError::Storage(_) => {
                tracing::error!("Ledger storage failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, e.to_string())
    }
}
