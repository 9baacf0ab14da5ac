//! Shared API request/response types.

use serde::{Deserialize, Serialize};

use crate::catalog::{Category, CategoryGroup};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dev_mode: bool,
    pub auth_required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoriesResponse {
    pub groups: &'static [CategoryGroup],
    pub categories: &'static [Category],
}

/// Generic acknowledgement for operations without a body to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
