//! Audit trail carried by every persisted record.
//!
//! User ids are stored as plain strings: identities live with the external
//! auth provider, so there is nothing to reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

impl Audit {
    /// Fields for a freshly created record: created and updated share one instant.
    pub fn initial(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            created_by: user_id.to_string(),
            updated_at: now,
            updated_by: Some(user_id.to_string()),
            deleted_at: None,
            deleted_by: None,
        }
    }

    pub fn touch(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.updated_at = now;
        self.updated_by = Some(user_id.to_string());
    }

    pub fn soft_delete(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.deleted_by = Some(user_id.to_string());
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
