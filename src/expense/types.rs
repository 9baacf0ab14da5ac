//! Expense and expense template records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::Audit;

/// A single spending entry in a vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub vault_id: Uuid,
    #[serde(default)]
    pub note: Option<String>,
    pub amount: f64,
    pub category_name: String,
    pub date: DateTime<Utc>,
    /// Member who paid; `None` marks a vault-level (shared) expense.
    #[serde(default)]
    pub paid_by: Option<String>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    #[serde(flatten)]
    pub audit: Audit,
}

/// Who a template assigns new expenses to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum PaidByDefault {
    /// Whoever creates the expense from the template.
    Creator,
    /// Nobody in particular: a vault-level expense.
    #[default]
    Vault,
    User(String),
}

impl PaidByDefault {
    /// Resolve to a concrete payer for an expense created by `creator_id`.
    pub fn resolve(&self, creator_id: &str) -> Option<String> {
        match self {
            Self::Creator => Some(creator_id.to_string()),
            Self::Vault => None,
            Self::User(id) => Some(id.clone()),
        }
    }
}

pub const DEFAULT_TEMPLATE_ICON: &str = "📝";

/// A reusable preset for quickly recording expenses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseTemplate {
    pub id: Uuid,
    pub vault_id: Uuid,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_type: crate::vault::IconType,
    #[serde(default)]
    pub default_note: Option<String>,
    #[serde(default)]
    pub default_amount: Option<f64>,
    #[serde(default)]
    pub default_category_name: Option<String>,
    #[serde(default)]
    pub default_paid_by: PaidByDefault,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub audit: Audit,
}

/// Pre-filled values for a new expense, derived from a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseDraft {
    pub template_id: Uuid,
    pub note: Option<String>,
    pub amount: Option<f64>,
    pub category_name: Option<String>,
    pub paid_by: Option<String>,
}

impl ExpenseTemplate {
    pub fn draft_for(&self, creator_id: &str) -> ExpenseDraft {
        ExpenseDraft {
            template_id: self.id,
            note: self.default_note.clone(),
            amount: self.default_amount,
            category_name: self.default_category_name.clone(),
            paid_by: self.default_paid_by.resolve(creator_id),
        }
    }

    pub fn record_use(&mut self, now: DateTime<Utc>) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.last_used_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_by_resolution() {
        assert_eq!(PaidByDefault::Creator.resolve("u1").as_deref(), Some("u1"));
        assert_eq!(PaidByDefault::Vault.resolve("u1"), None);
        assert_eq!(
            PaidByDefault::User("u2".into()).resolve("u1").as_deref(),
            Some("u2")
        );
    }

    #[test]
    fn test_paid_by_wire_format() {
        let json = serde_json::to_value(PaidByDefault::User("u2".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "user", "user_id": "u2"}));
        let parsed: PaidByDefault = serde_json::from_str(r#"{"kind":"creator"}"#).unwrap();
        assert_eq!(parsed, PaidByDefault::Creator);
    }
}
