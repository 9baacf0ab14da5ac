//! Budget records and their validation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::Audit;
use crate::catalog;
use crate::error::{LedgerError, LedgerResult};
use crate::expense::Expense;
use crate::validation;

pub const DEFAULT_ALERT_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Custom,
}

/// Which expenses count against a budget. An empty list does not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetScope {
    #[serde(default)]
    pub category_names: Vec<String>,
    #[serde(default)]
    pub template_ids: Vec<Uuid>,
    #[serde(default)]
    pub user_ids: Vec<String>,
}

impl BudgetScope {
    /// Every non-empty list must contain the expense's value. An expense
    /// without a template or payer fails a non-empty list for that field.
    pub fn matches(&self, expense: &Expense) -> bool {
        if !self.category_names.is_empty() && !self.category_names.contains(&expense.category_name)
        {
            return false;
        }
        if !self.template_ids.is_empty() {
            match expense.template_id {
                Some(id) if self.template_ids.contains(&id) => {}
                _ => return false,
            }
        }
        if !self.user_ids.is_empty() {
            match &expense.paid_by {
                Some(user) if self.user_ids.contains(user) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn is_unrestricted(&self) -> bool {
        self.category_names.is_empty() && self.template_ids.is_empty() && self.user_ids.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub vault_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub scope: BudgetScope,
    pub alert_threshold: u8,
    pub alert_enabled: bool,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

fn default_threshold() -> u8 {
    DEFAULT_ALERT_THRESHOLD
}

fn default_true() -> bool {
    true
}

/// Input for a new budget.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBudget {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub scope: BudgetScope,
    #[serde(default = "default_threshold")]
    pub alert_threshold: u8,
    #[serde(default = "default_true")]
    pub alert_enabled: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update; absent fields are left alone, `null` clears the nullable ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "validation::nullable")]
    pub description: Option<Option<String>>,
    pub amount: Option<f64>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "validation::nullable")]
    pub end_date: Option<Option<NaiveDate>>,
    pub scope: Option<BudgetScope>,
    pub alert_threshold: Option<u8>,
    pub alert_enabled: Option<bool>,
    pub is_active: Option<bool>,
}

impl Budget {
    pub fn create(
        vault_id: Uuid,
        new: NewBudget,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        let budget = Self {
            id: Uuid::new_v4(),
            vault_id,
            name: new.name,
            description: new.description,
            amount: new.amount,
            period: new.period,
            start_date: new.start_date,
            end_date: new.end_date,
            scope: new.scope,
            alert_threshold: new.alert_threshold,
            alert_enabled: new.alert_enabled,
            is_active: new.is_active,
            audit: Audit::initial(user_id, now),
        };
        budget.validated()
    }

    /// Apply a patch and re-validate the budget as a whole.
    pub fn patched(&self, patch: BudgetPatch, user_id: &str, now: DateTime<Utc>) -> LedgerResult<Self> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(amount) = patch.amount {
            next.amount = amount;
        }
        if let Some(period) = patch.period {
            next.period = period;
        }
        if let Some(start) = patch.start_date {
            next.start_date = start;
        }
        if let Some(end) = patch.end_date {
            next.end_date = end;
        }
        if let Some(scope) = patch.scope {
            next.scope = scope;
        }
        if let Some(threshold) = patch.alert_threshold {
            next.alert_threshold = threshold;
        }
        if let Some(enabled) = patch.alert_enabled {
            next.alert_enabled = enabled;
        }
        if let Some(active) = patch.is_active {
            next.is_active = active;
        }
        next.audit.touch(user_id, now);
        next.validated()
    }

    fn validated(mut self) -> LedgerResult<Self> {
        self.name = validation::name("Budget name", &self.name)?;
        self.description = validation::optional_text("Description", self.description.take())?;
        validation::amount("Budget amount", self.amount)?;

        if !(1..=100).contains(&self.alert_threshold) {
            return Err(LedgerError::invalid("Alert threshold must be between 1 and 100"));
        }
        match (self.period, self.end_date) {
            (BudgetPeriod::Custom, None) => {
                return Err(LedgerError::invalid("Custom budgets need an end date"));
            }
            (_, Some(end)) if end < self.start_date => {
                return Err(LedgerError::invalid("End date must not be before start date"));
            }
            _ => {}
        }
        for name in &self.scope.category_names {
            if !catalog::exists(name) {
                return Err(LedgerError::invalid(format!("Unknown category '{}'", name)));
            }
        }
        dedup(&mut self.scope.category_names);
        dedup(&mut self.scope.template_ids);
        dedup(&mut self.scope.user_ids);
        Ok(self)
    }
}

fn dedup<T: PartialEq + Clone>(items: &mut Vec<T>) {
    let mut seen: Vec<T> = Vec::with_capacity(items.len());
    items.retain(|item| {
        if seen.contains(item) {
            false
        } else {
            seen.push(item.clone());
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_budget(period: BudgetPeriod) -> NewBudget {
        NewBudget {
            name: " Food ".into(),
            description: None,
            amount: 500.0,
            period,
            start_date: day(2025, 1, 1),
            end_date: None,
            scope: BudgetScope::default(),
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            alert_enabled: true,
            is_active: true,
        }
    }

    #[test]
    fn test_create_trims_and_validates() {
        let budget = Budget::create(Uuid::nil(), new_budget(BudgetPeriod::Monthly), "u1", Utc::now())
            .unwrap();
        assert_eq!(budget.name, "Food");

        let mut bad = new_budget(BudgetPeriod::Monthly);
        bad.amount = 0.0;
        assert!(Budget::create(Uuid::nil(), bad, "u1", Utc::now()).is_err());

        let mut bad = new_budget(BudgetPeriod::Monthly);
        bad.alert_threshold = 0;
        assert!(Budget::create(Uuid::nil(), bad, "u1", Utc::now()).is_err());

        let mut bad = new_budget(BudgetPeriod::Monthly);
        bad.scope.category_names = vec!["Moon Rocks".into()];
        assert!(Budget::create(Uuid::nil(), bad, "u1", Utc::now()).is_err());
    }

    #[test]
    fn test_custom_needs_ordered_end_date() {
        assert!(Budget::create(Uuid::nil(), new_budget(BudgetPeriod::Custom), "u1", Utc::now()).is_err());

        let mut custom = new_budget(BudgetPeriod::Custom);
        custom.end_date = Some(day(2024, 12, 31));
        assert!(Budget::create(Uuid::nil(), custom.clone(), "u1", Utc::now()).is_err());

        custom.end_date = Some(day(2025, 1, 1));
        assert!(Budget::create(Uuid::nil(), custom, "u1", Utc::now()).is_ok());
    }

    #[test]
    fn test_patch_revalidates_whole_budget() {
        let budget = Budget::create(Uuid::nil(), new_budget(BudgetPeriod::Monthly), "u1", Utc::now())
            .unwrap();
        let patch = BudgetPatch {
            period: Some(BudgetPeriod::Custom),
            ..Default::default()
        };
        assert!(budget.patched(patch, "u1", Utc::now()).is_err());

        let patch = BudgetPatch {
            amount: Some(750.0),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = budget.patched(patch, "u2", Utc::now()).unwrap();
        assert_eq!(updated.amount, 750.0);
        assert!(!updated.is_active);
        assert_eq!(updated.audit.updated_by.as_deref(), Some("u2"));
    }

    #[test]
    fn test_patch_null_clears_end_date_and_description() {
        let mut new = new_budget(BudgetPeriod::Custom);
        new.description = Some("Winter".into());
        new.end_date = NaiveDate::from_ymd_opt(2025, 1, 31);
        let budget = Budget::create(Uuid::nil(), new, "u1", Utc::now()).unwrap();

        let patch: BudgetPatch = serde_json::from_str(r#"{"amount":900}"#).unwrap();
        let kept = budget.patched(patch, "u1", Utc::now()).unwrap();
        assert_eq!(kept.end_date, budget.end_date);
        assert_eq!(kept.description.as_deref(), Some("Winter"));

        let patch: BudgetPatch =
            serde_json::from_str(r#"{"period":"monthly","end_date":null,"description":null}"#).unwrap();
        let cleared = budget.patched(patch, "u1", Utc::now()).unwrap();
        assert_eq!(cleared.period, BudgetPeriod::Monthly);
        assert_eq!(cleared.end_date, None);
        assert_eq!(cleared.description, None);

        // Custom budgets still need an end date
        let patch: BudgetPatch = serde_json::from_str(r#"{"end_date":null}"#).unwrap();
        assert!(budget.patched(patch, "u1", Utc::now()).is_err());
    }

    #[test]
    fn test_new_budget_defaults() {
        let parsed: NewBudget = serde_json::from_str(
            r#"{"name":"Fuel","amount":120,"period":"weekly","start_date":"2025-03-03"}"#,
        )
        .unwrap();
        assert_eq!(parsed.alert_threshold, 80);
        assert!(parsed.alert_enabled && parsed.is_active);
        assert!(parsed.scope.is_unrestricted());
    }
}
