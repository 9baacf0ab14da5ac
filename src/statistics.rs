//! Spending statistics for a vault.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::catalog;
use crate::expense::{DateRange, Expense, ExpenseTemplate, DEFAULT_TEMPLATE_ICON};
use crate::vault::VaultMember;

pub const NO_TEMPLATE_LABEL: &str = "No Template";
pub const VAULT_LEVEL_LABEL: &str = "Vault-level expense";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Total {
    pub amount: f64,
    pub count: usize,
}

impl Total {
    fn add(&mut self, amount: f64) {
        self.amount += amount;
        self.count += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateBucket {
    pub template_id: Option<Uuid>,
    pub name: String,
    pub icon: String,
    #[serde(flatten)]
    pub total: Total,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryBucket {
    pub category_name: String,
    pub icon: Option<&'static str>,
    pub icon_type: Option<&'static str>,
    pub color: Option<&'static str>,
    #[serde(flatten)]
    pub total: Total,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberBucket {
    pub user_id: Option<String>,
    pub display_name: String,
    #[serde(flatten)]
    pub total: Total,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultStatistics {
    pub total: Total,
    pub by_template: Vec<TemplateBucket>,
    pub by_category: Vec<CategoryBucket>,
    pub by_member: Vec<MemberBucket>,
}

/// Collect buckets in first-seen order, then sort by amount (largest first).
fn ranked<K, B>(buckets: Vec<(K, B)>, amount: impl Fn(&B) -> f64) -> Vec<B> {
    let mut buckets: Vec<B> = buckets.into_iter().map(|(_, b)| b).collect();
    buckets.sort_by(|a, b| amount(b).total_cmp(&amount(a)));
    buckets
}

fn bucket<'a, K: PartialEq + Clone, B>(
    buckets: &'a mut Vec<(K, B)>,
    key: &K,
    init: impl FnOnce() -> B,
) -> &'a mut B {
    let idx = match buckets.iter().position(|(k, _)| k == key) {
        Some(idx) => idx,
        None => {
            buckets.push((key.clone(), init()));
            buckets.len() - 1
        }
    };
    &mut buckets[idx].1
}

/// Aggregate live expenses, optionally restricted to `range`.
///
/// `templates` may include deleted templates so historical expenses keep
/// their template's name; `members` supplies display names for payers.
pub fn compute(
    expenses: &[&Expense],
    templates: &[&ExpenseTemplate],
    members: &[&VaultMember],
    range: Option<DateRange>,
) -> VaultStatistics {
    let template_by_id: HashMap<Uuid, &ExpenseTemplate> =
        templates.iter().map(|t| (t.id, *t)).collect();
    let name_by_user: HashMap<&str, &str> = members
        .iter()
        .map(|m| (m.user_id.as_str(), m.display_name.as_str()))
        .collect();

    let mut total = Total::default();
    let mut by_template: Vec<(Option<Uuid>, TemplateBucket)> = Vec::new();
    let mut by_category: Vec<(String, CategoryBucket)> = Vec::new();
    let mut by_member: Vec<(Option<String>, MemberBucket)> = Vec::new();

    let live = expenses
        .iter()
        .filter(|e| !e.audit.is_deleted())
        .filter(|e| range.map_or(true, |r| r.contains(e.date)));

    for expense in live {
        total.add(expense.amount);

        let template = expense.template_id.and_then(|id| template_by_id.get(&id).copied());
        let template_key = template.map(|t| t.id);
        bucket(&mut by_template, &template_key, || TemplateBucket {
            template_id: template_key,
            name: template
                .map(|t| t.name.clone())
                .unwrap_or_else(|| NO_TEMPLATE_LABEL.to_string()),
            icon: template
                .and_then(|t| t.icon.clone())
                .unwrap_or_else(|| DEFAULT_TEMPLATE_ICON.to_string()),
            total: Total::default(),
        })
        .total
        .add(expense.amount);

        let category = catalog::find(&expense.category_name);
        bucket(&mut by_category, &expense.category_name, || CategoryBucket {
            category_name: expense.category_name.clone(),
            icon: category.map(|c| c.icon),
            icon_type: category.map(|c| c.icon_type),
            color: category.map(|c| c.color),
            total: Total::default(),
        })
        .total
        .add(expense.amount);

        bucket(&mut by_member, &expense.paid_by, || MemberBucket {
            user_id: expense.paid_by.clone(),
            display_name: match &expense.paid_by {
                Some(user) => name_by_user
                    .get(user.as_str())
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| user.clone()),
                None => VAULT_LEVEL_LABEL.to_string(),
            },
            total: Total::default(),
        })
        .total
        .add(expense.amount);
    }

    VaultStatistics {
        total,
        by_template: ranked(by_template, |b| b.total.amount),
        by_category: ranked(by_category, |b| b.total.amount),
        by_member: ranked(by_member, |b| b.total.amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Audit;
    use crate::expense::PaidByDefault;
    use crate::vault::{IconType, VaultMember};
    use chrono::{TimeZone, Utc};

    fn expense(amount: f64, category: &str, paid_by: Option<&str>, template: Option<Uuid>) -> Expense {
        let date = Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap();
        Expense {
            id: Uuid::new_v4(),
            vault_id: Uuid::nil(),
            note: None,
            amount,
            category_name: category.to_string(),
            date,
            paid_by: paid_by.map(str::to_string),
            template_id: template,
            audit: Audit::initial("alice", date),
        }
    }

    fn template(name: &str) -> ExpenseTemplate {
        ExpenseTemplate {
            id: Uuid::new_v4(),
            vault_id: Uuid::nil(),
            owner_id: "alice".into(),
            name: name.into(),
            description: None,
            icon: Some("🛒".into()),
            icon_type: IconType::Emoji,
            default_note: None,
            default_amount: None,
            default_category_name: None,
            default_paid_by: PaidByDefault::Vault,
            usage_count: 0,
            last_used_at: None,
            audit: Audit::initial("alice", Utc::now()),
        }
    }

    #[test]
    fn test_buckets_and_labels() {
        let weekly_shop = template("Weekly shop");
        let alice = VaultMember::owner(Uuid::nil(), "alice", "Alice", Utc::now());
        let mut deleted = expense(1000.0, "Fuel", None, None);
        deleted.audit.soft_delete("alice", Utc::now());

        let expenses = vec![
            expense(30.0, "Groceries", Some("alice"), Some(weekly_shop.id)),
            expense(50.0, "Fuel", None, None),
            expense(15.0, "Groceries", Some("alice"), None),
            deleted,
        ];
        let refs: Vec<&Expense> = expenses.iter().collect();
        let stats = compute(&refs, &[&weekly_shop], &[&alice], None);

        assert_eq!(stats.total, Total { amount: 95.0, count: 3 });

        assert_eq!(stats.by_template[0].name, NO_TEMPLATE_LABEL);
        assert_eq!(stats.by_template[0].icon, DEFAULT_TEMPLATE_ICON);
        assert_eq!(stats.by_template[0].total.amount, 65.0);
        assert_eq!(stats.by_template[1].name, "Weekly shop");

        assert_eq!(stats.by_category[0].category_name, "Fuel");
        assert_eq!(stats.by_category[1].total.count, 2);
        assert_eq!(stats.by_category[1].icon_type, Some("phosphor"));

        assert_eq!(stats.by_member[0].display_name, VAULT_LEVEL_LABEL);
        assert_eq!(stats.by_member[1].display_name, "Alice");
        assert_eq!(stats.by_member[1].total.amount, 45.0);
    }

    #[test]
    fn test_range_restricts() {
        let expenses = vec![expense(10.0, "Water", None, None)];
        let refs: Vec<&Expense> = expenses.iter().collect();
        let range = DateRange::from_bounds(Some("2025-05-01"), Some("2025-05-31"))
            .unwrap();
        let stats = compute(&refs, &[], &[], range);
        assert_eq!(stats.total.count, 0);
        assert!(stats.by_category.is_empty());
    }
}
