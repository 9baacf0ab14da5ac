//! Recording and browsing expenses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{authorize, Actor, Ledger};
use crate::audit::Audit;
use crate::catalog;
use crate::error::{LedgerError, LedgerResult};
use crate::expense::{group_by_day, paginate, DayGroup, Expense, ExpenseQuery, Page};
use crate::store::LedgerData;
use crate::validation;
use crate::vault::{can_modify_record, Permission};

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub amount: f64,
    pub category_name: String,
    #[serde(default)]
    pub note: Option<String>,
    /// RFC 3339 or `YYYY-MM-DD`; defaults to now.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub paid_by: Option<String>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePatch {
    pub amount: Option<f64>,
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "validation::nullable")]
    pub note: Option<Option<String>>,
    pub date: Option<String>,
    /// `null` turns the expense into a vault-level one.
    #[serde(default, deserialize_with = "validation::nullable")]
    pub paid_by: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseView {
    #[serde(flatten)]
    pub expense: Expense,
    pub paid_by_name: Option<String>,
}

fn view(data: &LedgerData, expense: &Expense) -> ExpenseView {
    ExpenseView {
        paid_by_name: expense
            .paid_by
            .as_deref()
            .and_then(|user| data.display_name(expense.vault_id, user))
            .map(str::to_string),
        expense: expense.clone(),
    }
}

fn category(name: &str) -> LedgerResult<String> {
    if catalog::exists(name) {
        Ok(name.to_string())
    } else {
        Err(LedgerError::invalid(format!("Unknown category '{}'", name)))
    }
}

/// A payer must be an active member of the vault.
fn payer(data: &LedgerData, vault_id: Uuid, paid_by: Option<String>) -> LedgerResult<Option<String>> {
    match paid_by.filter(|p| !p.trim().is_empty()) {
        Some(user) if data.role_of(vault_id, &user).is_none() => Err(LedgerError::invalid(format!(
            "'{}' is not a member of this vault",
            user
        ))),
        other => Ok(other),
    }
}

fn live_expense<'a>(data: &'a LedgerData, vault_id: Uuid, expense_id: Uuid) -> LedgerResult<&'a Expense> {
    data.expenses
        .get(&expense_id)
        .filter(|e| e.vault_id == vault_id && !e.audit.is_deleted())
        .ok_or_else(|| LedgerError::not_found("Expense"))
}

impl Ledger {
    pub async fn create_expense(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        new: NewExpense,
    ) -> LedgerResult<ExpenseView> {
        let amount = validation::amount("Amount", new.amount)?;
        let category_name = category(&new.category_name)?;
        let note = validation::optional_text("Note", new.note)?;
        let now = Self::now();
        let date = match new.date.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(date) => validation::parse_instant(date)?,
            None => now,
        };

        let created = self
            .store
            .write(|data| {
                authorize(data, actor, vault_id, Permission::CreateExpenses)?;
                let paid_by = payer(data, vault_id, new.paid_by)?;
                if let Some(template_id) = new.template_id {
                    let template = data
                        .templates
                        .get_mut(&template_id)
                        .filter(|t| t.vault_id == vault_id && !t.audit.is_deleted())
                        .ok_or_else(|| LedgerError::not_found("Template"))?;
                    template.record_use(now);
                }

                let expense = Expense {
                    id: Uuid::new_v4(),
                    vault_id,
                    note,
                    amount,
                    category_name,
                    date,
                    paid_by,
                    template_id: new.template_id,
                    audit: Audit::initial(&actor.user_id, now),
                };
                data.expenses.insert(expense.id, expense.clone());
                Ok(view(data, &expense))
            })
            .await?;
        tracing::info!(
            "User {} recorded expense {} in vault {}",
            actor.user_id,
            created.expense.id,
            vault_id
        );
        Ok(created)
    }

    fn matching_expenses(
        data: &LedgerData,
        vault_id: Uuid,
        query: &ExpenseQuery,
        default_limit: u32,
    ) -> LedgerResult<(Vec<ExpenseView>, u32, u32)> {
        let filter = query.resolve(Self::now(), default_limit)?;
        let mut expenses: Vec<&Expense> = data
            .vault_expenses(vault_id)
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        expenses.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.audit.created_at.cmp(&a.audit.created_at))
        });
        let views = expenses.into_iter().map(|e| view(data, e)).collect();
        Ok((views, filter.page, filter.limit))
    }

    /// Newest first, filtered and paginated.
    pub async fn list_expenses(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        query: &ExpenseQuery,
    ) -> LedgerResult<Page<ExpenseView>> {
        let default_limit = self.settings.default_page_size;
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                let (views, page, limit) = Self::matching_expenses(data, vault_id, query, default_limit)?;
                Ok(paginate(views, page, limit))
            })
            .await
    }

    /// One page of expenses, grouped by day.
    pub async fn list_expenses_by_day(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        query: &ExpenseQuery,
    ) -> LedgerResult<Page<DayGroup<ExpenseView>>> {
        let page = self.list_expenses(actor, vault_id, query).await?;
        Ok(Page {
            items: group_by_day(page.items, |v| v.expense.date),
            pagination: page.pagination,
        })
    }

    pub async fn get_expense(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        expense_id: Uuid,
    ) -> LedgerResult<ExpenseView> {
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                Ok(view(data, live_expense(data, vault_id, expense_id)?))
            })
            .await
    }

    pub async fn update_expense(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        expense_id: Uuid,
        patch: ExpensePatch,
    ) -> LedgerResult<ExpenseView> {
        let amount = patch
            .amount
            .map(|a| validation::amount("Amount", a))
            .transpose()?;
        let category_name = patch.category_name.as_deref().map(category).transpose()?;
        let note = patch
            .note
            .map(|n| validation::optional_text("Note", n))
            .transpose()?;
        let date = patch
            .date
            .as_deref()
            .map(validation::parse_instant)
            .transpose()?;
        let now = Self::now();

        self.store
            .write(|data| {
                let role = authorize(data, actor, vault_id, Permission::EditExpenses)?;
                let existing = live_expense(data, vault_id, expense_id)?;
                if !can_modify_record(role, &existing.audit.created_by, &actor.user_id) {
                    return Err(LedgerError::denied("members can only edit their own expenses"));
                }
                let paid_by = patch
                    .paid_by
                    .map(|p| payer(data, vault_id, p))
                    .transpose()?;

                let expense = data
                    .expenses
                    .get_mut(&expense_id)
                    .ok_or_else(|| LedgerError::not_found("Expense"))?;
                if let Some(amount) = amount {
                    expense.amount = amount;
                }
                if let Some(category_name) = category_name {
                    expense.category_name = category_name;
                }
                if let Some(note) = note {
                    expense.note = note;
                }
                if let Some(date) = date {
                    expense.date = date;
                }
                if let Some(paid_by) = paid_by {
                    expense.paid_by = paid_by;
                }
                expense.audit.touch(&actor.user_id, now);
                let expense = expense.clone();
                Ok(view(data, &expense))
            })
            .await
    }

    pub async fn delete_expense(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        expense_id: Uuid,
    ) -> LedgerResult<()> {
        let now = Self::now();
        self.store
            .write(|data| {
                let role = authorize(data, actor, vault_id, Permission::DeleteExpenses)?;
                let existing = live_expense(data, vault_id, expense_id)?;
                if !can_modify_record(role, &existing.audit.created_by, &actor.user_id) {
                    return Err(LedgerError::denied("members can only delete their own expenses"));
                }
                if let Some(expense) = data.expenses.get_mut(&expense_id) {
                    expense.audit.soft_delete(&actor.user_id, now);
                }
                Ok(())
            })
            .await?;
        tracing::info!(
            "User {} deleted expense {} in vault {}",
            actor.user_id,
            expense_id,
            vault_id
        );
        Ok(())
    }
}
