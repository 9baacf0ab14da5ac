//! Budgets and their progress.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{authorize, Actor, Ledger};
use crate::budget::{
    calculate_progress, month_calendar, summarize, Budget, BudgetPatch, BudgetProgress,
    BudgetScope, BudgetSummary, CalendarDay, NewBudget,
};
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerData;
use crate::vault::Permission;

/// Optional filters for budget listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetFilter {
    pub is_active: Option<bool>,
    /// Budgets whose scope includes this category.
    pub category_name: Option<String>,
    /// Budgets whose scope includes this payer.
    pub user_id: Option<String>,
}

impl BudgetFilter {
    fn matches(&self, budget: &Budget) -> bool {
        self.is_active.map_or(true, |active| budget.is_active == active)
            && self
                .category_name
                .as_ref()
                .map_or(true, |c| budget.scope.category_names.contains(c))
            && self
                .user_id
                .as_ref()
                .map_or(true, |u| budget.scope.user_ids.contains(u))
    }
}

fn live_budget<'a>(data: &'a LedgerData, vault_id: Uuid, budget_id: Uuid) -> LedgerResult<&'a Budget> {
    data.budgets
        .get(&budget_id)
        .filter(|b| b.vault_id == vault_id && !b.audit.is_deleted())
        .ok_or_else(|| LedgerError::not_found("Budget"))
}

/// Scope references must point into the same vault. References already in
/// `previous` are kept as they are, even after the template is deleted or the
/// member leaves.
fn check_scope(data: &LedgerData, budget: &Budget, previous: Option<&BudgetScope>) -> LedgerResult<()> {
    let added_templates = budget
        .scope
        .template_ids
        .iter()
        .filter(|id| previous.map_or(true, |p| !p.template_ids.contains(id)));
    for template_id in added_templates {
        let known = data
            .templates
            .get(template_id)
            .is_some_and(|t| t.vault_id == budget.vault_id && !t.audit.is_deleted());
        if !known {
            return Err(LedgerError::invalid(format!("Unknown template {}", template_id)));
        }
    }
    let added_users = budget
        .scope
        .user_ids
        .iter()
        .filter(|u| previous.map_or(true, |p| !p.user_ids.contains(u)));
    for user in added_users {
        if data.role_of(budget.vault_id, user).is_none() {
            return Err(LedgerError::invalid(format!(
                "'{}' is not a member of this vault",
                user
            )));
        }
    }
    Ok(())
}

impl Ledger {
    pub async fn create_budget(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        new: NewBudget,
    ) -> LedgerResult<Budget> {
        let now = Self::now();
        let budget = self
            .store
            .write(|data| {
                authorize(data, actor, vault_id, Permission::EditVault)?;
                let budget = Budget::create(vault_id, new, &actor.user_id, now)?;
                check_scope(data, &budget, None)?;
                data.budgets.insert(budget.id, budget.clone());
                Ok(budget)
            })
            .await?;
        tracing::info!(
            "User {} created budget {} ({}) in vault {}",
            actor.user_id,
            budget.id,
            budget.name,
            vault_id
        );
        Ok(budget)
    }

    /// Oldest first.
    pub async fn list_budgets(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        filter: &BudgetFilter,
    ) -> LedgerResult<Vec<Budget>> {
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                let mut budgets: Vec<Budget> = data
                    .budgets
                    .values()
                    .filter(|b| b.vault_id == vault_id && !b.audit.is_deleted())
                    .filter(|b| filter.matches(b))
                    .cloned()
                    .collect();
                budgets.sort_by(|a, b| a.audit.created_at.cmp(&b.audit.created_at));
                Ok(budgets)
            })
            .await
    }

    pub async fn get_budget(&self, actor: &Actor, vault_id: Uuid, budget_id: Uuid) -> LedgerResult<Budget> {
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                live_budget(data, vault_id, budget_id).cloned()
            })
            .await
    }

    pub async fn update_budget(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        budget_id: Uuid,
        patch: BudgetPatch,
    ) -> LedgerResult<Budget> {
        let now = Self::now();
        self.store
            .write(|data| {
                authorize(data, actor, vault_id, Permission::EditVault)?;
                let current = live_budget(data, vault_id, budget_id)?;
                let updated = current.patched(patch, &actor.user_id, now)?;
                check_scope(data, &updated, Some(&current.scope))?;
                data.budgets.insert(updated.id, updated.clone());
                Ok(updated)
            })
            .await
    }

    /// Platform admins may delete budgets of any live vault.
    pub async fn delete_budget(&self, actor: &Actor, vault_id: Uuid, budget_id: Uuid) -> LedgerResult<()> {
        let now = Self::now();
        self.store
            .write(|data| {
                if actor.is_admin {
                    data.vault(vault_id).ok_or_else(|| LedgerError::not_found("Vault"))?;
                } else {
                    authorize(data, actor, vault_id, Permission::EditVault)?;
                }
                live_budget(data, vault_id, budget_id)?;
                if let Some(budget) = data.budgets.get_mut(&budget_id) {
                    budget.audit.soft_delete(&actor.user_id, now);
                }
                Ok(())
            })
            .await?;
        tracing::info!(
            "User {} deleted budget {} in vault {}",
            actor.user_id,
            budget_id,
            vault_id
        );
        Ok(())
    }

    /// Progress of one budget as of `as_of` (today when absent).
    pub async fn budget_progress(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        budget_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> LedgerResult<BudgetProgress> {
        let reference = as_of.unwrap_or_else(|| Self::now().date_naive());
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                let budget = live_budget(data, vault_id, budget_id)?;
                Ok(calculate_progress(budget, &data.vault_expenses(vault_id), reference))
            })
            .await
    }

    /// Progress of every active budget in the vault.
    pub async fn budgets_progress(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> LedgerResult<Vec<BudgetProgress>> {
        let reference = as_of.unwrap_or_else(|| Self::now().date_naive());
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                let expenses = data.vault_expenses(vault_id);
                let mut budgets: Vec<&Budget> = data
                    .budgets
                    .values()
                    .filter(|b| b.vault_id == vault_id && b.is_active && !b.audit.is_deleted())
                    .collect();
                budgets.sort_by(|a, b| a.audit.created_at.cmp(&b.audit.created_at));
                Ok(budgets
                    .into_iter()
                    .map(|b| calculate_progress(b, &expenses, reference))
                    .collect())
            })
            .await
    }

    pub async fn budget_calendar(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        budget_id: Uuid,
        year: i32,
        month: u32,
    ) -> LedgerResult<Vec<CalendarDay>> {
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                let budget = live_budget(data, vault_id, budget_id)?;
                month_calendar(budget, &data.vault_expenses(vault_id), year, month)
            })
            .await
    }

    pub async fn budgets_summary(&self, actor: &Actor, vault_id: Uuid) -> LedgerResult<Vec<BudgetSummary>> {
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                let mut budgets: Vec<&Budget> = data
                    .budgets
                    .values()
                    .filter(|b| b.vault_id == vault_id)
                    .collect();
                budgets.sort_by(|a, b| a.audit.created_at.cmp(&b.audit.created_at));
                Ok(summarize(&budgets, &data.vault_expenses(vault_id)))
            })
            .await
    }
}
