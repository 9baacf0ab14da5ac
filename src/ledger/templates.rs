//! Expense templates.

use serde::Deserialize;
use uuid::Uuid;

use super::{authorize, Actor, Ledger};
use crate::audit::Audit;
use crate::catalog;
use crate::error::{LedgerError, LedgerResult};
use crate::expense::{ExpenseDraft, ExpenseTemplate, PaidByDefault, DEFAULT_TEMPLATE_ICON};
use crate::store::LedgerData;
use crate::validation;
use crate::vault::{can_modify_record, IconType, Permission};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_type: IconType,
    #[serde(default)]
    pub default_note: Option<String>,
    #[serde(default)]
    pub default_amount: Option<f64>,
    #[serde(default)]
    pub default_category_name: Option<String>,
    #[serde(default)]
    pub default_paid_by: PaidByDefault,
}

impl NewTemplate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            icon: None,
            icon_type: IconType::Emoji,
            default_note: None,
            default_amount: None,
            default_category_name: None,
            default_paid_by: PaidByDefault::Vault,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatePatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "validation::nullable")]
    pub description: Option<Option<String>>,
    pub icon: Option<String>,
    pub icon_type: Option<IconType>,
    #[serde(default, deserialize_with = "validation::nullable")]
    pub default_note: Option<Option<String>>,
    #[serde(default, deserialize_with = "validation::nullable")]
    pub default_amount: Option<Option<f64>>,
    #[serde(default, deserialize_with = "validation::nullable")]
    pub default_category_name: Option<Option<String>>,
    pub default_paid_by: Option<PaidByDefault>,
}

/// Check the template's default fields the way an expense's fields are checked.
/// `previous_payer` is the stored default; keeping it unchanged skips the
/// membership check so a member leaving does not lock the template.
fn validate_defaults(
    data: &LedgerData,
    template: &mut ExpenseTemplate,
    previous_payer: Option<&PaidByDefault>,
) -> LedgerResult<()> {
    template.name = validation::name("Template name", &template.name)?;
    template.description = validation::optional_text("Description", template.description.take())?;
    template.default_note = validation::optional_text("Default note", template.default_note.take())?;
    if let Some(amount) = template.default_amount {
        validation::amount("Default amount", amount)?;
    }
    if let Some(category) = &template.default_category_name {
        if !catalog::exists(category) {
            return Err(LedgerError::invalid(format!("Unknown category '{}'", category)));
        }
    }
    let payer_changed = previous_payer != Some(&template.default_paid_by);
    if let PaidByDefault::User(user) = &template.default_paid_by {
        if payer_changed && data.role_of(template.vault_id, user).is_none() {
            return Err(LedgerError::invalid(format!(
                "'{}' is not a member of this vault",
                user
            )));
        }
    }
    if template.icon.as_deref().map_or(true, |i| i.trim().is_empty()) {
        template.icon = Some(DEFAULT_TEMPLATE_ICON.to_string());
    }
    Ok(())
}

fn live_template<'a>(
    data: &'a LedgerData,
    vault_id: Uuid,
    template_id: Uuid,
) -> LedgerResult<&'a ExpenseTemplate> {
    data.templates
        .get(&template_id)
        .filter(|t| t.vault_id == vault_id && !t.audit.is_deleted())
        .ok_or_else(|| LedgerError::not_found("Template"))
}

impl Ledger {
    /// Platform admins may create templates in any live vault.
    pub async fn create_template(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        new: NewTemplate,
    ) -> LedgerResult<ExpenseTemplate> {
        let now = Self::now();
        let template = self
            .store
            .write(|data| {
                if actor.is_admin {
                    data.vault(vault_id).ok_or_else(|| LedgerError::not_found("Vault"))?;
                } else {
                    authorize(data, actor, vault_id, Permission::CreateExpenses)?;
                }
                let mut template = ExpenseTemplate {
                    id: Uuid::new_v4(),
                    vault_id,
                    owner_id: actor.user_id.clone(),
                    name: new.name,
                    description: new.description,
                    icon: new.icon,
                    icon_type: new.icon_type,
                    default_note: new.default_note,
                    default_amount: new.default_amount,
                    default_category_name: new.default_category_name,
                    default_paid_by: new.default_paid_by,
                    usage_count: 0,
                    last_used_at: None,
                    audit: Audit::initial(&actor.user_id, now),
                };
                validate_defaults(data, &mut template, None)?;
                data.templates.insert(template.id, template.clone());
                Ok(template)
            })
            .await?;
        tracing::info!(
            "User {} created template {} in vault {}",
            actor.user_id,
            template.id,
            vault_id
        );
        Ok(template)
    }

    /// Most recently updated first, then by name.
    pub async fn list_templates(&self, actor: &Actor, vault_id: Uuid) -> LedgerResult<Vec<ExpenseTemplate>> {
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                let mut templates: Vec<ExpenseTemplate> = data
                    .templates
                    .values()
                    .filter(|t| t.vault_id == vault_id && !t.audit.is_deleted())
                    .cloned()
                    .collect();
                templates.sort_by(|a, b| {
                    b.audit
                        .updated_at
                        .cmp(&a.audit.updated_at)
                        .then_with(|| a.name.cmp(&b.name))
                });
                Ok(templates)
            })
            .await
    }

    pub async fn get_template(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        template_id: Uuid,
    ) -> LedgerResult<ExpenseTemplate> {
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                live_template(data, vault_id, template_id).cloned()
            })
            .await
    }

    pub async fn update_template(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        template_id: Uuid,
        patch: TemplatePatch,
    ) -> LedgerResult<ExpenseTemplate> {
        let now = Self::now();
        self.store
            .write(|data| {
                let role = authorize(data, actor, vault_id, Permission::EditExpenses)?;
                let mut template = live_template(data, vault_id, template_id)?.clone();
                if !can_modify_record(role, &template.owner_id, &actor.user_id) {
                    return Err(LedgerError::denied("members can only edit their own templates"));
                }
                let previous_payer = template.default_paid_by.clone();
                if let Some(name) = patch.name {
                    template.name = name;
                }
                if let Some(description) = patch.description {
                    template.description = description;
                }
                if let Some(icon) = patch.icon {
                    template.icon = Some(icon);
                }
                if let Some(icon_type) = patch.icon_type {
                    template.icon_type = icon_type;
                }
                if let Some(note) = patch.default_note {
                    template.default_note = note;
                }
                if let Some(amount) = patch.default_amount {
                    template.default_amount = amount;
                }
                if let Some(category) = patch.default_category_name {
                    template.default_category_name = category;
                }
                if let Some(paid_by) = patch.default_paid_by {
                    template.default_paid_by = paid_by;
                }
                validate_defaults(data, &mut template, Some(&previous_payer))?;
                template.audit.touch(&actor.user_id, now);
                data.templates.insert(template.id, template.clone());
                Ok(template)
            })
            .await
    }

    pub async fn delete_template(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        template_id: Uuid,
    ) -> LedgerResult<()> {
        let now = Self::now();
        self.store
            .write(|data| {
                let role = authorize(data, actor, vault_id, Permission::DeleteExpenses)?;
                let template = live_template(data, vault_id, template_id)?;
                if !can_modify_record(role, &template.owner_id, &actor.user_id) {
                    return Err(LedgerError::denied("members can only delete their own templates"));
                }
                if let Some(template) = data.templates.get_mut(&template_id) {
                    template.audit.soft_delete(&actor.user_id, now);
                }
                Ok(())
            })
            .await?;
        tracing::info!(
            "User {} deleted template {} in vault {}",
            actor.user_id,
            template_id,
            vault_id
        );
        Ok(())
    }

    /// Pre-filled values for a new expense from a template.
    pub async fn apply_template(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        template_id: Uuid,
    ) -> LedgerResult<ExpenseDraft> {
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::CreateExpenses)?;
                let template = live_template(data, vault_id, template_id)?;
                let mut draft = template.draft_for(&actor.user_id);
                // A default payer who has since left falls back to a vault-level expense.
                if let Some(user) = &draft.paid_by {
                    if data.role_of(vault_id, user).is_none() {
                        draft.paid_by = None;
                    }
                }
                Ok(draft)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::ledger::NewExpense;
    use crate::vault::MemberRole;

    #[tokio::test]
    async fn test_create_and_apply() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let bob = actor("bob");
        let vault_id = vault_with_owner(&ledger, &alice).await;
        join(&ledger, vault_id, &alice, &bob, MemberRole::Member).await;

        let mut new = NewTemplate::named("Weekly shop");
        new.default_amount = Some(80.0);
        new.default_category_name = Some("Groceries".into());
        new.default_paid_by = PaidByDefault::Creator;
        let template = ledger.create_template(&alice, vault_id, new).await.unwrap();
        assert_eq!(template.icon.as_deref(), Some(DEFAULT_TEMPLATE_ICON));

        let draft = ledger.apply_template(&bob, vault_id, template.id).await.unwrap();
        assert_eq!(draft.paid_by.as_deref(), Some("bob"));
        assert_eq!(draft.amount, Some(80.0));

        let expense = NewExpense {
            amount: draft.amount.unwrap_or(1.0),
            category_name: draft.category_name.clone().unwrap_or_default(),
            note: draft.note.clone(),
            date: None,
            paid_by: draft.paid_by.clone(),
            template_id: Some(draft.template_id),
        };
        ledger.create_expense(&bob, vault_id, expense).await.unwrap();
        let used = ledger.get_template(&alice, vault_id, template.id).await.unwrap();
        assert_eq!(used.usage_count, 1);
        assert!(used.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_create_validates_defaults() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let vault_id = vault_with_owner(&ledger, &alice).await;

        let mut bad = NewTemplate::named("Oops");
        bad.default_category_name = Some("Moon Rocks".into());
        assert!(ledger.create_template(&alice, vault_id, bad).await.is_err());

        let mut bad = NewTemplate::named("Oops");
        bad.default_paid_by = PaidByDefault::User("mallory".into());
        assert!(ledger.create_template(&alice, vault_id, bad).await.is_err());

        assert!(ledger.create_template(&alice, vault_id, NewTemplate::named("")).await.is_err());
    }

    #[tokio::test]
    async fn test_default_payer_leaving_does_not_lock_template() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let bob = actor("bob");
        let vault_id = vault_with_owner(&ledger, &alice).await;
        join(&ledger, vault_id, &alice, &bob, MemberRole::Member).await;

        let mut new = NewTemplate::named("Rent");
        new.default_paid_by = PaidByDefault::User("bob".into());
        let template = ledger.create_template(&alice, vault_id, new).await.unwrap();
        ledger.leave_vault(&bob, vault_id).await.unwrap();

        let patch = TemplatePatch {
            name: Some("Monthly rent".into()),
            ..Default::default()
        };
        let updated = ledger.update_template(&alice, vault_id, template.id, patch).await.unwrap();
        assert_eq!(updated.name, "Monthly rent");
        assert_eq!(updated.default_paid_by, PaidByDefault::User("bob".into()));

        let patch = TemplatePatch {
            default_paid_by: Some(PaidByDefault::User("mallory".into())),
            ..Default::default()
        };
        assert!(ledger.update_template(&alice, vault_id, template.id, patch).await.is_err());
    }

    #[tokio::test]
    async fn test_platform_admin_bypass() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let mut root = actor("root");
        let vault_id = vault_with_owner(&ledger, &alice).await;

        assert!(ledger
            .create_template(&root, vault_id, NewTemplate::named("Rent"))
            .await
            .is_err());
        root.is_admin = true;
        assert!(ledger
            .create_template(&root, vault_id, NewTemplate::named("Rent"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_ownership_and_listing() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let bob = actor("bob");
        let vault_id = vault_with_owner(&ledger, &alice).await;
        join(&ledger, vault_id, &alice, &bob, MemberRole::Member).await;

        let alices = ledger
            .create_template(&alice, vault_id, NewTemplate::named("Utilities"))
            .await
            .unwrap();
        let bobs = ledger
            .create_template(&bob, vault_id, NewTemplate::named("Lunch"))
            .await
            .unwrap();

        let rename = TemplatePatch {
            name: Some("Bills".into()),
            ..Default::default()
        };
        assert!(ledger
            .update_template(&bob, vault_id, alices.id, rename.clone())
            .await
            .is_err());
        let renamed = ledger
            .update_template(&alice, vault_id, alices.id, rename)
            .await
            .unwrap();
        assert_eq!(renamed.name, "Bills");

        let listed = ledger.list_templates(&bob, vault_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, alices.id);

        assert!(ledger.delete_template(&bob, vault_id, alices.id).await.is_err());
        ledger.delete_template(&alice, vault_id, bobs.id).await.unwrap();
        assert_eq!(ledger.list_templates(&bob, vault_id).await.unwrap().len(), 1);
    }
}
