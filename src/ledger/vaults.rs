//! Vault lifecycle and membership management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{authorize, Actor, Ledger};
use crate::audit::Audit;
use crate::error::{LedgerError, LedgerResult};
use crate::expense::DateRange;
use crate::statistics::{self, VaultStatistics};
use crate::store::LedgerData;
use crate::validation;
use crate::vault::{
    IconType, MemberRole, MemberStatus, Permission, Vault, VaultMember, VaultPermissions,
    DEFAULT_VAULT_COLOR, DEFAULT_VAULT_ICON,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewVault {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_type: IconType,
    #[serde(default)]
    pub is_public: bool,
}

impl NewVault {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: None,
            icon: None,
            icon_type: IconType::Emoji,
            is_public: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaultPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub icon_type: Option<IconType>,
    pub is_public: Option<bool>,
}

/// A vault as listed for one of its members.
#[derive(Debug, Clone, Serialize)]
pub struct VaultSummary {
    #[serde(flatten)]
    pub vault: Vault,
    pub role: MemberRole,
    pub is_default: bool,
    pub member_count: usize,
    pub permissions: VaultPermissions,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub user_id: String,
    pub display_name: String,
    pub role: MemberRole,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultDetails {
    pub vault: Vault,
    pub membership: VaultMember,
    pub members: Vec<MemberView>,
    pub permissions: VaultPermissions,
}

fn details(data: &LedgerData, vault: &Vault, membership: &VaultMember) -> VaultDetails {
    let mut members: Vec<MemberView> = data
        .active_members(vault.id)
        .map(|m| MemberView {
            user_id: m.user_id.clone(),
            display_name: m.display_name.clone(),
            role: m.role,
            joined_at: m.joined_at,
        })
        .collect();
    members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.display_name.cmp(&b.display_name)));
    VaultDetails {
        vault: vault.clone(),
        membership: membership.clone(),
        members,
        permissions: VaultPermissions::for_role(Some(membership.role)),
    }
}

/// Active membership of `actor`, or `NotFound` so that vault ids cannot be probed.
fn active_membership<'a>(
    data: &'a LedgerData,
    actor: &Actor,
    vault_id: Uuid,
) -> LedgerResult<(&'a Vault, &'a VaultMember)> {
    let vault = data.vault(vault_id).ok_or_else(|| LedgerError::not_found("Vault"))?;
    let membership = data
        .membership(vault_id, &actor.user_id)
        .filter(|m| m.is_active())
        .ok_or_else(|| LedgerError::not_found("Vault"))?;
    Ok((vault, membership))
}

impl Ledger {
    pub async fn create_vault(&self, actor: &Actor, new: NewVault) -> LedgerResult<VaultDetails> {
        let name = validation::name("Vault name", &new.name)?;
        let description = validation::optional_text("Description", new.description)?;
        let color = match new.color {
            Some(color) => validation::color(&color)?,
            None => DEFAULT_VAULT_COLOR.to_string(),
        };
        let icon = new
            .icon
            .filter(|i| !i.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VAULT_ICON.to_string());
        let limit = self.settings.vault_limit;
        let now = Self::now();

        let details = self
            .store
            .write(|data| {
                let owned = data
                    .members
                    .values()
                    .filter(|m| m.user_id == actor.user_id && m.role == MemberRole::Owner && m.is_active())
                    .filter(|m| data.vault(m.vault_id).is_some())
                    .count();
                if owned >= limit {
                    return Err(LedgerError::LimitReached(format!(
                        "a user can own at most {} vaults",
                        limit
                    )));
                }
                let has_default = data
                    .members
                    .values()
                    .any(|m| {
                        m.user_id == actor.user_id
                            && m.is_active()
                            && m.is_default
                            && data.vault(m.vault_id).is_some()
                    });

                let vault = Vault {
                    id: Uuid::new_v4(),
                    name,
                    description,
                    color,
                    icon: Some(icon),
                    icon_type: new.icon_type,
                    is_public: new.is_public,
                    audit: Audit::initial(&actor.user_id, now),
                };
                let mut owner = VaultMember::owner(vault.id, &actor.user_id, &actor.display_name(), now);
                owner.is_default = !has_default;

                data.vaults.insert(vault.id, vault.clone());
                data.members.insert(owner.id, owner.clone());
                Ok(details(data, &vault, &owner))
            })
            .await?;
        tracing::info!(
            "User {} created vault {} ({})",
            actor.user_id,
            details.vault.id,
            details.vault.name
        );
        Ok(details)
    }

    /// Vaults the actor is an active member of: the default vault first, then by name.
    pub async fn list_vaults(&self, actor: &Actor) -> Vec<VaultSummary> {
        self.store
            .read(|data| {
                let mut vaults: Vec<VaultSummary> = data
                    .members
                    .values()
                    .filter(|m| m.user_id == actor.user_id && m.is_active())
                    .filter_map(|m| {
                        let vault = data.vault(m.vault_id)?;
                        Some(VaultSummary {
                            vault: vault.clone(),
                            role: m.role,
                            is_default: m.is_default,
                            member_count: data.active_members(vault.id).count(),
                            permissions: VaultPermissions::for_role(Some(m.role)),
                        })
                    })
                    .collect();
                vaults.sort_by(|a, b| {
                    b.is_default
                        .cmp(&a.is_default)
                        .then_with(|| a.vault.name.to_lowercase().cmp(&b.vault.name.to_lowercase()))
                });
                vaults
            })
            .await
    }

    pub async fn get_vault(&self, actor: &Actor, vault_id: Uuid) -> LedgerResult<VaultDetails> {
        self.store
            .read(|data| {
                let (vault, membership) = active_membership(data, actor, vault_id)?;
                Ok(details(data, vault, membership))
            })
            .await
    }

    pub async fn update_vault(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        patch: VaultPatch,
    ) -> LedgerResult<Vault> {
        let name = patch
            .name
            .as_deref()
            .map(|n| validation::name("Vault name", n))
            .transpose()?;
        let color = patch.color.as_deref().map(validation::color).transpose()?;
        let now = Self::now();

        self.store
            .write(|data| {
                authorize(data, actor, vault_id, Permission::EditVault)?;
                let vault = data
                    .vaults
                    .get_mut(&vault_id)
                    .ok_or_else(|| LedgerError::not_found("Vault"))?;
                if let Some(name) = name {
                    vault.name = name;
                }
                if patch.description.is_some() {
                    vault.description = validation::optional_text("Description", patch.description)?;
                }
                if let Some(color) = color {
                    vault.color = color;
                }
                if let Some(icon) = patch.icon.filter(|i| !i.trim().is_empty()) {
                    vault.icon = Some(icon);
                }
                if let Some(icon_type) = patch.icon_type {
                    vault.icon_type = icon_type;
                }
                if let Some(is_public) = patch.is_public {
                    vault.is_public = is_public;
                }
                vault.audit.touch(&actor.user_id, now);
                Ok(vault.clone())
            })
            .await
    }

    pub async fn delete_vault(&self, actor: &Actor, vault_id: Uuid) -> LedgerResult<()> {
        let now = Self::now();
        self.store
            .write(|data| {
                authorize(data, actor, vault_id, Permission::DeleteVault)?;
                if let Some(vault) = data.vaults.get_mut(&vault_id) {
                    vault.audit.soft_delete(&actor.user_id, now);
                }
                for member in data.members.values_mut().filter(|m| m.vault_id == vault_id && m.is_default) {
                    member.is_default = false;
                    member.updated_at = now;
                }
                Ok(())
            })
            .await?;
        tracing::info!("User {} deleted vault {}", actor.user_id, vault_id);
        Ok(())
    }

    pub async fn set_default_vault(&self, actor: &Actor, vault_id: Uuid) -> LedgerResult<()> {
        let now = Self::now();
        self.store
            .write(|data| {
                active_membership(data, actor, vault_id)?;
                for member in data
                    .members
                    .values_mut()
                    .filter(|m| m.user_id == actor.user_id && m.deleted_at.is_none())
                {
                    let is_default = member.vault_id == vault_id;
                    if member.is_default != is_default {
                        member.is_default = is_default;
                        member.updated_at = now;
                    }
                }
                Ok(())
            })
            .await
    }

    pub async fn leave_vault(&self, actor: &Actor, vault_id: Uuid) -> LedgerResult<()> {
        let now = Self::now();
        self.store
            .write(|data| {
                let (_, membership) = active_membership(data, actor, vault_id)?;
                if membership.role == MemberRole::Owner {
                    return Err(LedgerError::invalid(
                        "The owner cannot leave a vault; delete it instead",
                    ));
                }
                if let Some(member) = data.membership_mut(vault_id, &actor.user_id) {
                    member.status = MemberStatus::Removed;
                    member.is_default = false;
                    member.updated_at = now;
                }
                Ok(())
            })
            .await?;
        tracing::info!("User {} left vault {}", actor.user_id, vault_id);
        Ok(())
    }

    pub async fn remove_member(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        user_id: &str,
    ) -> LedgerResult<()> {
        let now = Self::now();
        self.store
            .write(|data| {
                let role = authorize(data, actor, vault_id, Permission::ManageMembers)?;
                if user_id == actor.user_id {
                    return Err(LedgerError::invalid(
                        "You cannot remove yourself; leave the vault instead",
                    ));
                }
                let target = data
                    .membership(vault_id, user_id)
                    .filter(|m| m.is_active())
                    .ok_or_else(|| LedgerError::not_found("Member"))?;
                match target.role {
                    MemberRole::Owner => {
                        return Err(LedgerError::denied("the vault owner cannot be removed"));
                    }
                    MemberRole::Admin if role != MemberRole::Owner => {
                        return Err(LedgerError::denied("only the owner can remove an admin"));
                    }
                    _ => {}
                }
                if let Some(member) = data.membership_mut(vault_id, user_id) {
                    member.status = MemberStatus::Removed;
                    member.is_default = false;
                    member.updated_at = now;
                }
                Ok(())
            })
            .await?;
        tracing::info!(
            "User {} removed {} from vault {}",
            actor.user_id,
            user_id,
            vault_id
        );
        Ok(())
    }

    pub async fn update_member_role(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        user_id: &str,
        new_role: MemberRole,
    ) -> LedgerResult<MemberView> {
        let now = Self::now();
        self.store
            .write(|data| {
                let role = authorize(data, actor, vault_id, Permission::ManageMembers)?;
                if user_id == actor.user_id {
                    return Err(LedgerError::invalid("You cannot change your own role"));
                }
                if new_role == MemberRole::Owner {
                    return Err(LedgerError::invalid("Ownership cannot be assigned"));
                }
                let target = data
                    .membership(vault_id, user_id)
                    .filter(|m| m.is_active())
                    .ok_or_else(|| LedgerError::not_found("Member"))?;
                if target.role == MemberRole::Owner {
                    return Err(LedgerError::denied("the owner's role cannot be changed"));
                }
                let touches_admin = target.role == MemberRole::Admin || new_role == MemberRole::Admin;
                if touches_admin && role != MemberRole::Owner {
                    return Err(LedgerError::denied("only the owner can promote or demote admins"));
                }

                let member = data
                    .membership_mut(vault_id, user_id)
                    .ok_or_else(|| LedgerError::not_found("Member"))?;
                member.role = new_role;
                member.updated_at = now;
                Ok(MemberView {
                    user_id: member.user_id.clone(),
                    display_name: member.display_name.clone(),
                    role: member.role,
                    joined_at: member.joined_at,
                })
            })
            .await
    }

    pub async fn vault_statistics(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> LedgerResult<VaultStatistics> {
        let range = DateRange::from_bounds(start_date, end_date)?;
        self.store
            .read(|data| {
                authorize(data, actor, vault_id, Permission::ViewVault)?;
                let expenses = data.vault_expenses(vault_id);
                let templates: Vec<_> = data
                    .templates
                    .values()
                    .filter(|t| t.vault_id == vault_id)
                    .collect();
                let members: Vec<_> = data
                    .members
                    .values()
                    .filter(|m| m.vault_id == vault_id)
                    .collect();
                Ok(statistics::compute(&expenses, &templates, &members, range))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::ledger::LedgerSettings;
    use crate::store::LedgerStore;

    #[tokio::test]
    async fn test_create_and_list() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let first = vault_with_owner(&ledger, &alice).await;
        let mut new = NewVault::named("Beach house");
        new.color = Some("#10B981".into());
        let second = ledger.create_vault(&alice, new).await.unwrap();

        assert_eq!(second.vault.icon.as_deref(), Some(DEFAULT_VAULT_ICON));
        assert_eq!(second.membership.role, MemberRole::Owner);
        assert!(!second.membership.is_default);

        let vaults = ledger.list_vaults(&alice).await;
        assert_eq!(vaults.len(), 2);
        assert_eq!(vaults[0].vault.id, first);
        assert!(vaults[0].is_default);
        assert!(vaults[0].permissions.can_delete_vault);

        ledger.set_default_vault(&alice, second.vault.id).await.unwrap();
        let vaults = ledger.list_vaults(&alice).await;
        assert_eq!(vaults[0].vault.id, second.vault.id);
        assert!(!vaults[1].is_default);
    }

    #[tokio::test]
    async fn test_create_validates() {
        let ledger = ledger().await;
        let alice = actor("alice");
        assert!(ledger.create_vault(&alice, NewVault::named("  ")).await.is_err());
        let mut bad_color = NewVault::named("Home");
        bad_color.color = Some("blue".into());
        assert!(matches!(
            ledger.create_vault(&alice, bad_color).await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_vault_limit_counts_owned_vaults() {
        let ledger = Ledger::new(
            LedgerStore::in_memory().await,
            LedgerSettings {
                vault_limit: 1,
                default_page_size: 10,
            },
        );
        let alice = actor("alice");
        let bob = actor("bob");
        let bobs = vault_with_owner(&ledger, &bob).await;
        join(&ledger, bobs, &bob, &alice, MemberRole::Member).await;

        vault_with_owner(&ledger, &alice).await;
        let err = ledger
            .create_vault(&alice, NewVault::named("Second"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::LimitReached(_)));
    }

    #[tokio::test]
    async fn test_outsiders_see_not_found() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let eve = actor("eve");
        let vault_id = vault_with_owner(&ledger, &alice).await;

        assert!(matches!(
            ledger.get_vault(&eve, vault_id).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.update_vault(&eve, vault_id, VaultPatch::default()).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_permissions() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let bob = actor("bob");
        let carol = actor("carol");
        let vault_id = vault_with_owner(&ledger, &alice).await;
        join(&ledger, vault_id, &alice, &bob, MemberRole::Admin).await;
        join(&ledger, vault_id, &alice, &carol, MemberRole::Member).await;

        let patch = VaultPatch {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(matches!(
            ledger.update_vault(&carol, vault_id, patch.clone()).await,
            Err(LedgerError::PermissionDenied(_))
        ));
        let updated = ledger.update_vault(&bob, vault_id, patch).await.unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.audit.updated_by.as_deref(), Some("bob"));

        assert!(matches!(
            ledger.delete_vault(&bob, vault_id).await,
            Err(LedgerError::PermissionDenied(_))
        ));
        ledger.delete_vault(&alice, vault_id).await.unwrap();
        assert!(ledger.list_vaults(&bob).await.is_empty());
        assert!(ledger.get_vault(&alice, vault_id).await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_default_vault_frees_default() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let first = vault_with_owner(&ledger, &alice).await;
        ledger.delete_vault(&alice, first).await.unwrap();

        let second = ledger.create_vault(&alice, NewVault::named("Cabin")).await.unwrap();
        assert!(second.membership.is_default);
        let vaults = ledger.list_vaults(&alice).await;
        assert_eq!(vaults.len(), 1);
        assert!(vaults[0].is_default);
    }

    #[tokio::test]
    async fn test_member_management_rules() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let bob = actor("bob");
        let carol = actor("carol");
        let dave = actor("dave");
        let vault_id = vault_with_owner(&ledger, &alice).await;
        join(&ledger, vault_id, &alice, &bob, MemberRole::Admin).await;
        join(&ledger, vault_id, &alice, &carol, MemberRole::Member).await;
        join(&ledger, vault_id, &alice, &dave, MemberRole::Member).await;

        // Admins may not touch other admins or the owner.
        assert!(ledger.update_member_role(&bob, vault_id, "carol", MemberRole::Admin).await.is_err());
        assert!(ledger.remove_member(&bob, vault_id, "alice").await.is_err());
        assert!(ledger.update_member_role(&alice, vault_id, "bob", MemberRole::Owner).await.is_err());
        assert!(ledger.update_member_role(&alice, vault_id, "alice", MemberRole::Member).await.is_err());

        let promoted = ledger
            .update_member_role(&alice, vault_id, "carol", MemberRole::Admin)
            .await
            .unwrap();
        assert_eq!(promoted.role, MemberRole::Admin);

        assert!(ledger.remove_member(&bob, vault_id, "carol").await.is_err());
        ledger.remove_member(&bob, vault_id, "dave").await.unwrap();
        assert!(ledger.get_vault(&dave, vault_id).await.is_err());

        let details = ledger.get_vault(&alice, vault_id).await.unwrap();
        assert_eq!(details.members.len(), 3);
    }

    #[tokio::test]
    async fn test_leave_vault() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let bob = actor("bob");
        let vault_id = vault_with_owner(&ledger, &alice).await;
        join(&ledger, vault_id, &alice, &bob, MemberRole::Member).await;

        assert!(ledger.leave_vault(&alice, vault_id).await.is_err());
        ledger.leave_vault(&bob, vault_id).await.unwrap();
        assert!(ledger.list_vaults(&bob).await.is_empty());
        assert!(ledger.leave_vault(&bob, vault_id).await.is_err());
    }
}
