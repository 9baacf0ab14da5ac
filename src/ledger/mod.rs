//! Ledger - the domain operations behind the HTTP API.
//!
//! Every operation takes the calling [`Actor`], checks the actor's role in the
//! target vault and then reads or writes the [`LedgerStore`].

mod budgets;
mod expenses;
mod invitations;
mod templates;
mod users;
mod vaults;

pub use budgets::BudgetFilter;
pub use expenses::{ExpensePatch, ExpenseView, NewExpense};
pub use invitations::{NewInvitation, PendingInvitation};
pub use templates::{NewTemplate, TemplatePatch};
pub use users::{Me, UserProfile};
pub use vaults::{MemberView, NewVault, VaultDetails, VaultPatch, VaultSummary};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::LedgerResult;
use crate::store::{LedgerData, LedgerStore};
use crate::vault::{permissions, MemberRole, Permission};

/// The authenticated caller of a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    /// Platform administrator (not a vault role).
    pub is_admin: bool,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            name: None,
            is_admin: false,
        }
    }

    /// Name shown to other vault members: the profile name, else the local
    /// part of the email, else the user id.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => self.user_id.clone(),
        }
    }
}

/// Limits applied by the ledger.
#[derive(Debug, Clone, Copy)]
pub struct LedgerSettings {
    /// Maximum number of live vaults a user may own.
    pub vault_limit: usize,
    pub default_page_size: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            vault_limit: 10,
            default_page_size: 10,
        }
    }
}

pub struct Ledger {
    store: LedgerStore,
    settings: LedgerSettings,
}

impl Ledger {
    pub fn new(store: LedgerStore, settings: LedgerSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> LedgerSettings {
        self.settings
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }
}

/// Check that `actor` holds `permission` in `vault_id`.
fn authorize(
    data: &LedgerData,
    actor: &Actor,
    vault_id: Uuid,
    permission: Permission,
) -> LedgerResult<MemberRole> {
    let role = data.role_of(vault_id, &actor.user_id);
    permissions::require(role, permission).inspect_err(|e| {
        tracing::warn!(
            "Rejected {:?} for user {} in vault {}: {}",
            permission,
            actor.user_id,
            vault_id,
            e
        );
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the ledger tests.

    use super::*;
    use crate::vault::MemberRole;

    pub fn actor(user_id: &str) -> Actor {
        Actor {
            user_id: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            name: Some(format!("{}{}", user_id[..1].to_uppercase(), &user_id[1..])),
            is_admin: false,
        }
    }

    pub async fn ledger() -> Ledger {
        Ledger::new(LedgerStore::in_memory().await, LedgerSettings::default())
    }

    pub async fn vault_with_owner(ledger: &Ledger, owner: &Actor) -> Uuid {
        ledger.upsert_profile(owner).await.unwrap();
        ledger
            .create_vault(owner, NewVault::named("Household"))
            .await
            .unwrap()
            .vault
            .id
    }

    /// Invite `user` with `role` and accept on their behalf.
    pub async fn join(ledger: &Ledger, vault_id: Uuid, inviter: &Actor, user: &Actor, role: MemberRole) {
        ledger.upsert_profile(user).await.unwrap();
        let invitation = ledger
            .invite(
                inviter,
                vault_id,
                NewInvitation {
                    email: user.email.clone(),
                    role,
                },
            )
            .await
            .unwrap();
        ledger.accept_invitation(user, invitation.id).await.unwrap();
    }
}
