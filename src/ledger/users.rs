//! User directory, fed from verified identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Actor, Ledger};
use crate::error::LedgerResult;
use crate::store::LedgerData;
use crate::validation;
use crate::vault::InvitationStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Me {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub pending_invitations: usize,
}

/// Case-insensitive lookup by email.
pub(super) fn find_by_email<'a>(data: &'a LedgerData, email: &str) -> Option<&'a UserProfile> {
    let email = email.trim();
    data.users
        .values()
        .find(|u| u.email.eq_ignore_ascii_case(email))
}

impl Ledger {
    /// Record the actor's identity; writes only when something changed.
    pub async fn upsert_profile(&self, actor: &Actor) -> LedgerResult<()> {
        let unchanged = self
            .store
            .read(|data| {
                data.users
                    .get(&actor.user_id)
                    .is_some_and(|u| u.email == actor.email && u.name == actor.name)
            })
            .await;
        if unchanged {
            return Ok(());
        }

        let now = Self::now();
        self.store
            .write(|data| {
                let created = !data.users.contains_key(&actor.user_id);
                data.users.insert(
                    actor.user_id.clone(),
                    UserProfile {
                        id: actor.user_id.clone(),
                        email: actor.email.clone(),
                        name: actor.name.clone(),
                        updated_at: now,
                    },
                );
                if created {
                    tracing::info!("Registered user {}", actor.user_id);
                }
                Ok(())
            })
            .await
    }

    pub async fn me(&self, actor: &Actor) -> Me {
        self.store
            .read(|data| {
                let profile = data.users.get(&actor.user_id).cloned().unwrap_or_else(|| {
                    UserProfile {
                        id: actor.user_id.clone(),
                        email: actor.email.clone(),
                        name: actor.name.clone(),
                        updated_at: Self::now(),
                    }
                });
                let pending_invitations = data
                    .invitations
                    .values()
                    .filter(|i| i.invitee_id == actor.user_id && i.status == InvitationStatus::Pending)
                    .filter(|i| data.vault(i.vault_id).is_some())
                    .count();
                Me {
                    profile,
                    pending_invitations,
                }
            })
            .await
    }

    /// Set the actor's display name in the directory and in every vault they
    /// belong to. Returns the number of memberships updated.
    pub async fn sync_display_name(&self, actor: &Actor, name: &str) -> LedgerResult<usize> {
        let name = validation::name("Display name", name)?;
        let now = Self::now();
        let updated = self
            .store
            .write(|data| {
                if let Some(profile) = data.users.get_mut(&actor.user_id) {
                    profile.name = Some(name.clone());
                    profile.updated_at = now;
                }
                let mut updated = 0;
                for member in data
                    .members
                    .values_mut()
                    .filter(|m| m.user_id == actor.user_id && m.deleted_at.is_none())
                {
                    member.display_name = name.clone();
                    member.updated_at = now;
                    updated += 1;
                }
                Ok(updated)
            })
            .await?;
        tracing::info!(
            "Synced display name of user {} across {} memberships",
            actor.user_id,
            updated
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::store::{LedgerStore, MemorySink};
    use crate::ledger::{Ledger, LedgerSettings};
    use crate::vault::MemberRole;

    #[tokio::test]
    async fn test_upsert_writes_only_on_change() {
        let sink = MemorySink::new();
        let ledger = Ledger::new(
            LedgerStore::open(Box::new(sink.clone())).await,
            LedgerSettings::default(),
        );
        let mut alice = actor("alice");

        ledger.upsert_profile(&alice).await.unwrap();
        ledger.upsert_profile(&alice).await.unwrap();
        assert_eq!(sink.saves(), 1);

        alice.name = Some("Alice Liddell".into());
        ledger.upsert_profile(&alice).await.unwrap();
        assert_eq!(sink.saves(), 2);
    }

    #[tokio::test]
    async fn test_sync_display_name_updates_memberships() {
        let ledger = ledger().await;
        let alice = actor("alice");
        let bob = actor("bob");
        let first = vault_with_owner(&ledger, &alice).await;
        let second = vault_with_owner(&ledger, &bob).await;
        join(&ledger, second, &bob, &alice, MemberRole::Member).await;

        assert_eq!(ledger.sync_display_name(&alice, "  Ally ").await.unwrap(), 2);
        let details = ledger.get_vault(&alice, first).await.unwrap();
        assert_eq!(details.membership.display_name, "Ally");
        assert_eq!(ledger.me(&alice).await.profile.name.as_deref(), Some("Ally"));

        assert!(ledger.sync_display_name(&alice, " ").await.is_err());
    }
}
