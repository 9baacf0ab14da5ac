//! Invitations: asking a known user to join a vault.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::users::find_by_email;
use super::{authorize, Actor, Ledger};
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerData;
use crate::vault::{
    Invitation, InvitationStatus, MemberRole, MemberStatus, Permission, VaultMember,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvitation {
    pub email: String,
    #[serde(default = "default_role")]
    pub role: MemberRole,
}

fn default_role() -> MemberRole {
    MemberRole::Member
}

/// An invitation as shown to its invitee.
#[derive(Debug, Clone, Serialize)]
pub struct PendingInvitation {
    pub id: Uuid,
    pub vault_id: Uuid,
    pub vault_name: String,
    pub role: MemberRole,
    pub inviter_id: String,
    pub inviter_name: String,
    pub created_at: DateTime<Utc>,
}

/// A pending invitation addressed to `actor`.
fn pending_for<'a>(
    data: &'a LedgerData,
    actor: &Actor,
    invitation_id: Uuid,
) -> LedgerResult<&'a Invitation> {
    let invitation = data
        .invitations
        .get(&invitation_id)
        .filter(|i| i.invitee_id == actor.user_id)
        .ok_or_else(|| LedgerError::not_found("Invitation"))?;
    if invitation.status != InvitationStatus::Pending {
        return Err(LedgerError::conflict("invitation has already been answered"));
    }
    if data.vault(invitation.vault_id).is_none() {
        return Err(LedgerError::not_found("Vault"));
    }
    Ok(invitation)
}

impl Ledger {
    pub async fn invite(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        new: NewInvitation,
    ) -> LedgerResult<Invitation> {
        let now = Self::now();
        let invitation = self
            .store
            .write(|data| {
                let role = authorize(data, actor, vault_id, Permission::ManageMembers)?;
                match new.role {
                    MemberRole::Owner => {
                        return Err(LedgerError::invalid("Cannot invite someone as owner"));
                    }
                    MemberRole::Admin if role != MemberRole::Owner => {
                        return Err(LedgerError::denied("only the owner can invite admins"));
                    }
                    _ => {}
                }

                let invitee = find_by_email(data, &new.email)
                    .ok_or_else(|| LedgerError::not_found("User with that email"))?;
                let invitee_id = invitee.id.clone();
                let invitee_name = invitee
                    .name
                    .clone()
                    .unwrap_or_else(|| invitee.email.clone());
                if invitee_id == actor.user_id {
                    return Err(LedgerError::invalid("You cannot invite yourself"));
                }

                match data.membership(vault_id, &invitee_id).map(|m| m.status) {
                    Some(MemberStatus::Active) => {
                        return Err(LedgerError::conflict("user is already a member"));
                    }
                    Some(MemberStatus::Pending) => {
                        return Err(LedgerError::conflict("user already has a pending invitation"));
                    }
                    Some(MemberStatus::Removed) | None => {}
                }

                match data.membership_mut(vault_id, &invitee_id) {
                    Some(member) => {
                        member.role = new.role;
                        member.status = MemberStatus::Pending;
                        member.invited_by = Some(actor.user_id.clone());
                        member.invited_at = Some(now);
                        member.joined_at = None;
                        member.updated_at = now;
                    }
                    None => {
                        let member = VaultMember {
                            id: Uuid::new_v4(),
                            vault_id,
                            user_id: invitee_id.clone(),
                            display_name: invitee_name,
                            role: new.role,
                            status: MemberStatus::Pending,
                            invited_by: Some(actor.user_id.clone()),
                            invited_at: Some(now),
                            joined_at: None,
                            is_default: false,
                            updated_at: now,
                            deleted_at: None,
                        };
                        data.members.insert(member.id, member);
                    }
                }

                let invitation = Invitation {
                    id: Uuid::new_v4(),
                    vault_id,
                    role: new.role,
                    status: InvitationStatus::Pending,
                    inviter_id: actor.user_id.clone(),
                    invitee_id,
                    created_at: now,
                };
                data.invitations.insert(invitation.id, invitation.clone());
                Ok(invitation)
            })
            .await?;
        tracing::info!(
            "User {} invited {} to vault {} as {}",
            actor.user_id,
            invitation.invitee_id,
            vault_id,
            invitation.role
        );
        Ok(invitation)
    }

    /// Pending invitations addressed to the actor, newest first.
    pub async fn list_pending_invitations(&self, actor: &Actor) -> Vec<PendingInvitation> {
        self.store
            .read(|data| {
                let mut pending: Vec<PendingInvitation> = data
                    .invitations
                    .values()
                    .filter(|i| i.invitee_id == actor.user_id && i.status == InvitationStatus::Pending)
                    .filter_map(|i| {
                        let vault = data.vault(i.vault_id)?;
                        let inviter_name = data
                            .display_name(i.vault_id, &i.inviter_id)
                            .map(str::to_string)
                            .unwrap_or_else(|| i.inviter_id.clone());
                        Some(PendingInvitation {
                            id: i.id,
                            vault_id: i.vault_id,
                            vault_name: vault.name.clone(),
                            role: i.role,
                            inviter_id: i.inviter_id.clone(),
                            inviter_name,
                            created_at: i.created_at,
                        })
                    })
                    .collect();
                pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                pending
            })
            .await
    }

    pub async fn accept_invitation(&self, actor: &Actor, invitation_id: Uuid) -> LedgerResult<VaultMember> {
        let now = Self::now();
        let member = self
            .store
            .write(|data| {
                let vault_id = pending_for(data, actor, invitation_id)?.vault_id;
                let member = data
                    .membership_mut(vault_id, &actor.user_id)
                    .filter(|m| m.status == MemberStatus::Pending)
                    .ok_or_else(|| LedgerError::not_found("Pending membership"))?;
                member.status = MemberStatus::Active;
                member.joined_at = Some(now);
                member.display_name = actor.display_name();
                member.updated_at = now;
                let member = member.clone();

                if let Some(invitation) = data.invitations.get_mut(&invitation_id) {
                    invitation.status = InvitationStatus::Accepted;
                }
                Ok(member)
            })
            .await?;
        tracing::info!("User {} joined vault {}", actor.user_id, member.vault_id);
        Ok(member)
    }

    pub async fn decline_invitation(&self, actor: &Actor, invitation_id: Uuid) -> LedgerResult<()> {
        let now = Self::now();
        self.store
            .write(|data| {
                let vault_id = pending_for(data, actor, invitation_id)?.vault_id;
                if let Some(member) = data
                    .membership_mut(vault_id, &actor.user_id)
                    .filter(|m| m.status == MemberStatus::Pending)
                {
                    member.status = MemberStatus::Removed;
                    member.updated_at = now;
                }
                if let Some(invitation) = data.invitations.get_mut(&invitation_id) {
                    invitation.status = InvitationStatus::Rejected;
                }
                Ok(())
            })
            .await?;
        tracing::info!("User {} declined invitation {}", actor.user_id, invitation_id);
        Ok(())
    }
}
