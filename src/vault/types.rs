//! Vault, membership and invitation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::Audit;

/// How a vault icon should be rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconType {
    #[default]
    Emoji,
    Phosphor,
}

/// A shared expense container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_type: IconType,
    pub is_public: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

pub const DEFAULT_VAULT_COLOR: &str = "#3B82F6";
pub const DEFAULT_VAULT_ICON: &str = "🏦";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
            Self::Member => write!(f, "member"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Invited, not yet accepted.
    Pending,
    Active,
    /// Left, removed, or declined the invitation.
    Removed,
}

/// A user's membership in a vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultMember {
    pub id: Uuid,
    pub vault_id: Uuid,
    pub user_id: String,
    pub display_name: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    #[serde(default)]
    pub invited_by: Option<String>,
    #[serde(default)]
    pub invited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    /// Whether this is the user's default vault.
    #[serde(default)]
    pub is_default: bool,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl VaultMember {
    /// Membership for the creator of a vault.
    pub fn owner(vault_id: Uuid, user_id: &str, display_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vault_id,
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            role: MemberRole::Owner,
            status: MemberStatus::Active,
            invited_by: Some(user_id.to_string()),
            invited_at: None,
            joined_at: Some(now),
            is_default: false,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active && self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub vault_id: Uuid,
    pub role: MemberRole,
    pub status: InvitationStatus,
    pub inviter_id: String,
    pub invitee_id: String,
    pub created_at: DateTime<Utc>,
}
