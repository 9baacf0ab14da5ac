//! Vault module - shared expense containers and who may do what in them.
//!
//! # Key Concepts
//! - Vault: a container of expenses, templates and budgets
//! - Member: a user's (owner/admin/member) membership, pending until accepted
//! - Invitation: an offer to join a vault with a given role
//! - Permissions: role to permission matrix, plus record ownership for members

pub mod permissions;
mod types;

pub use permissions::{can_modify_record, role_allows, Permission, VaultPermissions};
pub use types::{
    IconType, Invitation, InvitationStatus, MemberRole, MemberStatus, Vault, VaultMember,
    DEFAULT_VAULT_COLOR, DEFAULT_VAULT_ICON,
};
