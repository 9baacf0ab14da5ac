//! Role-based permissions inside a vault.
//!
//! A role maps to a fixed permission set. Members additionally only get to
//! edit or delete records they created themselves; owners and admins may
//! touch anything in the vault.

use serde::Serialize;

use super::types::MemberRole;
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewVault,
    EditVault,
    DeleteVault,
    ManageMembers,
    CreateExpenses,
    EditExpenses,
    DeleteExpenses,
}

impl Permission {
    pub const ALL: [Permission; 7] = [
        Permission::ViewVault,
        Permission::EditVault,
        Permission::DeleteVault,
        Permission::ManageMembers,
        Permission::CreateExpenses,
        Permission::EditExpenses,
        Permission::DeleteExpenses,
    ];

    fn describe(&self) -> &'static str {
        match self {
            Self::ViewVault => "view this vault",
            Self::EditVault => "edit this vault",
            Self::DeleteVault => "delete this vault",
            Self::ManageMembers => "manage members of this vault",
            Self::CreateExpenses => "create expenses in this vault",
            Self::EditExpenses => "edit expenses in this vault",
            Self::DeleteExpenses => "delete expenses in this vault",
        }
    }
}

/// Whether `role` grants `permission`.
pub fn role_allows(role: MemberRole, permission: Permission) -> bool {
    match role {
        MemberRole::Owner => true,
        MemberRole::Admin => permission != Permission::DeleteVault,
        MemberRole::Member => matches!(
            permission,
            Permission::ViewVault
                | Permission::CreateExpenses
                | Permission::EditExpenses
                | Permission::DeleteExpenses
        ),
    }
}

/// Permission flags for a role, as exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VaultPermissions {
    pub can_view_vault: bool,
    pub can_edit_vault: bool,
    pub can_delete_vault: bool,
    pub can_manage_members: bool,
    pub can_create_expenses: bool,
    pub can_edit_expenses: bool,
    pub can_delete_expenses: bool,
}

impl VaultPermissions {
    pub fn for_role(role: Option<MemberRole>) -> Self {
        let allows = |p| role.map(|r| role_allows(r, p)).unwrap_or(false);
        Self {
            can_view_vault: allows(Permission::ViewVault),
            can_edit_vault: allows(Permission::EditVault),
            can_delete_vault: allows(Permission::DeleteVault),
            can_manage_members: allows(Permission::ManageMembers),
            can_create_expenses: allows(Permission::CreateExpenses),
            can_edit_expenses: allows(Permission::EditExpenses),
            can_delete_expenses: allows(Permission::DeleteExpenses),
        }
    }
}

/// Check a permission for the caller's role.
///
/// No role means the caller is not an active member; that is reported as
/// "not found" so vault ids cannot be probed.
pub fn require(role: Option<MemberRole>, permission: Permission) -> LedgerResult<MemberRole> {
    let role = role.ok_or_else(|| LedgerError::not_found("Vault"))?;
    if role_allows(role, permission) {
        Ok(role)
    } else {
        Err(LedgerError::denied(format!(
            "a vault {} cannot {}",
            role,
            permission.describe()
        )))
    }
}

/// Whether a caller with `role` may modify a record created by `created_by`.
pub fn can_modify_record(role: MemberRole, created_by: &str, user_id: &str) -> bool {
    match role {
        MemberRole::Owner | MemberRole::Admin => true,
        MemberRole::Member => created_by == user_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_has_everything() {
        for p in Permission::ALL {
            assert!(role_allows(MemberRole::Owner, p));
        }
    }

    #[test]
    fn test_admin_cannot_delete_vault() {
        assert!(!role_allows(MemberRole::Admin, Permission::DeleteVault));
        assert!(role_allows(MemberRole::Admin, Permission::ManageMembers));
        assert!(role_allows(MemberRole::Admin, Permission::EditVault));
    }

    #[test]
    fn test_member_permissions() {
        assert!(role_allows(MemberRole::Member, Permission::ViewVault));
        assert!(role_allows(MemberRole::Member, Permission::CreateExpenses));
        assert!(!role_allows(MemberRole::Member, Permission::EditVault));
        assert!(!role_allows(MemberRole::Member, Permission::ManageMembers));
    }

    #[test]
    fn test_require_without_membership_is_not_found() {
        let err = require(None, Permission::ViewVault).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let err = require(Some(MemberRole::Member), Permission::EditVault).unwrap_err();
        assert!(matches!(err, LedgerError::PermissionDenied(_)));
        assert_eq!(
            require(Some(MemberRole::Admin), Permission::EditVault).unwrap(),
            MemberRole::Admin
        );
    }

    #[test]
    fn test_record_ownership() {
        assert!(can_modify_record(MemberRole::Member, "alice", "alice"));
        assert!(!can_modify_record(MemberRole::Member, "alice", "bob"));
        assert!(can_modify_record(MemberRole::Admin, "alice", "bob"));
    }

    #[test]
    fn test_flags_for_missing_role() {
        let flags = VaultPermissions::for_role(None);
        assert!(!flags.can_view_vault);
        let flags = VaultPermissions::for_role(Some(MemberRole::Admin));
        assert!(flags.can_manage_members && !flags.can_delete_vault);
    }
}
