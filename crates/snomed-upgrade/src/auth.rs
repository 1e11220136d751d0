//! Branch scoped authorization.
//!
//! Roles are granted either globally or on a branch path. A branch grant also
//! covers every branch below that path, so an administrator of
//! `MAIN/SNOMEDCT-A` administers its project branches too but not `MAIN`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use snomed_types::is_same_or_descendant;

/// A role a caller can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May author content.
    Author,
    /// May administer code systems.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Author => f.write_str("AUTHOR"),
            Self::Admin => f.write_str("ADMIN"),
        }
    }
}

/// The identity on whose behalf an operation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Username, used in log lines and error messages.
    pub username: String,
    /// Roles held on every branch.
    #[serde(default)]
    pub global_roles: HashSet<Role>,
    /// Roles held on a branch and its descendants.
    #[serde(default)]
    pub branch_roles: HashMap<String, HashSet<Role>>,
}

impl Caller {
    /// Creates a caller with no roles.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Grants a role on every branch.
    pub fn with_global_role(mut self, role: Role) -> Self {
        self.global_roles.insert(role);
        self
    }

    /// Grants a role on `branch_path` and its descendants.
    pub fn with_branch_role(mut self, branch_path: impl Into<String>, role: Role) -> Self {
        self.branch_roles
            .entry(branch_path.into())
            .or_default()
            .insert(role);
        self
    }
}

/// Decides whether a caller holds a role on a branch.
pub trait PermissionCheck: Send + Sync {
    /// Returns true if `caller` holds `role` on `branch_path`.
    fn has_permission(&self, caller: &Caller, role: Role, branch_path: &str) -> bool;
}

/// Grants based only on the roles carried by the [`Caller`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleBasedPermissions;

impl PermissionCheck for RoleBasedPermissions {
    fn has_permission(&self, caller: &Caller, role: Role, branch_path: &str) -> bool {
        caller.global_roles.contains(&role)
            || caller.branch_roles.iter().any(|(granted_on, roles)| {
                roles.contains(&role) && is_same_or_descendant(branch_path, granted_on)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extension_admin() -> Caller {
        Caller::new("extension-admin").with_branch_role("MAIN/SNOMEDCT-A", Role::Admin)
    }

    #[test]
    fn test_global_admin_allowed_everywhere() {
        let admin = Caller::new("admin").with_global_role(Role::Admin);
        assert!(RoleBasedPermissions.has_permission(&admin, Role::Admin, "MAIN"));
        assert!(RoleBasedPermissions.has_permission(&admin, Role::Admin, "MAIN/SNOMEDCT-A"));
    }

    #[test]
    fn test_extension_admin_scoped_to_extension() {
        let caller = extension_admin();
        assert!(!RoleBasedPermissions.has_permission(&caller, Role::Admin, "MAIN"));
        assert!(RoleBasedPermissions.has_permission(&caller, Role::Admin, "MAIN/SNOMEDCT-A"));
        assert!(RoleBasedPermissions.has_permission(
            &caller,
            Role::Admin,
            "MAIN/SNOMEDCT-A/PROJECT"
        ));
        assert!(!RoleBasedPermissions.has_permission(&caller, Role::Admin, "MAIN/SNOMEDCT-B"));
    }

    #[test]
    fn test_author_is_not_admin() {
        let author = Caller::new("author").with_global_role(Role::Author);
        assert!(!RoleBasedPermissions.has_permission(&author, Role::Admin, "MAIN/SNOMEDCT-A"));
        assert!(!RoleBasedPermissions.has_permission(&Caller::new("nobody"), Role::Author, "MAIN"));
    }
}
