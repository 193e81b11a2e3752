//! Caller authorization snapshot.

use crate::access::{access_level_satisfies, AccessLevel};
use crate::permission::{Permission, PermissionSet};
use crate::role::{role_satisfies, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything the engine knows about what a caller may do.
///
/// A `Grants` value is a snapshot: it is fetched from the account
/// collaborator when a session or request starts and is not refreshed
/// mid-invocation.
///
/// # Example
///
/// ```
/// use campus_auth::{AccessLevel, Grants, Permission, Role};
///
/// let grants = Grants::new()
///     .with_role(Role::Moderator)
///     .with_permission("campus.*")
///     .with_access_level(AccessLevel::Moderator);
///
/// assert!(grants.role_satisfies(Role::User));
/// assert!(grants.permission_satisfies(&Permission::new("campus.edit")));
/// assert!(!grants.access_level_satisfies(AccessLevel::Admin));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grants {
    permissions: PermissionSet,
    roles: BTreeSet<Role>,
    access_level: AccessLevel,
}

impl Grants {
    /// Creates empty grants: no roles, no permissions, guest level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants for an unauthenticated caller: role `guest`, level `guest`.
    #[must_use]
    pub fn guest() -> Self {
        Self::new().with_role(Role::Guest)
    }

    /// Adds a role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    /// Adds several roles.
    #[must_use]
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles.extend(roles);
        self
    }

    /// Adds a permission token.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<Permission>) -> Self {
        self.permissions.insert(permission);
        self
    }

    /// Adds every token from `permissions`.
    #[must_use]
    pub fn with_permissions(mut self, permissions: &PermissionSet) -> Self {
        self.permissions.extend_from(permissions);
        self
    }

    /// Sets the access level.
    #[must_use]
    pub fn with_access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = level;
        self
    }

    /// Held permission tokens.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Held roles, ascending.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Held access level.
    #[must_use]
    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Highest held role, if any.
    #[must_use]
    pub fn highest_role(&self) -> Option<Role> {
        self.roles.iter().next_back().copied()
    }

    /// See [`role_satisfies`](crate::role_satisfies).
    #[must_use]
    pub fn role_satisfies(&self, required: Role) -> bool {
        role_satisfies(self.roles.iter().copied(), required)
    }

    /// See [`permission_satisfies`](crate::permission_satisfies).
    #[must_use]
    pub fn permission_satisfies(&self, required: &Permission) -> bool {
        self.permissions.satisfies(required)
    }

    /// See [`access_level_satisfies`](crate::access_level_satisfies).
    #[must_use]
    pub fn access_level_satisfies(&self, required: AccessLevel) -> bool {
        access_level_satisfies(self.access_level, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grants_satisfy_nothing() {
        let grants = Grants::new();
        assert!(!grants.role_satisfies(Role::Guest));
        assert!(!grants.permission_satisfies(&Permission::new("auth.login")));
        assert!(grants.access_level_satisfies(AccessLevel::Guest));
        assert_eq!(grants.highest_role(), None);
    }

    #[test]
    fn guest_grants() {
        let grants = Grants::guest();
        assert!(grants.role_satisfies(Role::Guest));
        assert!(!grants.role_satisfies(Role::User));
        assert_eq!(grants.access_level(), AccessLevel::Guest);
    }

    #[test]
    fn highest_role_is_max() {
        let grants = Grants::new().with_roles([Role::User, Role::Admin, Role::Moderator]);
        assert_eq!(grants.highest_role(), Some(Role::Admin));
    }

    #[test]
    fn builder_accumulates_permissions() {
        let extra: PermissionSet = ["b", "c"].into_iter().collect();
        let grants = Grants::new().with_permission("a").with_permissions(&extra);
        assert_eq!(grants.permissions().len(), 3);
    }
}
