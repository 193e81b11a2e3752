//! Default role to permission mapping.
//!
//! Each role inherits every grant of the roles ranked below it, so the
//! table only lists what a role adds.
//!
//! | Role | Adds |
//! |------|------|
//! | guest | `auth.login`, `profile.view` |
//! | user | `auth.logout`, `profile.edit`, `campus.view`, `world.view` |
//! | moderator | `user.view`, `campus.edit`, `campus.manage`, `world.edit`, `world.manage` |
//! | developer | `dev.debug`, `dev.test`, `dev.features`, `system.view`, `logs.view` |
//! | admin | `user.*`, `campus.*`, `world.*`, `system.*`, `logs.*` |
//! | owner | `*` |

use crate::permission::{Permission, PermissionSet};
use crate::role::Role;
use std::collections::BTreeMap;

/// Role to permission table.
///
/// # Example
///
/// ```
/// use campus_auth::{Permission, Role, RolePermissions};
///
/// let table = RolePermissions::standard();
/// let perms = table.expand([Role::Moderator]);
///
/// assert!(perms.satisfies(&Permission::new("campus.manage")));
/// assert!(perms.satisfies(&Permission::new("auth.login")));   // inherited from guest
/// assert!(!perms.satisfies(&Permission::new("system.view"))); // developer and up
/// ```
#[derive(Debug, Clone, Default)]
pub struct RolePermissions {
    own: BTreeMap<Role, PermissionSet>,
}

impl RolePermissions {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the standard table documented at module level.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::empty();
        let rows: [(Role, &[&str]); 6] = [
            (Role::Guest, &["auth.login", "profile.view"]),
            (
                Role::User,
                &["auth.logout", "profile.edit", "campus.view", "world.view"],
            ),
            (
                Role::Moderator,
                &[
                    "user.view",
                    "campus.edit",
                    "campus.manage",
                    "world.edit",
                    "world.manage",
                ],
            ),
            (
                Role::Developer,
                &[
                    "dev.debug",
                    "dev.test",
                    "dev.features",
                    "system.view",
                    "logs.view",
                ],
            ),
            (
                Role::Admin,
                &["user.*", "campus.*", "world.*", "system.*", "logs.*"],
            ),
            (Role::Owner, &[Permission::WILDCARD]),
        ];
        for (role, perms) in rows {
            for p in perms {
                table.grant(role, *p);
            }
        }
        table
    }

    /// Adds a permission to a role's own grants.
    pub fn grant(&mut self, role: Role, permission: impl Into<Permission>) {
        self.own.entry(role).or_default().insert(permission);
    }

    /// Removes a permission from a role's own grants.
    ///
    /// Returns `true` if the role held it directly. Grants inherited from
    /// lower roles are unaffected.
    pub fn revoke(&mut self, role: Role, permission: &Permission) -> bool {
        self.own
            .get_mut(&role)
            .is_some_and(|set| set.remove(permission))
    }

    /// Permissions a role adds on top of the roles below it.
    #[must_use]
    pub fn own_permissions(&self, role: Role) -> PermissionSet {
        self.own.get(&role).cloned().unwrap_or_default()
    }

    /// Permissions of `role` including inherited ones.
    #[must_use]
    pub fn permissions_for(&self, role: Role) -> PermissionSet {
        let mut out = PermissionSet::new();
        for (_, perms) in self.own.range(..=role) {
            out.extend_from(perms);
        }
        out
    }

    /// Union of [`permissions_for`](Self::permissions_for) over `roles`.
    #[must_use]
    pub fn expand(&self, roles: impl IntoIterator<Item = Role>) -> PermissionSet {
        match roles.into_iter().max() {
            Some(top) => self.permissions_for(top),
            None => PermissionSet::new(),
        }
    }
}
