//! Caller identities.
//!
//! The account store is an external collaborator; the engine only needs to
//! turn a username into roles, permissions and an access level. That
//! lookup is the [`IdentityProvider`] trait. [`StaticIdentities`] serves it
//! from configuration.

use campus_auth::{AccessLevel, Grants, PermissionSet, Role, RolePermissions};
use campus_types::{CallerId, Principal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What the account collaborator knows about one caller.
///
/// Doubles as the `[guest]` and `[[identities]]` config records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub username: String,
    /// Stable id; the username is used when absent.
    pub caller_id: Option<String>,
    pub roles: Vec<Role>,
    pub permissions: Vec<String>,
    /// Derived from the highest role when absent.
    pub access_level: Option<AccessLevel>,
}

impl Default for Identity {
    fn default() -> Self {
        Self::guest()
    }
}

impl Identity {
    /// A named identity with role `user`.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            caller_id: None,
            roles: vec![Role::User],
            permissions: Vec::new(),
            access_level: None,
        }
    }

    /// The unauthenticated identity.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            username: "guest".to_string(),
            caller_id: None,
            roles: vec![Role::Guest],
            permissions: Vec::new(),
            access_level: None,
        }
    }

    #[must_use]
    pub fn with_caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    #[must_use]
    pub fn with_access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = Some(level);
        self
    }

    #[must_use]
    pub fn highest_role(&self) -> Option<Role> {
        self.roles.iter().copied().max()
    }

    /// Returns `true` when nothing above `guest` is held.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.caller_id.is_none() && self.highest_role().map_or(true, |r| r == Role::Guest)
    }

    #[must_use]
    pub fn principal(&self) -> Principal {
        if self.is_guest() {
            return Principal::Guest;
        }
        let id = self.caller_id.as_deref().unwrap_or(&self.username);
        Principal::User(CallerId::new(id))
    }

    /// Grants: role defaults plus explicit permissions.
    #[must_use]
    pub fn grants(&self, defaults: &RolePermissions) -> Grants {
        let mut permissions = defaults.expand(self.roles.iter().copied());
        permissions.extend(self.permissions.iter().map(String::as_str));

        let level = self
            .access_level
            .or_else(|| self.highest_role().map(AccessLevel::for_role))
            .unwrap_or_default();

        Grants::new()
            .with_roles(self.roles.iter().copied())
            .with_permissions(&permissions)
            .with_access_level(level)
    }

    /// Explicit permissions only.
    #[must_use]
    pub fn explicit_permissions(&self) -> PermissionSet {
        self.permissions.iter().map(String::as_str).collect()
    }
}

/// Username → identity lookup.
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Identity for `username`, if known.
    fn lookup(&self, username: &str) -> Option<Identity>;

    /// Identity given to unknown callers.
    fn guest(&self) -> Identity;

    /// Known identity, or the guest identity under the typed name.
    fn identify(&self, username: &str) -> Identity {
        self.lookup(username).unwrap_or_else(|| {
            let mut guest = self.guest();
            if !username.trim().is_empty() {
                guest.username = username.trim().to_string();
            }
            guest
        })
    }
}

/// Fixed identity table, usually loaded from config.
///
/// # Example
///
/// ```
/// use campus_auth::Role;
/// use campus_runtime::auth::{Identity, IdentityProvider, StaticIdentities};
///
/// let identities = StaticIdentities::new(Identity::guest())
///     .with_identity(Identity::new("alice").with_roles([Role::Admin]));
///
/// assert_eq!(identities.identify("Alice").highest_role(), Some(Role::Admin));
/// assert!(identities.identify("mallory").is_guest());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIdentities {
    by_name: HashMap<String, Identity>,
    guest: Identity,
}

impl StaticIdentities {
    #[must_use]
    pub fn new(guest: Identity) -> Self {
        Self {
            by_name: HashMap::new(),
            guest,
        }
    }

    /// Adds or replaces an identity. Usernames match case-insensitively.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.insert(identity);
        self
    }

    pub fn insert(&mut self, identity: Identity) {
        self.by_name
            .insert(identity.username.to_lowercase(), identity);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl IdentityProvider for StaticIdentities {
    fn lookup(&self, username: &str) -> Option<Identity> {
        self.by_name.get(&username.trim().to_lowercase()).cloned()
    }

    fn guest(&self) -> Identity {
        self.guest.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_auth::Permission;

    #[test]
    fn grants_union_role_defaults_and_explicit() {
        let identity = Identity::new("bob").with_permission("lab.use");
        let grants = identity.grants(&RolePermissions::standard());
        assert!(grants.permission_satisfies(&Permission::new("campus.view")));
        assert!(grants.permission_satisfies(&Permission::new("auth.login")));
        assert!(grants.permission_satisfies(&Permission::new("lab.use")));
        assert!(!grants.permission_satisfies(&Permission::new("campus.edit")));
        assert_eq!(grants.access_level(), AccessLevel::Normal);
    }

    #[test]
    fn explicit_level_overrides_role() {
        let identity = Identity::new("eve")
            .with_roles([Role::User])
            .with_access_level(AccessLevel::Admin);
        let grants = identity.grants(&RolePermissions::standard());
        assert_eq!(grants.access_level(), AccessLevel::Admin);
    }

    #[test]
    fn principal_prefers_caller_id() {
        let identity = Identity::new("carol").with_caller_id("u-7");
        assert_eq!(identity.principal(), Principal::User(CallerId::new("u-7")));
        assert_eq!(
            Identity::new("dan").principal(),
            Principal::User(CallerId::new("dan"))
        );
        assert_eq!(Identity::guest().principal(), Principal::Guest);
    }

    #[test]
    fn unknown_user_gets_guest_identity_under_typed_name() {
        let provider = StaticIdentities::new(Identity::guest());
        let identity = provider.identify(" visitor ");
        assert_eq!(identity.username, "visitor");
        assert!(identity.is_guest());
        assert_eq!(provider.identify("").username, "guest");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let provider =
            StaticIdentities::new(Identity::guest()).with_identity(Identity::new("Alice"));
        assert!(provider.lookup("ALICE").is_some());
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn deserializes_from_toml_shape() {
        let identity: Identity = serde_json::from_value(serde_json::json!({
            "username": "ops",
            "roles": ["dev"],
            "permissions": ["logs.view"]
        }))
        .expect("identity should deserialize");
        assert_eq!(identity.roles, [Role::Developer]);
        assert_eq!(identity.access_level, None);
    }
}
