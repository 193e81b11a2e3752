//! Permission tokens and wildcard matching.
//!
//! # Matching Rules
//!
//! A required permission `P` is satisfied by a held token `T` when:
//!
//! | Held `T` | Satisfies `P` when |
//! |----------|--------------------|
//! | `*` or `all` | always |
//! | `ns.*` | `P` starts with `ns.` |
//! | anything else | `T == P` |
//!
//! Note that `user.*` does **not** satisfy the bare token `user`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An opaque permission token, optionally namespaced with dots.
///
/// # Example
///
/// ```
/// use campus_auth::Permission;
///
/// let held = Permission::new("user.*");
/// assert!(held.satisfies(&Permission::new("user.create")));
/// assert!(!held.satisfies(&Permission::new("world.create")));
///
/// assert!(Permission::new("*").satisfies(&Permission::new("anything")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Token that grants everything.
    pub const WILDCARD: &'static str = "*";

    /// Creates a permission token. Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        let token: String = token.into();
        let trimmed = token.trim();
        if trimmed.len() == token.len() {
            Self(token)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the global wildcards `*` and `all`.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::WILDCARD || self.0 == "all"
    }

    /// Returns the namespace prefix (including the trailing dot) if this is
    /// a namespace wildcard like `user.*`.
    #[must_use]
    pub fn namespace_prefix(&self) -> Option<&str> {
        self.0
            .strip_suffix('*')
            .filter(|prefix| prefix.ends_with('.') && prefix.len() > 1)
    }

    /// Returns `true` if holding `self` satisfies a requirement for `required`.
    #[must_use]
    pub fn satisfies(&self, required: &Permission) -> bool {
        if self.is_wildcard() || self.0 == required.0 {
            return true;
        }
        match self.namespace_prefix() {
            Some(prefix) => required.0.starts_with(prefix),
            None => false,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Permission {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// An ordered set of held permission tokens.
///
/// Empty tokens are ignored on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a token. Returns `false` if it was empty or already held.
    pub fn insert(&mut self, permission: impl Into<Permission>) -> bool {
        let permission = permission.into();
        if permission.as_str().is_empty() {
            return false;
        }
        self.0.insert(permission)
    }

    /// Removes a token. Returns `true` if it was held.
    pub fn remove(&mut self, permission: &Permission) -> bool {
        self.0.remove(permission)
    }

    /// Returns `true` if the exact token is held (no wildcard expansion).
    #[must_use]
    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.contains(permission)
    }

    /// Returns `true` if any held token satisfies `required`.
    #[must_use]
    pub fn satisfies(&self, required: &Permission) -> bool {
        permission_satisfies(&self.0, required)
    }

    /// Adds every token from `other`.
    pub fn extend_from(&mut self, other: &PermissionSet) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Iterates tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// Number of held tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no tokens are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<P: Into<Permission>> FromIterator<P> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut set = Self::new();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

impl<P: Into<Permission>> Extend<P> for PermissionSet {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for p in iter {
            self.insert(p);
        }
    }
}

/// Returns `true` if any token in `held` satisfies `required`.
pub fn permission_satisfies<'a, I>(held: I, required: &Permission) -> bool
where
    I: IntoIterator<Item = &'a Permission>,
{
    held.into_iter().any(|token| token.satisfies(required))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Permission {
        Permission::new(s)
    }

    #[test]
    fn exact_match() {
        assert!(p("campus.view").satisfies(&p("campus.view")));
        assert!(!p("campus.view").satisfies(&p("campus.edit")));
    }

    #[test]
    fn global_wildcards() {
        for wildcard in ["*", "all"] {
            assert!(p(wildcard).satisfies(&p("user.create")));
            assert!(p(wildcard).satisfies(&p("x")));
        }
    }

    #[test]
    fn namespace_wildcard() {
        assert!(p("user.*").satisfies(&p("user.create")));
        assert!(p("user.*").satisfies(&p("user.profile.edit")));
        assert!(!p("user.*").satisfies(&p("world.create")));
        assert!(!p("user.*").satisfies(&p("user")));
        assert!(!p("user.*").satisfies(&p("username.create")));
    }

    #[test]
    fn star_without_dot_is_literal() {
        assert!(p("user*").namespace_prefix().is_none());
        assert!(!p("user*").satisfies(&p("username")));
        assert!(p(".*").namespace_prefix().is_none());
    }

    #[test]
    fn tokens_are_trimmed() {
        assert_eq!(p("  a.b "), p("a.b"));
    }

    #[test]
    fn set_ignores_empty_tokens() {
        let mut set = PermissionSet::new();
        assert!(!set.insert(""));
        assert!(!set.insert("   "));
        assert!(set.insert("a"));
        assert!(!set.insert("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn set_satisfies_via_any_token() {
        let set: PermissionSet = ["campus.view", "world.*"].into_iter().collect();
        assert!(set.satisfies(&p("world.edit")));
        assert!(set.satisfies(&p("campus.view")));
        assert!(!set.satisfies(&p("campus.edit")));
        assert!(!PermissionSet::new().satisfies(&p("anything")));
    }

    mod proptest_permissions {
        use super::*;
        use proptest::prelude::*;

        fn token() -> impl Strategy<Value = String> {
            prop::string::string_regex("[a-z]{1,6}(\\.[a-z]{1,6}){0,2}")
                .expect("regex should be valid for token strategy")
        }

        proptest! {
            /// The global wildcard satisfies every requirement.
            #[test]
            fn wildcard_satisfies_everything(required in token()) {
                prop_assert!(Permission::new("*").satisfies(&Permission::new(required)));
            }

            /// A namespace wildcard only reaches tokens inside that namespace.
            #[test]
            fn namespace_wildcard_is_bounded(ns in "[a-z]{1,6}", required in token()) {
                let held = Permission::new(format!("{ns}.*"));
                let expected = required.starts_with(&format!("{ns}."));
                prop_assert_eq!(held.satisfies(&Permission::new(required)), expected);
            }

            /// Every token satisfies itself.
            #[test]
            fn reflexive(t in token()) {
                prop_assert!(Permission::new(t.clone()).satisfies(&Permission::new(t)));
            }
        }
    }
}
