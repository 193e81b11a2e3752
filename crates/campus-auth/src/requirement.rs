//! Authorization requirements attached to commands.

use crate::access::AccessLevel;
use crate::error::AccessDenied;
use crate::grants::Grants;
use crate::permission::Permission;
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The subset of checks an operation demands.
///
/// Each field is independent and optional; all present checks must pass
/// (logical AND). An empty requirement admits every caller.
///
/// # Example
///
/// ```
/// use campus_auth::{evaluate, AccessLevel, Grants, Requirement, Role};
///
/// let req = Requirement::none()
///     .with_role(Role::Admin)
///     .with_permission("system.manage");
///
/// let admin = Grants::new().with_role(Role::Admin).with_permission("system.*");
/// assert!(evaluate(&admin, &req).is_ok());
///
/// let user = Grants::new().with_role(Role::User).with_permission("*");
/// assert!(evaluate(&user, &req).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirement {
    /// Permission token that must be satisfied.
    pub permission: Option<Permission>,
    /// Minimum role.
    pub role: Option<Role>,
    /// Minimum access level.
    pub access_level: Option<AccessLevel>,
}

impl Requirement {
    /// A requirement with no checks.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Requires a permission token.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<Permission>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Requires a minimum role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Requires a minimum access level.
    #[must_use]
    pub fn with_access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = Some(level);
        self
    }

    /// Returns `true` if no check is present.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.permission.is_none() && self.role.is_none() && self.access_level.is_none()
    }

    /// Returns `true` if `grants` pass every present check.
    #[must_use]
    pub fn is_satisfied_by(&self, grants: &Grants) -> bool {
        evaluate(grants, self).is_ok()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unrestricted() {
            return f.write_str("none");
        }
        let mut parts = Vec::with_capacity(3);
        if let Some(ref p) = self.permission {
            parts.push(format!("permission {p}"));
        }
        if let Some(r) = self.role {
            parts.push(format!("role {r}"));
        }
        if let Some(l) = self.access_level {
            parts.push(format!("level {l}"));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Checks `grants` against `requirement`.
///
/// Checks run in the order permission, role, access level; the first
/// failure is returned.
///
/// # Errors
///
/// Returns [`AccessDenied`] naming the first check that failed.
pub fn evaluate(grants: &Grants, requirement: &Requirement) -> Result<(), AccessDenied> {
    if let Some(ref required) = requirement.permission {
        if !grants.permission_satisfies(required) {
            return Err(AccessDenied::missing_permission(required.clone()));
        }
    }

    if let Some(required) = requirement.role {
        if !grants.role_satisfies(required) {
            return Err(AccessDenied::InsufficientRole {
                required,
                held: grants.highest_role(),
            });
        }
    }

    if let Some(required) = requirement.access_level {
        if !grants.access_level_satisfies(required) {
            return Err(AccessDenied::InsufficientAccessLevel {
                required,
                held: grants.access_level(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_admits_empty_grants() {
        assert!(evaluate(&Grants::new(), &Requirement::none()).is_ok());
        assert!(Requirement::none().is_unrestricted());
    }

    #[test]
    fn missing_permission_is_reported_first() {
        let req = Requirement::none()
            .with_permission("world.edit")
            .with_role(Role::Admin);
        let err = evaluate(&Grants::new(), &req).expect_err("empty grants must be denied");
        assert!(matches!(err, AccessDenied::MissingPermission { .. }));
    }

    #[test]
    fn role_shortfall_reports_held_role() {
        let req = Requirement::none().with_role(Role::Admin);
        let grants = Grants::new().with_role(Role::User);
        let err = evaluate(&grants, &req).expect_err("user must not pass admin");
        assert!(matches!(
            err,
            AccessDenied::InsufficientRole {
                required: Role::Admin,
                held: Some(Role::User)
            }
        ));
    }

    #[test]
    fn access_level_shortfall() {
        let req = Requirement::none().with_access_level(AccessLevel::Developer);
        let grants = Grants::new().with_access_level(AccessLevel::Moderator);
        assert!(matches!(
            evaluate(&grants, &req),
            Err(AccessDenied::InsufficientAccessLevel { .. })
        ));
    }

    #[test]
    fn all_checks_must_pass() {
        let req = Requirement::none()
            .with_permission("logs.view")
            .with_role(Role::Developer)
            .with_access_level(AccessLevel::Developer);

        let ok = Grants::new()
            .with_role(Role::Developer)
            .with_permission("logs.view")
            .with_access_level(AccessLevel::Developer);
        assert!(req.is_satisfied_by(&ok));

        let low_level = ok.clone().with_access_level(AccessLevel::Normal);
        assert!(!req.is_satisfied_by(&low_level));
    }

    #[test]
    fn display_lists_present_checks() {
        let req = Requirement::none()
            .with_permission("system.view")
            .with_role(Role::Admin);
        assert_eq!(req.to_string(), "permission system.view, role admin");
        assert_eq!(Requirement::none().to_string(), "none");
    }
}
