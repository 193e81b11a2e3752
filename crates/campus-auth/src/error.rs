//! Authorization denial.
//!
//! [`AccessDenied`] names which of the three independent checks failed:
//!
//! ```text
//! Allowed = Permission(token) ∧ Role(rank) ∧ AccessLevel(rank)
//!               │                 │              │
//!      MissingPermission  InsufficientRole  InsufficientAccessLevel
//! ```

use crate::access::AccessLevel;
use crate::permission::Permission;
use crate::role::Role;
use campus_types::ErrorCode;
use thiserror::Error;

/// Error returned by an authorization guard.
///
/// # Example
///
/// ```
/// use campus_auth::{AccessDenied, Permission};
///
/// let err = AccessDenied::missing_permission(Permission::new("system.view"));
/// assert!(err.to_string().contains("system.view"));
/// assert_eq!(err.layer(), "permission");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// No held token satisfies the required permission.
    #[error("missing permission '{required}'")]
    MissingPermission {
        /// The permission that was required.
        required: Permission,
    },

    /// The caller's highest role ranks below the required role.
    #[error("requires role {required}, highest held: {}", .held.map_or("none", Role::as_str))]
    InsufficientRole {
        /// The role that was required.
        required: Role,
        /// The caller's highest role, if any.
        held: Option<Role>,
    },

    /// The caller's access level ranks below the required level.
    #[error("requires access level {required}, held: {held}")]
    InsufficientAccessLevel {
        /// The level that was required.
        required: AccessLevel,
        /// The caller's level.
        held: AccessLevel,
    },
}

impl AccessDenied {
    /// Creates a [`AccessDenied::MissingPermission`].
    #[must_use]
    pub fn missing_permission(required: impl Into<Permission>) -> Self {
        Self::MissingPermission {
            required: required.into(),
        }
    }

    /// Returns which check denied access.
    #[must_use]
    pub fn layer(&self) -> &'static str {
        match self {
            Self::MissingPermission { .. } => "permission",
            Self::InsufficientRole { .. } => "role",
            Self::InsufficientAccessLevel { .. } => "access_level",
        }
    }
}

impl ErrorCode for AccessDenied {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingPermission { .. } => "AUTH_MISSING_PERMISSION",
            Self::InsufficientRole { .. } => "AUTH_INSUFFICIENT_ROLE",
            Self::InsufficientAccessLevel { .. } => "AUTH_INSUFFICIENT_ACCESS_LEVEL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_types::assert_error_codes;

    #[test]
    fn display_messages() {
        let err = AccessDenied::InsufficientRole {
            required: Role::Admin,
            held: Some(Role::User),
        };
        assert_eq!(err.to_string(), "requires role admin, highest held: user");

        let err = AccessDenied::InsufficientRole {
            required: Role::User,
            held: None,
        };
        assert!(err.to_string().ends_with("none"), "got: {err}");

        let err = AccessDenied::InsufficientAccessLevel {
            required: AccessLevel::Admin,
            held: AccessLevel::Normal,
        };
        assert!(err.to_string().contains("admin"));
        assert_eq!(err.layer(), "access_level");
    }

    #[test]
    fn codes_follow_convention_and_never_recover() {
        let all = [
            AccessDenied::missing_permission("a"),
            AccessDenied::InsufficientRole {
                required: Role::Owner,
                held: None,
            },
            AccessDenied::InsufficientAccessLevel {
                required: AccessLevel::Owner,
                held: AccessLevel::Guest,
            },
        ];
        assert_error_codes(&all, "AUTH_");
        assert!(all.iter().all(|e| !e.is_recoverable()));
    }
}
