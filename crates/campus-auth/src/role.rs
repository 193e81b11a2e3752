//! Role hierarchy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A caller role.
///
/// Roles are totally ordered; a caller holding a higher role satisfies any
/// requirement for a lower one.
///
/// ```text
/// guest < user < moderator < developer < admin < owner
/// ```
///
/// # Example
///
/// ```
/// use campus_auth::Role;
///
/// assert!(Role::Admin > Role::Moderator);
/// assert_eq!("dev".parse::<Role>(), Ok(Role::Developer));
/// assert_eq!(Role::Owner.rank(), 5);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Unauthenticated or restricted visitor.
    #[default]
    Guest,
    /// Regular account.
    User,
    /// Community moderator.
    Moderator,
    /// Content or system developer.
    #[serde(alias = "dev")]
    Developer,
    /// Administrator.
    Admin,
    /// Owner of the deployment.
    Owner,
}

impl Role {
    /// All roles in ascending order.
    pub const ALL: [Role; 6] = [
        Role::Guest,
        Role::User,
        Role::Moderator,
        Role::Developer,
        Role::Admin,
        Role::Owner,
    ];

    /// Returns the numeric rank (guest = 0 ... owner = 5).
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Guest => 0,
            Self::User => 1,
            Self::Moderator => 2,
            Self::Developer => 3,
            Self::Admin => 4,
            Self::Owner => 5,
        }
    }

    /// Returns the canonical lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Developer => "developer",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role or access level name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownName {
    /// What was being parsed ("role" or "access level").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl FromStr for Role {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Self::Guest),
            "user" => Ok(Self::User),
            "moderator" | "mod" => Ok(Self::Moderator),
            "developer" | "dev" => Ok(Self::Developer),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            _ => Err(UnknownName {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

/// Returns `true` iff the highest held role ranks at or above `required`.
///
/// An empty role set satisfies nothing, not even `guest`.
///
/// # Example
///
/// ```
/// use campus_auth::{role_satisfies, Role};
///
/// assert!(role_satisfies([Role::User, Role::Admin], Role::Moderator));
/// assert!(!role_satisfies([Role::User], Role::Admin));
/// assert!(!role_satisfies([], Role::Guest));
/// ```
pub fn role_satisfies<I>(held: I, required: Role) -> bool
where
    I: IntoIterator<Item = Role>,
{
    held.into_iter()
        .max()
        .is_some_and(|top| top.rank() >= required.rank())
}
