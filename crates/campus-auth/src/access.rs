//! Access levels.

use crate::role::{Role, UnknownName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse numeric rank, independent of the role hierarchy.
///
/// Access levels are used for threshold checks ("anything at developer
/// level or above") where a role requirement would be too specific.
///
/// | Level | Rank |
/// |-------|------|
/// | guest | 0 |
/// | normal | 1 |
/// | moderator | 2 |
/// | developer | 3 |
/// | admin | 4 |
/// | owner | 5 |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Guest,
    Normal,
    Moderator,
    Developer,
    Admin,
    Owner,
}

impl AccessLevel {
    /// Returns the integer rank used for `>=` comparisons.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Guest => 0,
            Self::Normal => 1,
            Self::Moderator => 2,
            Self::Developer => 3,
            Self::Admin => 4,
            Self::Owner => 5,
        }
    }

    /// Returns the level with the same rank as `role`.
    ///
    /// ```
    /// use campus_auth::{AccessLevel, Role};
    ///
    /// assert_eq!(AccessLevel::for_role(Role::User), AccessLevel::Normal);
    /// assert_eq!(AccessLevel::for_role(Role::Owner), AccessLevel::Owner);
    /// ```
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Guest => Self::Guest,
            Role::User => Self::Normal,
            Role::Moderator => Self::Moderator,
            Role::Developer => Self::Developer,
            Role::Admin => Self::Admin,
            Role::Owner => Self::Owner,
        }
    }

    /// Returns the canonical lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Normal => "normal",
            Self::Moderator => "moderator",
            Self::Developer => "developer",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Self::Guest),
            "normal" | "user" => Ok(Self::Normal),
            "moderator" => Ok(Self::Moderator),
            "developer" | "dev" => Ok(Self::Developer),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            _ => Err(UnknownName {
                kind: "access level",
                value: s.to_string(),
            }),
        }
    }
}

/// Integer-rank comparison: `held >= required`.
#[must_use]
pub fn access_level_satisfies(held: AccessLevel, required: AccessLevel) -> bool {
    held.rank() >= required.rank()
}
