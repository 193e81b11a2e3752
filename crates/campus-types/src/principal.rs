//! Principal (actor identity) types.
//!
//! A [`Principal`] says *who* is acting. What they may do is decided by
//! the grants in `campus-auth`; the two are kept apart so identity can be
//! logged and compared without pulling in authorization logic.

use crate::CallerId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The actor behind a command invocation.
///
/// | Variant | Typical Use |
/// |---------|-------------|
/// | `User` | Interactive login or single-shot API caller |
/// | `Guest` | Connection that has not identified itself |
/// | `System` | Startup wiring, idle reaper, shutdown |
///
/// # Example
///
/// ```
/// use campus_types::{CallerId, Principal};
///
/// let user = Principal::User(CallerId::new("u-1"));
/// assert!(user.is_user());
/// assert_eq!(user.caller_id().map(|c| c.as_str()), Some("u-1"));
///
/// assert!(Principal::System.caller_id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Principal {
    /// Authenticated caller.
    User(CallerId),
    /// Unauthenticated caller.
    Guest,
    /// Internal operation not attributable to a caller.
    System,
}

impl Principal {
    /// Returns `true` if this is a [`Principal::User`].
    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Returns `true` if this is a [`Principal::Guest`].
    #[must_use]
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// Returns the [`CallerId`] for users, otherwise `None`.
    #[must_use]
    pub fn caller_id(&self) -> Option<&CallerId> {
        match self {
            Self::User(id) => Some(id),
            Self::Guest | Self::System => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Guest => f.write_str("guest"),
            Self::System => f.write_str("system"),
        }
    }
}
