//! Identifier types.
//!
//! Session identifiers are UUID-based. Callers are identified by the
//! opaque string the account store hands out.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::{uuid, Uuid};

/// Namespace for deterministic UUID v5 session ids derived from labels.
const SESSION_NAMESPACE: Uuid = uuid!("5b0f8e4c-7a1d-4c39-9f2e-3c6d2a8b1e47");

/// Identifier of one interactive session or single-shot request scope.
///
/// # UUID Strategy
///
/// - **Interactive sessions**: random UUID v4 per accepted connection
/// - **Client-supplied labels**: a single-shot request may name its session
///   with an arbitrary string; [`SessionId::parse_or_derive`] keeps real
///   UUIDs as-is and hashes anything else into a stable UUID v5
///
/// # Example
///
/// ```
/// use campus_types::SessionId;
///
/// let a = SessionId::parse_or_derive("web-tab-7");
/// let b = SessionId::parse_or_derive("web-tab-7");
/// assert_eq!(a, b);
///
/// assert_ne!(SessionId::new(), SessionId::new());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a fresh random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses `label` as a UUID, or derives a deterministic id from it.
    #[must_use]
    pub fn parse_or_derive(label: &str) -> Self {
        match Uuid::parse_str(label.trim()) {
            Ok(uuid) => Self(uuid),
            Err(_) => Self(Uuid::new_v5(&SESSION_NAMESPACE, label.as_bytes())),
        }
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the first eight hex digits, for prompts and listings.
    #[must_use]
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of an authenticated caller.
///
/// The engine never interprets the contents; it is only compared, logged
/// and echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    /// Creates a caller id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id used for callers that have not identified themselves.
    #[must_use]
    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CallerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
