//! Command error taxonomy.
//!
//! ```text
//! CommandError
//! ├── Parse            malformed invocation (no key, only switches)
//! ├── NotFound         key/alias absent from the caller's merged set
//! ├── Ambiguous        alias matches several descriptors of equal priority
//! ├── PermissionDenied authorization guard refused
//! └── Handler          the command's own logic failed or panicked
//! ```
//!
//! Every variant is recovered by [`CommandExecutor`](super::CommandExecutor)
//! and turned into a failed [`CommandResult`](super::CommandResult); none of
//! them reaches the transport.

use campus_auth::AccessDenied;
use campus_types::ErrorCode;
use thiserror::Error;

/// Error from [`CommandParser`](super::CommandParser).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The invocation consists only of switches.
    #[error("missing command name before '{token}'")]
    MissingKey {
        /// The first token, which looked like a switch.
        token: String,
    },
}

/// Error from the registry's mutation API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Descriptor key is empty or contains whitespace.
    #[error("invalid command key '{0}'")]
    InvalidKey(String),

    /// A name is already used by another descriptor in the same set.
    #[error("name '{name}' of command '{key}' collides with command '{existing}' in set '{set}'")]
    NameConflict {
        set: String,
        key: String,
        name: String,
        existing: String,
    },

    /// The named set has not been added.
    #[error("unknown command set '{0}'")]
    UnknownSet(String),

    /// No set contains the command.
    #[error("command '{0}' is not registered")]
    NotRegistered(String),
}

impl RegistryError {
    /// Creates a name conflict error.
    pub fn name_conflict(
        set: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        existing: impl Into<String>,
    ) -> Self {
        Self::NameConflict {
            set: set.into(),
            key: key.into(),
            name: name.into(),
            existing: existing.into(),
        }
    }
}

/// Error from name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Nothing matches.
    #[error("command '{name}' not found")]
    NotFound { name: String },

    /// Several descriptors share the alias at the same priority.
    #[error("command '{name}' is ambiguous: {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
}

/// Failure reported by a [`CommandHandler`](super::CommandHandler).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Arguments were missing or malformed.
    #[error("usage: {0}")]
    Usage(String),

    /// The operation ran and failed.
    #[error("{0}")]
    Failed(String),

    /// The handler panicked; the panic payload is carried as text.
    #[error("command panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Creates a [`HandlerError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Creates a [`HandlerError::Usage`].
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}

/// Per-invocation dispatch failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("command '{name}' not found")]
    NotFound { name: String },

    #[error("command '{name}' is ambiguous: {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error("permission denied for '{name}': {reason}")]
    PermissionDenied {
        name: String,
        #[source]
        reason: AccessDenied,
    },

    #[error("command '{name}' failed: {source}")]
    Handler {
        name: String,
        #[source]
        source: HandlerError,
    },
}

impl CommandError {
    /// The short error string placed in `CommandResult::error`.
    ///
    /// Parse, lookup and authorization failures use fixed strings so that
    /// clients can match on them; handler failures carry their message.
    #[must_use]
    pub fn wire_error(&self) -> String {
        match self {
            Self::Parse(_) => "parse error".to_string(),
            Self::NotFound { .. } => "not found".to_string(),
            Self::Ambiguous { .. } => "ambiguous".to_string(),
            Self::PermissionDenied { .. } => "permission denied".to_string(),
            Self::Handler { source, .. } => source.to_string(),
        }
    }
}

impl From<ResolveError> for CommandError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { name } => Self::NotFound { name },
            ResolveError::Ambiguous { name, candidates } => Self::Ambiguous { name, candidates },
        }
    }
}

impl ErrorCode for CommandError {
    fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "CMD_PARSE",
            Self::NotFound { .. } => "CMD_NOT_FOUND",
            Self::Ambiguous { .. } => "CMD_AMBIGUOUS",
            Self::PermissionDenied { .. } => "CMD_PERMISSION_DENIED",
            Self::Handler { .. } => "CMD_HANDLER",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // The caller can fix the input and retry.
            Self::Parse(_) | Self::NotFound { .. } | Self::Ambiguous { .. } => true,
            Self::Handler { source, .. } => matches!(source, HandlerError::Usage(_)),
            Self::PermissionDenied { .. } => false,
        }
    }
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) => "REGISTRY_INVALID_KEY",
            Self::NameConflict { .. } => "REGISTRY_NAME_CONFLICT",
            Self::UnknownSet(_) => "REGISTRY_UNKNOWN_SET",
            Self::NotRegistered(_) => "REGISTRY_NOT_REGISTERED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
