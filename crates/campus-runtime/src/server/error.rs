//! Server layer errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ServerError::Config`] | `SERVER_CONFIG` | No |
//! | [`ServerError::Registry`] | `SERVER_REGISTRY` | No |
//! | [`ServerError::Bind`] | `SERVER_BIND` | No |
//! | [`ServerError::Io`] | `SERVER_IO` | Yes |
//! | [`ServerError::Task`] | `SERVER_TASK` | No |
//! | [`ServerError::LoginTimeout`] | `SERVER_LOGIN_TIMEOUT` | Yes |
//!
//! Connection-level errors (`Io`, `LoginTimeout`) end only the affected
//! connection; the listener keeps accepting.

use crate::command::RegistryError;
use crate::config::ConfigError;
use campus_types::ErrorCode;
use thiserror::Error;

/// Server layer error.
///
/// # Example
///
/// ```
/// use campus_runtime::server::ServerError;
/// use campus_types::ErrorCode;
///
/// let err = ServerError::LoginTimeout;
/// assert_eq!(err.code(), "SERVER_LOGIN_TIMEOUT");
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Builtin command sets could not be assembled.
    #[error("command registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("failed to bind '{addr}': {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection I/O: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking dispatch task did not complete.
    #[error("dispatch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("login timed out")]
    LoginTimeout,
}

impl ServerError {
    pub fn bind(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}

impl ErrorCode for ServerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "SERVER_CONFIG",
            Self::Registry(_) => "SERVER_REGISTRY",
            Self::Bind { .. } => "SERVER_BIND",
            Self::Io(_) => "SERVER_IO",
            Self::Task(_) => "SERVER_TASK",
            Self::LoginTimeout => "SERVER_LOGIN_TIMEOUT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::LoginTimeout)
    }
}
