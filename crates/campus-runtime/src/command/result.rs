//! Command results.

use super::descriptor::CommandType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one invocation.
///
/// Results are immutable once produced: handlers build them with the
/// constructors and `with_*` methods, and the executor only stamps the
/// descriptor's [`CommandType`] before handing them to the adapter.
///
/// # Example
///
/// ```
/// use campus_runtime::command::CommandResult;
/// use serde_json::json;
///
/// let ok = CommandResult::ok("3 users online").with_data(json!({"count": 3}));
/// assert!(ok.success());
/// assert_eq!(ok.data(), Some(&json!({"count": 3})));
///
/// let failed = CommandResult::failure("Nothing to pick up.", "empty room");
/// assert!(!failed.success());
/// assert_eq!(failed.error(), Some("empty room"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    success: bool,
    message: String,
    data: Option<Value>,
    error: Option<String>,
    command_type: CommandType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    should_exit: bool,
}

impl CommandResult {
    /// A successful result with a message.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
            command_type: CommandType::default(),
            should_exit: false,
        }
    }

    /// A failed result with a user-facing message and a short error string.
    #[must_use]
    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
            command_type: CommandType::default(),
            should_exit: false,
        }
    }

    /// Attaches a structured payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the command type.
    #[must_use]
    pub fn with_command_type(mut self, command_type: CommandType) -> Self {
        self.command_type = command_type;
        self
    }

    /// Asks the owning session to close after this result is delivered.
    #[must_use]
    pub fn with_exit(mut self) -> Self {
        self.should_exit = true;
        self
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    /// Returns `true` if the session should close.
    #[must_use]
    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// Text to show a human: the message, or the error when the message is
    /// empty.
    #[must_use]
    pub fn display_text(&self) -> &str {
        if self.message.is_empty() {
            self.error.as_deref().unwrap_or_default()
        } else {
            &self.message
        }
    }
}
