//! Single-shot request/response adapter.
//!
//! Each request carries a complete command line plus the caller's identity
//! and is answered with one [`CommandResponse`]. Nothing survives between
//! requests: no history, no editor state, no context.

use crate::auth::Identity;
use crate::command::{CommandExecutor, CommandResult, ExecutionContext};
use campus_auth::{AccessLevel, Role, RolePermissions};
use campus_types::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One request.
///
/// Only `command_line` is required on the wire.
///
/// ```
/// use campus_runtime::protocol::CommandRequest;
///
/// let request: CommandRequest = serde_json::from_str(
///     r#"{"command_line": "whoami", "caller_id": "u-7", "permissions": ["world.*"]}"#,
/// ).unwrap();
/// assert_eq!(request.caller_id.as_deref(), Some("u-7"));
/// assert!(request.roles.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandRequest {
    pub command_line: String,
    pub caller_id: Option<String>,
    /// UUID, or any label from which a stable id is derived.
    pub session_id: Option<String>,
    pub permissions: Vec<String>,
    /// Defaults to `["user"]`.
    pub roles: Option<Vec<Role>>,
    pub access_level: Option<AccessLevel>,
    pub username: Option<String>,
    pub game_state: Map<String, Value>,
}

impl CommandRequest {
    #[must_use]
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = Some(roles.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = Some(level);
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_state(mut self, key: impl Into<String>, value: Value) -> Self {
        self.game_state.insert(key.into(), value);
        self
    }

    /// The caller described by this request.
    #[must_use]
    pub fn identity(&self) -> Identity {
        let username = self
            .username
            .clone()
            .or_else(|| self.caller_id.clone())
            .unwrap_or_else(|| "anonymous".to_string());

        let mut identity = Identity::new(username);
        identity.caller_id = self.caller_id.clone();
        if let Some(roles) = &self.roles {
            identity.roles = roles.clone();
        }
        identity.permissions = self.permissions.clone();
        identity.access_level = self.access_level;
        identity
    }
}

/// One response: `{success, message, data, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl CommandResponse {
    /// Response for a request that could not be read.
    #[must_use]
    pub fn invalid_request(reason: impl std::fmt::Display) -> Self {
        let error = format!("invalid request: {reason}");
        Self {
            success: false,
            message: error.clone(),
            data: None,
            error: Some(error),
        }
    }

    /// Folds the results of one line into a single response.
    ///
    /// Success is the AND of all results; messages are joined with
    /// newlines; the first error wins; a single payload is returned as is
    /// and several as an array.
    #[must_use]
    pub fn fold(results: &[CommandResult]) -> Self {
        let success = results.iter().all(CommandResult::success);
        let message = results
            .iter()
            .map(CommandResult::display_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let error = results
            .iter()
            .find_map(|r| r.error())
            .map(str::to_string);

        let mut payloads: Vec<Value> = results.iter().filter_map(|r| r.data().cloned()).collect();
        let data = match payloads.len() {
            0 => None,
            1 => payloads.pop(),
            _ => Some(Value::Array(payloads)),
        };

        Self {
            success,
            message,
            data,
            error,
        }
    }

    /// Single-line JSON encoding.
    #[must_use]
    pub fn to_json_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(error = %err, "response not serializable");
                r#"{"success":false,"message":"internal error","data":null,"error":"internal error"}"#
                    .to_string()
            }
        }
    }
}

impl From<&CommandResult> for CommandResponse {
    fn from(result: &CommandResult) -> Self {
        Self::fold(std::slice::from_ref(result))
    }
}

/// Answers [`CommandRequest`]s with a shared executor.
///
/// # Example
///
/// ```
/// use campus_runtime::command::{builtin, CommandExecutor, CommandRegistry};
/// use campus_runtime::protocol::SingleShotAdapter;
/// use campus_runtime::session::SessionManager;
/// use std::sync::Arc;
///
/// let registry = Arc::new(CommandRegistry::new());
/// builtin::install(&registry, Arc::new(SessionManager::new(8))).unwrap();
/// let adapter = SingleShotAdapter::new(Arc::new(CommandExecutor::new(registry)));
///
/// let response = adapter.handle_json(r#"{"command_line": "version"}"#);
/// assert!(response.success);
/// assert_eq!(response.data.unwrap()["name"], "CampusWorld");
/// ```
#[derive(Debug, Clone)]
pub struct SingleShotAdapter {
    executor: Arc<CommandExecutor>,
    defaults: Arc<RolePermissions>,
}

impl SingleShotAdapter {
    /// Adapter using the standard role table.
    #[must_use]
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self {
            executor,
            defaults: Arc::new(RolePermissions::standard()),
        }
    }

    #[must_use]
    pub fn with_role_permissions(mut self, defaults: Arc<RolePermissions>) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn executor(&self) -> &Arc<CommandExecutor> {
        &self.executor
    }

    /// Fresh context for `request`.
    #[must_use]
    pub fn context(&self, request: &CommandRequest) -> ExecutionContext {
        let identity = request.identity();
        let session_id = request
            .session_id
            .as_deref()
            .map_or_else(SessionId::new, SessionId::parse_or_derive);

        ExecutionContext::new(
            identity.principal(),
            identity.username.clone(),
            identity.grants(&self.defaults),
        )
        .with_session_id(session_id)
        .with_game_state(request.game_state.clone())
    }

    pub fn handle(&self, request: &CommandRequest) -> CommandResponse {
        let mut ctx = self.context(request);
        let results = self.executor.execute(&request.command_line, &mut ctx);
        let response = CommandResponse::fold(&results);
        tracing::debug!(
            session = %ctx.session_id().short(),
            caller = %ctx.caller(),
            invocations = results.len(),
            success = response.success,
            "single-shot request handled"
        );
        response
    }

    /// Parses `json` as a [`CommandRequest`] and handles it.
    pub fn handle_json(&self, json: &str) -> CommandResponse {
        match serde_json::from_str::<CommandRequest>(json) {
            Ok(request) => self.handle(&request),
            Err(err) => {
                tracing::info!(error = %err, "invalid single-shot request");
                CommandResponse::invalid_request(err)
            }
        }
    }
}
