//! Per-caller execution state.

use super::registry::EffectiveSet;
use super::result::CommandResult;
use campus_auth::Grants;
use campus_types::{CallerId, Principal, SessionId};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;

/// Entries kept in a context's message log; the oldest is dropped first.
pub const MESSAGE_LOG_SIZE: usize = 64;

/// Severity of a [`ContextMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// One entry in the context's message log.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMessage {
    pub level: MessageLevel,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// State carried through one or more invocations for a single caller.
///
/// An interactive session keeps one context for its whole lifetime; the
/// single-shot adapter builds a fresh one per request. A context is owned
/// by exactly one session and is never shared.
///
/// # Example
///
/// ```
/// use campus_auth::{Grants, Role};
/// use campus_runtime::command::ExecutionContext;
/// use campus_types::{CallerId, Principal};
/// use serde_json::json;
///
/// let mut ctx = ExecutionContext::new(
///     Principal::User(CallerId::new("u-42")),
///     "alice",
///     Grants::new().with_role(Role::User),
/// )
/// .with_state("current_game", json!("chess"));
///
/// assert_eq!(ctx.username(), "alice");
/// assert_eq!(ctx.state("current_game"), Some(&json!("chess")));
///
/// ctx.set_state("score", json!(3));
/// assert_eq!(ctx.game_state().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    caller: Principal,
    caller_id: CallerId,
    username: String,
    session_id: SessionId,
    grants: Grants,
    game_state: Map<String, Value>,
    input_buffer: String,
    output_buffer: Vec<String>,
    messages: VecDeque<ContextMessage>,
    history: Vec<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    last_success: Option<bool>,
    last_error: Option<String>,
    exit_requested: bool,
    visible: Option<Arc<EffectiveSet>>,
}

impl ExecutionContext {
    /// Creates a context for `caller` with a fresh session id.
    #[must_use]
    pub fn new(caller: Principal, username: impl Into<String>, grants: Grants) -> Self {
        let caller_id = caller
            .caller_id()
            .cloned()
            .unwrap_or_else(CallerId::anonymous);
        Self {
            caller,
            caller_id,
            username: username.into(),
            session_id: SessionId::new(),
            grants,
            game_state: Map::new(),
            input_buffer: String::new(),
            output_buffer: Vec::new(),
            messages: VecDeque::new(),
            history: Vec::new(),
            started_at: None,
            finished_at: None,
            last_success: None,
            last_error: None,
            exit_requested: false,
            visible: None,
        }
    }

    /// Context for an unidentified caller holding only guest grants.
    #[must_use]
    pub fn guest() -> Self {
        Self::new(Principal::Guest, "guest", Grants::guest())
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    #[must_use]
    pub fn with_game_state(mut self, game_state: Map<String, Value>) -> Self {
        self.game_state = game_state;
        self
    }

    #[must_use]
    pub fn with_state(mut self, key: impl Into<String>, value: Value) -> Self {
        self.game_state.insert(key.into(), value);
        self
    }

    /// Replaces identity and grants, e.g. after a login completes.
    pub fn set_identity(&mut self, caller: Principal, username: impl Into<String>, grants: Grants) {
        self.caller_id = caller
            .caller_id()
            .cloned()
            .unwrap_or_else(CallerId::anonymous);
        self.caller = caller;
        self.username = username.into();
        self.grants = grants;
        self.visible = None;
    }

    #[must_use]
    pub fn caller(&self) -> &Principal {
        &self.caller
    }

    #[must_use]
    pub fn caller_id(&self) -> &CallerId {
        &self.caller_id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn grants(&self) -> &Grants {
        &self.grants
    }

    #[must_use]
    pub fn game_state(&self) -> &Map<String, Value> {
        &self.game_state
    }

    #[must_use]
    pub fn state(&self, key: &str) -> Option<&Value> {
        self.game_state.get(key)
    }

    /// Inserts or replaces a game-state entry, returning the old value.
    pub fn set_state(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.game_state.insert(key.into(), value)
    }

    pub fn remove_state(&mut self, key: &str) -> Option<Value> {
        self.game_state.remove(key)
    }

    /// Raw line most recently handed to the executor.
    #[must_use]
    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    /// Queues a line of output for the adapter to deliver.
    pub fn write_output(&mut self, line: impl Into<String>) {
        self.output_buffer.push(line.into());
    }

    #[must_use]
    pub fn output_buffer(&self) -> &[String] {
        &self.output_buffer
    }

    /// Drains queued output.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output_buffer)
    }

    /// Appends to the message log, evicting the oldest entry once
    /// [`MESSAGE_LOG_SIZE`] is reached.
    pub fn push_message(&mut self, level: MessageLevel, text: impl Into<String>) {
        if self.messages.len() == MESSAGE_LOG_SIZE {
            self.messages.pop_front();
        }
        self.messages.push_back(ContextMessage {
            level,
            text: text.into(),
            at: Utc::now(),
        });
    }

    /// Message log, oldest first.
    #[must_use]
    pub fn messages(&self) -> &VecDeque<ContextMessage> {
        &self.messages
    }

    /// Lines this session has submitted, oldest first, including the one
    /// being executed. Empty outside interactive sessions.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Whether the last invocation succeeded; `None` before the first run.
    #[must_use]
    pub fn last_success(&self) -> Option<bool> {
        self.last_success
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Asks the owning session to close once the current line completes.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Commands this caller may see, as of the most recent dispatch.
    #[must_use]
    pub fn visible_commands(&self) -> Option<&EffectiveSet> {
        self.visible.as_deref()
    }

    pub(crate) fn begin_line(&mut self, line: &str) {
        self.input_buffer.clear();
        self.input_buffer.push_str(line);
        self.started_at = Some(Utc::now());
        self.finished_at = None;
    }

    pub(crate) fn set_history(&mut self, entries: impl IntoIterator<Item = String>) {
        self.history.clear();
        self.history.extend(entries);
    }

    pub(crate) fn set_visible(&mut self, visible: Arc<EffectiveSet>) {
        self.visible = Some(visible);
    }

    pub(crate) fn record(&mut self, result: &CommandResult) {
        self.finished_at = Some(Utc::now());
        self.last_success = Some(result.success());
        self.last_error = result.error().map(str::to_string);
        if !result.success() {
            self.push_message(MessageLevel::Error, result.display_text());
        }
        if result.should_exit() {
            self.exit_requested = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guest_is_anonymous() {
        let ctx = ExecutionContext::guest();
        assert!(ctx.caller().is_guest());
        assert_eq!(ctx.caller_id(), &CallerId::anonymous());
        assert!(ctx.last_success().is_none());
        assert!(!ctx.exit_requested());
    }

    #[test]
    fn record_tracks_last_outcome() {
        let mut ctx = ExecutionContext::guest();
        ctx.record(&CommandResult::failure("nope", "not found"));
        assert_eq!(ctx.last_success(), Some(false));
        assert_eq!(ctx.last_error(), Some("not found"));
        assert_eq!(ctx.messages().len(), 1);
        assert_eq!(ctx.messages()[0].level, MessageLevel::Error);

        ctx.record(&CommandResult::ok("fine"));
        assert_eq!(ctx.last_success(), Some(true));
        assert!(ctx.last_error().is_none());
        assert!(ctx.finished_at().is_some());
    }

    #[test]
    fn message_log_is_bounded() {
        let mut ctx = ExecutionContext::guest();
        for i in 0..MESSAGE_LOG_SIZE * 3 {
            ctx.record(&CommandResult::failure(format!("miss {i}"), "not found"));
        }
        assert_eq!(ctx.messages().len(), MESSAGE_LOG_SIZE);
        assert_eq!(
            ctx.messages().front().map(|m| m.text.as_str()),
            Some(format!("miss {}", MESSAGE_LOG_SIZE * 2).as_str())
        );
        assert_eq!(
            ctx.messages().back().map(|m| m.text.as_str()),
            Some(format!("miss {}", MESSAGE_LOG_SIZE * 3 - 1).as_str())
        );
    }

    #[test]
    fn history_snapshot_replaces_previous() {
        let mut ctx = ExecutionContext::guest();
        assert!(ctx.history().is_empty());
        ctx.set_history(["look".to_string()]);
        ctx.set_history(["look".to_string(), "help".to_string()]);
        assert_eq!(ctx.history(), ["look", "help"]);
    }

    #[test]
    fn exit_result_marks_context() {
        let mut ctx = ExecutionContext::guest();
        ctx.record(&CommandResult::ok("bye").with_exit());
        assert!(ctx.exit_requested());
    }

    #[test]
    fn output_drains() {
        let mut ctx = ExecutionContext::guest();
        ctx.write_output("a");
        ctx.write_output("b");
        assert_eq!(ctx.take_output(), ["a", "b"]);
        assert!(ctx.output_buffer().is_empty());
    }

    #[test]
    fn set_identity_replaces_caller() {
        let mut ctx = ExecutionContext::guest().with_state("k", json!(1));
        ctx.set_identity(Principal::User(CallerId::new("u1")), "bob", Grants::new());
        assert_eq!(ctx.caller_id().as_str(), "u1");
        assert_eq!(ctx.username(), "bob");
        assert_eq!(ctx.state("k"), Some(&json!(1)));
    }
}
