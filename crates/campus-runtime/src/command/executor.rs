//! Transport-independent dispatch.
//!
//! ```text
//! line ──► CommandParser ──► [Invocation…]
//!                                 │ for each
//!                                 ▼
//!          merged_set(ctx) ──► resolve ──► authorize ──► handler
//!                                 │            │            │
//!                            NotFound /   PermissionDenied  Failed /
//!                            Ambiguous                      Panicked
//!                                 └────────────┴────────────┘
//!                                              ▼
//!                                        CommandResult
//! ```
//!
//! Resolution uses the caller's merged set, not the permission-filtered
//! one, so a forbidden command is reported as denied. Whether the caller
//! also sees that distinction is a [`DenialDisclosure`] choice; the audit
//! log always records it.

use super::context::ExecutionContext;
use super::descriptor::CommandDescriptor;
use super::error::{CommandError, HandlerError};
use super::parser::{CommandParser, Invocation};
use super::registry::{CommandRegistry, EffectiveSet};
use super::result::CommandResult;
use crate::auth::DefaultPolicy;
use crate::io::CommandHistory;
use campus_auth::PermissionPolicy;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// What a denied caller is told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DenialDisclosure {
    /// "Permission denied for command 'x'."
    #[default]
    Reveal,
    /// Same result as an unknown command.
    Conceal,
}

/// Orchestrates parse → resolve → authorize → invoke.
///
/// One executor is shared by every session; all per-caller state lives in
/// the [`ExecutionContext`].
///
/// # Example
///
/// ```
/// use campus_auth::{Grants, Role};
/// use campus_runtime::command::{
///     CommandDescriptor, CommandExecutor, CommandRegistry, CommandResult, CommandSet,
///     ExecutionContext,
/// };
/// use campus_types::{CallerId, Principal};
/// use std::sync::Arc;
///
/// let registry = Arc::new(CommandRegistry::new());
/// let mut set = CommandSet::new("base");
/// set.add(
///     CommandDescriptor::new("shutdown", |_: &mut ExecutionContext, _: &[String], _: &str| {
///         Ok(CommandResult::ok("shutting down"))
///     })
///     .expect("valid key")
///     .with_role(Role::Admin),
/// )
/// .expect("no conflicts");
/// registry.add_set(set);
///
/// let executor = CommandExecutor::new(Arc::clone(&registry));
/// let mut ctx = ExecutionContext::new(
///     Principal::User(CallerId::new("u1")),
///     "alice",
///     Grants::new().with_role(Role::User),
/// );
///
/// let results = executor.execute("shutdown; nosuch", &mut ctx);
/// assert_eq!(results[0].error(), Some("permission denied"));
/// assert_eq!(results[1].error(), Some("not found"));
/// ```
pub struct CommandExecutor {
    registry: Arc<CommandRegistry>,
    parser: CommandParser,
    policy: Arc<dyn PermissionPolicy>,
    disclosure: DenialDisclosure,
}

impl CommandExecutor {
    /// Executor with the default parser, [`DefaultPolicy`] and
    /// [`DenialDisclosure::Reveal`].
    #[must_use]
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self {
            registry,
            parser: CommandParser::default(),
            policy: Arc::new(DefaultPolicy),
            disclosure: DenialDisclosure::default(),
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: CommandParser) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn PermissionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_disclosure(mut self, disclosure: DenialDisclosure) -> Self {
        self.disclosure = disclosure;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Commands `ctx` may see right now.
    #[must_use]
    pub fn visible_set(&self, ctx: &ExecutionContext) -> EffectiveSet {
        self.registry.effective_set(ctx)
    }

    /// Runs every invocation on `line` and returns one result per
    /// invocation that ran.
    ///
    /// A parse error yields a single failed result and nothing runs. A
    /// result requesting exit stops the remaining invocations. No error
    /// escapes; every failure becomes a failed [`CommandResult`].
    pub fn execute(&self, line: &str, ctx: &mut ExecutionContext) -> Vec<CommandResult> {
        ctx.begin_line(line);
        let mut merged = Some(self.refresh(ctx));

        let invocations = match self.parser.parse(line) {
            Ok(invocations) => invocations,
            Err(err) => {
                tracing::info!(session = %ctx.session_id(), error = %err, "unparseable line");
                let result = self.error_result(&CommandError::from(err), None);
                ctx.record(&result);
                return vec![result];
            }
        };

        let mut results = Vec::with_capacity(invocations.len());
        for invocation in &invocations {
            // Earlier invocations may change game state and thus the active sets.
            let current = match merged.take() {
                Some(merged) => merged,
                None => self.refresh(ctx),
            };

            let result = self.dispatch(&current, invocation, ctx);
            ctx.record(&result);
            let exit = result.should_exit();
            results.push(result);
            if exit {
                break;
            }
        }
        results
    }

    /// Merges the caller's active sets and publishes the visible part.
    fn refresh(&self, ctx: &mut ExecutionContext) -> EffectiveSet {
        let merged = self.registry.merged_set(ctx);
        ctx.set_visible(Arc::new(merged.visible_to(ctx.grants())));
        merged
    }

    /// [`execute`](Self::execute) for interactive sessions: the line is
    /// appended to `history` whatever the outcome, and handlers see the
    /// updated history through [`ExecutionContext::history`].
    pub fn execute_interactive(
        &self,
        line: &str,
        ctx: &mut ExecutionContext,
        history: &mut CommandHistory,
    ) -> Vec<CommandResult> {
        history.push(line);
        ctx.set_history(history.entries().map(str::to_string));
        self.execute(line, ctx)
    }

    fn dispatch(
        &self,
        merged: &EffectiveSet,
        invocation: &Invocation,
        ctx: &mut ExecutionContext,
    ) -> CommandResult {
        let span = tracing::info_span!(
            "command",
            session = %ctx.session_id().short(),
            caller = %ctx.caller(),
            command = %invocation.key,
        );
        let _guard = span.enter();

        let descriptor = match merged.resolve(&invocation.key) {
            Ok(descriptor) => descriptor.clone(),
            Err(err) => {
                let err = CommandError::from(err);
                tracing::info!(error = %err, "command not resolved");
                return self.error_result(&err, None);
            }
        };

        if let Err(reason) = self.policy.authorize(ctx.grants(), descriptor.requirement()) {
            tracing::warn!(check = reason.layer(), reason = %reason, "permission denied");
            let err = CommandError::PermissionDenied {
                name: invocation.key.clone(),
                reason,
            };
            return self.error_result(&err, Some(&descriptor));
        }

        match invoke(&descriptor, ctx, invocation) {
            Ok(result) => {
                tracing::debug!(success = result.success(), "command completed");
                result.with_command_type(descriptor.command_type())
            }
            Err(source) => {
                match &source {
                    HandlerError::Panicked(message) => {
                        tracing::error!(panic = %message, "command handler panicked");
                    }
                    other => tracing::warn!(error = %other, "command handler failed"),
                }
                let err = CommandError::Handler {
                    name: invocation.key.clone(),
                    source,
                };
                self.error_result(&err, Some(&descriptor))
            }
        }
    }

    fn error_result(
        &self,
        err: &CommandError,
        descriptor: Option<&CommandDescriptor>,
    ) -> CommandResult {
        let result = match err {
            CommandError::NotFound { name } => not_found(name),
            CommandError::PermissionDenied { name, .. } => match self.disclosure {
                DenialDisclosure::Reveal => CommandResult::failure(
                    format!("Permission denied for command '{name}'."),
                    err.wire_error(),
                ),
                DenialDisclosure::Conceal => return not_found(name),
            },
            CommandError::Ambiguous { name, candidates } => CommandResult::failure(
                format!("Command '{name}' is ambiguous: {}.", candidates.join(", ")),
                err.wire_error(),
            ),
            CommandError::Parse(source) => {
                CommandResult::failure(format!("Could not parse command: {source}."), err.wire_error())
            }
            CommandError::Handler { source, .. } => {
                CommandResult::failure(source.to_string(), err.wire_error())
            }
        };
        match descriptor {
            Some(d) => result.with_command_type(d.command_type()),
            None => result,
        }
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("parser", &self.parser)
            .field("disclosure", &self.disclosure)
            .finish_non_exhaustive()
    }
}

fn not_found(name: &str) -> CommandResult {
    CommandResult::failure(
        format!("Command '{name}' was not found. Type 'help' for available commands."),
        "not found",
    )
}

/// Calls the handler, turning a panic into [`HandlerError::Panicked`].
fn invoke(
    descriptor: &CommandDescriptor,
    ctx: &mut ExecutionContext,
    invocation: &Invocation,
) -> Result<CommandResult, HandlerError> {
    let handler = descriptor.handler();
    panic::catch_unwind(AssertUnwindSafe(|| {
        handler.execute(ctx, &invocation.switches, &invocation.args)
    }))
    .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
