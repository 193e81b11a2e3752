//! Command handler interface.

use super::context::ExecutionContext;
use super::error::HandlerError;
use super::result::CommandResult;

/// Executable logic behind a [`CommandDescriptor`](super::CommandDescriptor).
///
/// Handlers receive the parsed switches and the argument string verbatim;
/// unknown switches are theirs to accept or reject.
///
/// Closures with the matching signature implement this trait, which keeps
/// small commands and tests short:
///
/// ```
/// use campus_runtime::command::{CommandHandler, CommandResult, ExecutionContext, HandlerError};
///
/// let echo = |_: &mut ExecutionContext, _: &[String], args: &str| {
///     if args.is_empty() {
///         return Err(HandlerError::usage("echo <text>"));
///     }
///     Ok(CommandResult::ok(args))
/// };
///
/// let mut ctx = ExecutionContext::guest();
/// let result = echo.execute(&mut ctx, &[], "hi").expect("echo should succeed");
/// assert_eq!(result.message(), "hi");
/// ```
pub trait CommandHandler: Send + Sync {
    /// Runs the command.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the command cannot complete. The
    /// executor converts it into a failed result; it never reaches the
    /// transport.
    fn execute(
        &self,
        ctx: &mut ExecutionContext,
        switches: &[String],
        args: &str,
    ) -> Result<CommandResult, HandlerError>;
}

impl<F> CommandHandler for F
where
    F: Fn(&mut ExecutionContext, &[String], &str) -> Result<CommandResult, HandlerError>
        + Send
        + Sync,
{
    fn execute(
        &self,
        ctx: &mut ExecutionContext,
        switches: &[String],
        args: &str,
    ) -> Result<CommandResult, HandlerError> {
        self(ctx, switches, args)
    }
}
