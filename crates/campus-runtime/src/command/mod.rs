//! Command dispatch engine.
//!
//! # Components
//!
//! | Type | Role |
//! |------|------|
//! | [`CommandDescriptor`] | Metadata + handler for one command |
//! | [`CommandSet`] | Prioritized bundle of descriptors with a [`MergeType`] |
//! | [`CommandRegistry`] | All sets; computes a caller's [`EffectiveSet`] |
//! | [`CommandParser`] | Line → [`Invocation`]s |
//! | [`ExecutionContext`] | Per-caller state |
//! | [`CommandExecutor`] | parse → resolve → authorize → invoke |
//! | [`CommandResult`] | Outcome of one invocation |
//!
//! The executor is transport-agnostic; the adapters in
//! [`protocol`](crate::protocol) feed it lines and render its results.

pub mod builtin;
mod context;
mod descriptor;
mod error;
mod executor;
mod handler;
mod parser;
mod registry;
mod result;
mod set;

pub use context::{ContextMessage, ExecutionContext, MessageLevel, MESSAGE_LOG_SIZE};
pub use descriptor::{CommandDescriptor, CommandType};
pub use error::{CommandError, HandlerError, ParseError, RegistryError, ResolveError};
pub use executor::{CommandExecutor, DenialDisclosure};
pub use handler::CommandHandler;
pub use parser::{CommandParser, Invocation, DEFAULT_SEPARATOR};
pub use registry::{CommandRegistry, EffectiveSet};
pub use result::CommandResult;
pub use set::{Activation, CommandSet, MergeType};
