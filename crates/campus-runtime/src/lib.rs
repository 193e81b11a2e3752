//! CampusWorld runtime: command dispatch, authorization and line sessions.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Shared Types Layer                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  campus-types : SessionId, CallerId, Principal, ErrorCode   │
//! │  campus-auth  : Permission, Role, AccessLevel, Grants,      │
//! │                 Requirement, PermissionPolicy               │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Runtime Layer (THIS CRATE)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  command/  : descriptors, sets, registry, parser, executor  │
//! │  auth/     : DefaultPolicy, identities                      │
//! │  io/       : key decoding, line editor, history, prompt     │
//! │  protocol/ : interactive session, single-shot adapter       │
//! │  session/  : bounded session table, transports              │
//! │  server/   : engine wiring, TCP listeners                   │
//! │  config/   : layered TOML + env configuration               │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Frontend Layer                             │
//! │  (campus-cli: serve / exec / request)                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! ## [`command`] - Dispatch
//!
//! - [`CommandRegistry`](command::CommandRegistry): named command sets,
//!   merged by priority into an [`EffectiveSet`](command::EffectiveSet)
//! - [`CommandParser`](command::CommandParser): line → invocations
//! - [`CommandExecutor`](command::CommandExecutor): resolve, authorize, run
//!
//! ## [`auth`] - Authorization
//!
//! - [`DefaultPolicy`](auth::DefaultPolicy): requirement checks with audit logging
//! - [`IdentityProvider`](auth::IdentityProvider): username → grants
//!
//! ## [`io`] / [`protocol`] - Line Sessions
//!
//! - [`LineEditor`](io::LineEditor): byte-level editing, history, completion
//! - [`InteractiveSession`](protocol::InteractiveSession): editor + executor
//! - [`SingleShotAdapter`](protocol::SingleShotAdapter): one JSON request,
//!   one JSON response
//!
//! ## [`session`] / [`server`] - Connections
//!
//! - [`SessionManager`](session::SessionManager): capacity eviction, idle reaping
//! - [`Server`](server::Server): interactive and request listeners
//!
//! ## [`config`] - Configuration Management
//!
//! - [`CampusConfig`](config::CampusConfig): unified configuration type
//! - [`ConfigLoader`](config::ConfigLoader): multi-source config loader
//!
//! Configuration priority: Environment > Project > Global > Default

pub mod auth;
pub mod command;
pub mod config;
pub mod io;
pub mod protocol;
pub mod server;
pub mod session;

// Re-exports for convenience
pub use auth::{DefaultPolicy, Identity, IdentityProvider, StaticIdentities};
pub use command::{
    CommandDescriptor, CommandError, CommandExecutor, CommandHandler, CommandParser,
    CommandRegistry, CommandResult, CommandSet, CommandType, DenialDisclosure, EffectiveSet,
    ExecutionContext, HandlerError, MergeType,
};
pub use config::{CampusConfig, ConfigError, ConfigLoader};
pub use protocol::{CommandRequest, CommandResponse, InteractiveSession, SingleShotAdapter};
pub use server::{CampusEngine, Server, ServerError, ShutdownHandle};
pub use session::{SessionInfo, SessionManager};

// Principal is part of the public API.
pub use campus_types::Principal;
