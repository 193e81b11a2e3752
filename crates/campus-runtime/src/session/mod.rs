//! Interactive session bookkeeping.
//!
//! The [`SessionManager`] bounds how many interactive sessions may be
//! connected at once and closes idle ones. It never sees command traffic:
//! each connection task owns its own [`ExecutionContext`] and editor, and
//! only reports activity through [`SessionManager::touch`].
//!
//! ```text
//!  accept ──► register ──► touch … touch ──► remove
//!                │                 │
//!                │ at capacity     │ idle > timeout
//!                ▼                 ▼
//!        oldest closed:     closed: IdleTimeout
//!           Evicted
//! ```
//!
//! [`ExecutionContext`]: crate::command::ExecutionContext

mod manager;
mod transport;

pub use manager::{SessionInfo, SessionManager, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS};
pub use transport::{ChannelTransport, CloseReason, CloseSignal, Transport};
