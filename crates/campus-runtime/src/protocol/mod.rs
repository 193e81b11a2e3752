//! Protocol adapters.
//!
//! Both adapters translate a transport's input into a command line plus an
//! [`ExecutionContext`](crate::command::ExecutionContext) and format the
//! results back out. Neither knows about sockets; the [`server`](crate::server)
//! module moves the bytes.
//!
//! | Adapter | Input | Output | State kept |
//! |---------|-------|--------|------------|
//! | [`InteractiveSession`] | raw terminal bytes | echo, prompt, `\r`-anchored lines | editor, history, context |
//! | [`SingleShotAdapter`] | [`CommandRequest`] JSON | [`CommandResponse`] JSON | none |

mod interactive;
mod single_shot;

pub use interactive::{InteractiveSession, CANCELLED_NOTICE, DISCONNECT_NOTICE};
pub use single_shot::{CommandRequest, CommandResponse, SingleShotAdapter};
