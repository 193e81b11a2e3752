//! Terminal I/O for interactive sessions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  bytes   ┌────────────┐  Key   ┌────────────┐
//! │  connection  │ ───────► │ KeyDecoder │ ─────► │ LineEditor │
//! └──────────────┘          └────────────┘        └─────┬──────┘
//!        ▲                                              │ EditAction
//!        │ echo / output bytes (screen)                 ▼
//!        └──────────────────────────────────── InteractiveSession
//! ```
//!
//! # Module Structure
//!
//! - [`KeyDecoder`]: byte stream to [`Key`]s, including escape sequences
//! - [`LineEditor`]: buffer, cursor, history walk and tab completion
//! - [`CommandHistory`]: bounded list of submitted lines
//! - [`Prompt`]: `[user@HH:MM:SS] label> `
//! - [`screen`]: terminal control sequences

mod decoder;
mod editor;
mod history;
mod prompt;
pub mod screen;

pub use decoder::{Key, KeyDecoder};
pub use editor::{Completer, EditAction, LineEditor};
pub use history::{CommandHistory, DEFAULT_HISTORY_SIZE};
pub use prompt::{Prompt, CURRENT_GAME_KEY, DEFAULT_CONTEXT_LABEL};
