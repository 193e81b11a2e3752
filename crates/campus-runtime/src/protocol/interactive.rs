//! Interactive line-session adapter.
//!
//! Bytes in, bytes out. The adapter owns the session's line editor and
//! execution context; the connection task only moves bytes and watches for
//! close.
//!
//! ```text
//! feed(bytes) ─► LineEditor ─► EditAction
//!                                 │
//!        Submit(line) ────────────┼──► CommandExecutor ─► results ─► write_line
//!        Reprompt / Cancel ───────┼──► prompt
//!        Disconnect ──────────────┴──► closed
//! ```

use crate::command::{CommandExecutor, ExecutionContext};
use crate::io::{screen, EditAction, Key, LineEditor, Prompt, DEFAULT_HISTORY_SIZE};
use std::sync::Arc;

/// Notice written after Ctrl+C.
pub const CANCELLED_NOTICE: &str = "Input cancelled.";

/// Notice written after Ctrl+D.
pub const DISCONNECT_NOTICE: &str = "Goodbye.";

/// One interactive session.
///
/// # Example
///
/// ```
/// use campus_runtime::command::{builtin, CommandExecutor, CommandRegistry, ExecutionContext};
/// use campus_runtime::protocol::InteractiveSession;
/// use campus_runtime::session::SessionManager;
/// use std::sync::Arc;
///
/// let registry = Arc::new(CommandRegistry::new());
/// builtin::install(&registry, Arc::new(SessionManager::new(8))).unwrap();
/// let executor = Arc::new(CommandExecutor::new(registry));
///
/// let mut session = InteractiveSession::new(executor, ExecutionContext::guest());
/// let out = session.feed(b"quit\r");
///
/// assert!(String::from_utf8_lossy(&out).contains("Goodbye, guest!"));
/// assert!(session.is_closed());
/// ```
#[derive(Debug)]
pub struct InteractiveSession {
    executor: Arc<CommandExecutor>,
    editor: LineEditor,
    ctx: ExecutionContext,
    prompt: Prompt,
    closed: bool,
}

impl InteractiveSession {
    #[must_use]
    pub fn new(executor: Arc<CommandExecutor>, ctx: ExecutionContext) -> Self {
        Self {
            executor,
            editor: LineEditor::new(DEFAULT_HISTORY_SIZE),
            ctx,
            prompt: Prompt::default(),
            closed: false,
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: Prompt) -> Self {
        self.prompt = prompt;
        self
    }

    #[must_use]
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.editor = LineEditor::new(size);
        self
    }

    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }

    #[must_use]
    pub fn editor(&self) -> &LineEditor {
        &self.editor
    }

    /// Returns `true` once the caller quit or disconnected.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Banner lines followed by the first prompt.
    pub fn greeting(&mut self, banner: &str) -> Vec<u8> {
        let mut out = Vec::new();
        if !banner.is_empty() {
            screen::write_line(&mut out, banner);
        }
        self.write_prompt(&mut out);
        out
    }

    /// Consumes input bytes and returns what to send back.
    ///
    /// Bytes after the session closes are ignored.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for &byte in bytes {
            if self.closed {
                break;
            }
            let Some(key) = self.editor.decode(byte) else {
                continue;
            };
            let action = if key == Key::Tab {
                let visible = self.executor.visible_set(&self.ctx);
                self.editor.apply(key, &visible, &mut out)
            } else {
                self.editor.apply(key, &Vec::<String>::new(), &mut out)
            };
            if let Some(action) = action {
                self.handle(action, &mut out);
            }
        }
        out
    }

    fn handle(&mut self, action: EditAction, out: &mut Vec<u8>) {
        match action {
            EditAction::Submit(line) => {
                let results =
                    self.executor
                        .execute_interactive(&line, &mut self.ctx, self.editor.history_mut());
                for result in &results {
                    let text = result.display_text();
                    if !text.is_empty() {
                        screen::write_line(out, text);
                    }
                }
                for line in self.ctx.take_output() {
                    screen::write_line(out, &line);
                }
                if self.ctx.exit_requested() {
                    self.closed = true;
                    return;
                }
                self.write_prompt(out);
            }
            EditAction::Reprompt => self.write_prompt(out),
            EditAction::Cancel => {
                screen::write_line(out, CANCELLED_NOTICE);
                self.write_prompt(out);
            }
            EditAction::Disconnect => {
                screen::write_line(out, DISCONNECT_NOTICE);
                self.ctx.request_exit();
                self.closed = true;
            }
        }
    }

    fn write_prompt(&mut self, out: &mut Vec<u8>) {
        self.editor.set_prompt(self.prompt.render(&self.ctx));
        self.editor.render_prompt(out);
    }
}
