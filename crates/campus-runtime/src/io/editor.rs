//! Character-level line editor.
//!
//! [`LineEditor`] owns the buffer, cursor, history navigation and tab
//! completion state of one interactive session. It consumes [`Key`]s and
//! appends the terminal bytes that keep the remote screen in sync.
//!
//! | Key | Effect |
//! |-----|--------|
//! | printable | insert at cursor |
//! | Backspace / Delete | remove before / under cursor |
//! | Enter | submit non-empty line |
//! | Ctrl+C | discard line |
//! | Ctrl+D | disconnect |
//! | Tab | complete token at cursor, cycling on repeat |
//! | Up / Down | walk history, restoring the in-progress line |
//! | Ctrl+A / Ctrl+E | start / end of line |
//! | Ctrl+K / Ctrl+U / Ctrl+W | kill to end / to start / previous word |
//! | Ctrl+L | clear screen |

use super::decoder::{Key, KeyDecoder};
use crate::command::EffectiveSet;
use super::history::CommandHistory;
use super::screen;

/// Source of tab-completion candidates.
pub trait Completer {
    /// Names starting with `prefix`, sorted.
    fn complete(&self, prefix: &str) -> Vec<String>;
}

impl Completer for [String] {
    fn complete(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        let mut out: Vec<String> = self
            .iter()
            .filter(|name| name.starts_with(&prefix))
            .cloned()
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

impl Completer for Vec<String> {
    fn complete(&self, prefix: &str) -> Vec<String> {
        self.as_slice().complete(prefix)
    }
}

/// Completes command keys and aliases visible in the set.
impl Completer for EffectiveSet {
    fn complete(&self, prefix: &str) -> Vec<String> {
        self.completion_names().complete(prefix)
    }
}

/// What the session should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// Run this line.
    Submit(String),
    /// Empty Enter: show a fresh prompt.
    Reprompt,
    /// Input discarded with Ctrl+C: show a fresh prompt.
    Cancel,
    /// Ctrl+D: close the session.
    Disconnect,
}

#[derive(Debug, Clone)]
struct Completion {
    candidates: Vec<String>,
    index: usize,
    start: usize,
}

/// Line editor state for one session.
///
/// # Example
///
/// ```
/// use campus_runtime::io::{EditAction, LineEditor};
///
/// let names: Vec<String> = vec!["help".into(), "history".into()];
/// let mut editor = LineEditor::new(10);
/// let mut out = Vec::new();
///
/// let actions = editor.feed(b"hepl\x7f\x7flp\r", &names, &mut out);
/// assert_eq!(actions, [EditAction::Submit("help".into())]);
/// ```
#[derive(Debug, Clone)]
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
    decoder: KeyDecoder,
    history: CommandHistory,
    nav: Option<usize>,
    saved: Option<Vec<char>>,
    completion: Option<Completion>,
    prompt: String,
}

impl LineEditor {
    /// Editor remembering up to `history_size` lines.
    #[must_use]
    pub fn new(history_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
            decoder: KeyDecoder::new(),
            history: CommandHistory::new(history_size),
            nav: None,
            saved: None,
            completion: None,
            prompt: String::new(),
        }
    }

    /// Prompt used when redrawing.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Current buffer contents.
    #[must_use]
    pub fn buffer(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Cursor position in characters.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    /// Decodes one byte into a key, if complete.
    pub fn decode(&mut self, byte: u8) -> Option<Key> {
        self.decoder.push(byte)
    }

    /// Decodes and applies a chunk of bytes. Convenience for callers that
    /// do not need to act between keys.
    pub fn feed(
        &mut self,
        bytes: &[u8],
        completer: &dyn Completer,
        out: &mut Vec<u8>,
    ) -> Vec<EditAction> {
        let mut actions = Vec::new();
        for &byte in bytes {
            if let Some(key) = self.decode(byte) {
                actions.extend(self.apply(key, completer, out));
            }
        }
        actions
    }

    /// Applies one key, writing echo bytes to `out`.
    pub fn apply(
        &mut self,
        key: Key,
        completer: &dyn Completer,
        out: &mut Vec<u8>,
    ) -> Option<EditAction> {
        if key != Key::Tab {
            self.completion = None;
        }

        match key {
            Key::Char(c) => self.insert(c, out),
            Key::Backspace => self.backspace(out),
            Key::Delete => self.delete(out),
            Key::Enter => return Some(self.submit(out)),
            Key::Interrupt => {
                out.extend_from_slice(b"^C");
                out.extend_from_slice(screen::NEWLINE);
                self.clear_line();
                return Some(EditAction::Cancel);
            }
            Key::Eof => {
                out.extend_from_slice(screen::NEWLINE);
                return Some(EditAction::Disconnect);
            }
            Key::Tab => self.complete(completer, out),
            Key::Up => self.history_prev(out),
            Key::Down => self.history_next(out),
            Key::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    out.extend_from_slice(screen::CURSOR_LEFT);
                }
            }
            Key::Right => {
                if self.cursor < self.buffer.len() {
                    self.cursor += 1;
                    out.extend_from_slice(screen::CURSOR_RIGHT);
                }
            }
            Key::Home => {
                self.cursor = 0;
                self.redraw(out);
            }
            Key::End => {
                self.cursor = self.buffer.len();
                self.redraw(out);
            }
            Key::KillToEnd => {
                self.buffer.truncate(self.cursor);
                self.redraw(out);
            }
            Key::KillToStart => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
                self.redraw(out);
            }
            Key::KillWord => self.kill_word(out),
            Key::ClearScreen => {
                out.extend_from_slice(screen::CLEAR_SCREEN);
                self.redraw(out);
            }
        }
        None
    }

    /// Writes the prompt and any buffered text on a fresh line.
    pub fn render_prompt(&self, out: &mut Vec<u8>) {
        self.redraw(out);
    }

    fn insert(&mut self, c: char, out: &mut Vec<u8>) {
        self.buffer.insert(self.cursor, c);
        self.cursor += 1;
        if self.cursor == self.buffer.len() {
            let mut bytes = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut bytes).as_bytes());
        } else {
            self.redraw(out);
        }
    }

    fn backspace(&mut self, out: &mut Vec<u8>) {
        if self.cursor == 0 {
            out.extend_from_slice(screen::BELL);
            return;
        }
        self.cursor -= 1;
        self.buffer.remove(self.cursor);
        if self.cursor == self.buffer.len() {
            out.extend_from_slice(screen::RUBOUT);
        } else {
            self.redraw(out);
        }
    }

    fn delete(&mut self, out: &mut Vec<u8>) {
        if self.cursor >= self.buffer.len() {
            out.extend_from_slice(screen::BELL);
            return;
        }
        self.buffer.remove(self.cursor);
        self.redraw(out);
    }

    fn submit(&mut self, out: &mut Vec<u8>) -> EditAction {
        out.extend_from_slice(screen::NEWLINE);
        let line = self.buffer();
        self.clear_line();
        if line.trim().is_empty() {
            EditAction::Reprompt
        } else {
            EditAction::Submit(line)
        }
    }

    fn clear_line(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.nav = None;
        self.saved = None;
        self.completion = None;
    }

    fn kill_word(&mut self, out: &mut Vec<u8>) {
        let mut start = self.cursor;
        while start > 0 && self.buffer[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !self.buffer[start - 1].is_whitespace() {
            start -= 1;
        }
        self.buffer.drain(start..self.cursor);
        self.cursor = start;
        self.redraw(out);
    }

    fn complete(&mut self, completer: &dyn Completer, out: &mut Vec<u8>) {
        if let Some(mut completion) = self.completion.take() {
            completion.index = (completion.index + 1) % completion.candidates.len();
            let replacement = completion.candidates[completion.index].clone();
            self.replace_token(completion.start, &replacement, out);
            self.completion = Some(completion);
            return;
        }

        let start = self.token_start();
        let prefix: String = self.buffer[start..self.cursor].iter().collect();
        if prefix.is_empty() {
            out.extend_from_slice(screen::BELL);
            return;
        }
        let candidates = completer.complete(&prefix);
        let Some(first) = candidates.first().cloned() else {
            out.extend_from_slice(screen::BELL);
            return;
        };
        self.replace_token(start, &first, out);
        self.completion = Some(Completion {
            candidates,
            index: 0,
            start,
        });
    }

    /// Start of the whitespace-delimited token ending at the cursor.
    fn token_start(&self) -> usize {
        self.buffer[..self.cursor]
            .iter()
            .rposition(|c| c.is_whitespace())
            .map_or(0, |i| i + 1)
    }

    fn replace_token(&mut self, start: usize, text: &str, out: &mut Vec<u8>) {
        let replacement: Vec<char> = text.chars().collect();
        let len = replacement.len();
        self.buffer.splice(start..self.cursor, replacement);
        self.cursor = start + len;
        self.redraw(out);
    }

    fn history_prev(&mut self, out: &mut Vec<u8>) {
        let index = match self.nav {
            None if self.history.is_empty() => None,
            None => {
                self.saved = Some(self.buffer.clone());
                Some(self.history.len() - 1)
            }
            Some(0) => None,
            Some(i) => Some(i - 1),
        };
        match index {
            Some(i) => self.load_history(i, out),
            None => out.extend_from_slice(screen::BELL),
        }
    }

    fn history_next(&mut self, out: &mut Vec<u8>) {
        match self.nav {
            None => out.extend_from_slice(screen::BELL),
            Some(i) if i + 1 < self.history.len() => self.load_history(i + 1, out),
            Some(_) => {
                self.nav = None;
                self.buffer = self.saved.take().unwrap_or_default();
                self.cursor = self.buffer.len();
                self.redraw(out);
            }
        }
    }

    fn load_history(&mut self, index: usize, out: &mut Vec<u8>) {
        let Some(entry) = self.history.get(index) else {
            out.extend_from_slice(screen::BELL);
            return;
        };
        self.buffer = entry.chars().collect();
        self.cursor = self.buffer.len();
        self.nav = Some(index);
        self.redraw(out);
    }

    fn redraw(&self, out: &mut Vec<u8>) {
        let text = self.buffer();
        screen::redraw(out, &self.prompt, &text, self.buffer.len() - self.cursor);
    }
}
