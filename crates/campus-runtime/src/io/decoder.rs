//! Byte-level key decoder.
//!
//! Turns the raw byte stream of a terminal connection into [`Key`]s.
//!
//! # States
//!
//! ```text
//!            ESC                 '[' or 'O'
//! Normal ─────────► EscapeSeen ─────────────► CsiSeen
//!   ▲                   │ other byte              │ final byte (0x40..=0x7E)
//!   │                   ▼                         │
//!   └──── drop ESC, reprocess byte ◄──────────────┘
//! ```
//!
//! Telnet clients send CR LF or CR NUL for Enter; the byte after a CR is
//! swallowed so that one key press submits once. Multi-byte UTF-8
//! characters are assembled in `Normal`; malformed sequences are dropped.

/// Maximum parameter bytes kept for one CSI sequence.
const MAX_CSI_PARAMS: usize = 8;

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    /// `0x7F` or `0x08`.
    Backspace,
    /// Delete under the cursor (`ESC [ 3 ~`).
    Delete,
    Tab,
    /// Ctrl+C.
    Interrupt,
    /// Ctrl+D.
    Eof,
    Up,
    Down,
    Left,
    Right,
    /// Ctrl+A, Home.
    Home,
    /// Ctrl+E, End.
    End,
    /// Ctrl+K.
    KillToEnd,
    /// Ctrl+U.
    KillToStart,
    /// Ctrl+W.
    KillWord,
    /// Ctrl+L.
    ClearScreen,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum State {
    #[default]
    Normal,
    EscapeSeen,
    CsiSeen {
        params: String,
        /// Parameters exceeded the cap; the sequence is consumed and ignored.
        overflow: bool,
    },
}

/// Finite state machine over input bytes.
///
/// # Example
///
/// ```
/// use campus_runtime::io::{Key, KeyDecoder};
///
/// let mut decoder = KeyDecoder::new();
/// let keys = decoder.feed(b"hi\x1b[A\r\n");
/// assert_eq!(keys, [Key::Char('h'), Key::Char('i'), Key::Up, Key::Enter]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyDecoder {
    state: State,
    after_cr: bool,
    utf8: Vec<u8>,
    utf8_len: usize,
}

impl KeyDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a chunk of bytes.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Key> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Decodes one byte; `None` while a sequence is incomplete or the byte
    /// carries no key.
    pub fn push(&mut self, byte: u8) -> Option<Key> {
        match std::mem::take(&mut self.state) {
            State::Normal => self.normal(byte),
            State::EscapeSeen => self.escape(byte),
            State::CsiSeen { params, overflow } => self.csi(params, overflow, byte),
        }
    }

    /// Returns `true` if no sequence is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == State::Normal && self.utf8.is_empty()
    }

    /// Abandons any partial sequence.
    pub fn reset(&mut self) {
        self.state = State::Normal;
        self.after_cr = false;
        self.utf8.clear();
        self.utf8_len = 0;
    }

    fn normal(&mut self, byte: u8) -> Option<Key> {
        let after_cr = std::mem::replace(&mut self.after_cr, false);
        if after_cr && (byte == b'\n' || byte == 0) {
            return None;
        }

        if byte >= 0x80 {
            return self.utf8_byte(byte);
        }
        // An ASCII byte in the middle of a multi-byte character is malformed.
        self.utf8.clear();

        match byte {
            0x1b => {
                self.state = State::EscapeSeen;
                None
            }
            b'\r' => {
                self.after_cr = true;
                Some(Key::Enter)
            }
            b'\n' => Some(Key::Enter),
            0x7f | 0x08 => Some(Key::Backspace),
            b'\t' => Some(Key::Tab),
            0x03 => Some(Key::Interrupt),
            0x04 => Some(Key::Eof),
            0x01 => Some(Key::Home),
            0x05 => Some(Key::End),
            0x02 => Some(Key::Left),
            0x06 => Some(Key::Right),
            0x10 => Some(Key::Up),
            0x0e => Some(Key::Down),
            0x0b => Some(Key::KillToEnd),
            0x15 => Some(Key::KillToStart),
            0x17 => Some(Key::KillWord),
            0x0c => Some(Key::ClearScreen),
            0x20..=0x7e => Some(Key::Char(char::from(byte))),
            _ => None,
        }
    }

    fn escape(&mut self, byte: u8) -> Option<Key> {
        match byte {
            b'[' | b'O' => {
                self.state = State::CsiSeen {
                    params: String::new(),
                    overflow: false,
                };
                None
            }
            // Lone ESC: drop it and treat the byte as ordinary input.
            _ => self.normal(byte),
        }
    }

    fn csi(&mut self, mut params: String, overflow: bool, byte: u8) -> Option<Key> {
        match byte {
            0x20..=0x3f => {
                let overflow = overflow || params.len() >= MAX_CSI_PARAMS;
                if !overflow {
                    params.push(char::from(byte));
                }
                self.state = State::CsiSeen { params, overflow };
                None
            }
            0x40..=0x7e if overflow => None,
            0x40..=0x7e => match (byte, params.as_str()) {
                (b'A', _) => Some(Key::Up),
                (b'B', _) => Some(Key::Down),
                (b'C', _) => Some(Key::Right),
                (b'D', _) => Some(Key::Left),
                (b'H', _) => Some(Key::Home),
                (b'F', _) => Some(Key::End),
                (b'~', "1" | "7") => Some(Key::Home),
                (b'~', "4" | "8") => Some(Key::End),
                (b'~', "3") => Some(Key::Delete),
                _ => None,
            },
            // A control byte aborts the sequence and is handled normally.
            _ => self.normal(byte),
        }
    }

    fn utf8_byte(&mut self, byte: u8) -> Option<Key> {
        if self.utf8.is_empty() {
            self.utf8_len = match byte {
                0xc2..=0xdf => 2,
                0xe0..=0xef => 3,
                0xf0..=0xf4 => 4,
                _ => return None,
            };
            self.utf8.push(byte);
            return None;
        }

        if byte & 0xc0 != 0x80 {
            // Not a continuation byte: drop the partial char, restart here.
            self.utf8.clear();
            return self.utf8_byte(byte);
        }

        self.utf8.push(byte);
        if self.utf8.len() < self.utf8_len {
            return None;
        }
        let bytes = std::mem::take(&mut self.utf8);
        std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .map(Key::Char)
    }
}
