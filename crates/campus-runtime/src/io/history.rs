//! Bounded command history.

use std::collections::VecDeque;

/// Default number of remembered lines.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Submitted lines, oldest first, bounded in length.
///
/// Blank lines and immediate repeats are not stored. When full, the
/// oldest line is dropped.
///
/// # Example
///
/// ```
/// use campus_runtime::io::CommandHistory;
///
/// let mut history = CommandHistory::new(2);
/// history.push("look");
/// history.push("look");
/// history.push("help");
/// history.push("quit");
///
/// assert_eq!(history.entries().collect::<Vec<_>>(), ["help", "quit"]);
/// ```
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl CommandHistory {
    /// History holding at most `capacity` lines.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_SIZE)),
            capacity,
        }
    }

    /// Appends a line. Returns `false` if it was not stored.
    pub fn push(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() || self.capacity == 0 {
            return false;
        }
        if self.entries.back().is_some_and(|last| last == line) {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
        true
    }

    /// Entry by position, 0 being the oldest.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
