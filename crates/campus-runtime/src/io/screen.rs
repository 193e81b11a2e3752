//! Terminal output primitives.
//!
//! Every line written through [`write_line`] starts with `\r` and ends
//! with `\r\n`, so output stays left-aligned whatever column the cursor
//! drifted to.

/// Audible bell.
pub const BELL: &[u8] = b"\x07";
/// Erase from cursor to end of line.
pub const ERASE_TO_END: &[u8] = b"\x1b[K";
/// Clear the screen and home the cursor.
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J\x1b[H";
/// Move back one column, blank it, move back again.
pub const RUBOUT: &[u8] = b"\x08 \x08";
pub const CURSOR_LEFT: &[u8] = b"\x1b[D";
pub const CURSOR_RIGHT: &[u8] = b"\x1b[C";
pub const NEWLINE: &[u8] = b"\r\n";

/// Writes `text` line by line, each anchored at column zero.
///
/// ```
/// use campus_runtime::io::screen;
///
/// let mut out = Vec::new();
/// screen::write_line(&mut out, "one\ntwo");
/// assert_eq!(out, b"\rone\r\n\rtwo\r\n");
/// ```
pub fn write_line(out: &mut Vec<u8>, text: &str) {
    for line in text.split('\n') {
        out.push(b'\r');
        out.extend_from_slice(line.trim_end_matches('\r').as_bytes());
        out.extend_from_slice(NEWLINE);
    }
}

/// Redraws prompt and buffer on the current line and places the cursor
/// `back` characters from the end.
pub fn redraw(out: &mut Vec<u8>, prompt: &str, buffer: &str, back: usize) {
    out.push(b'\r');
    out.extend_from_slice(prompt.as_bytes());
    out.extend_from_slice(buffer.as_bytes());
    out.extend_from_slice(ERASE_TO_END);
    if back > 0 {
        out.extend_from_slice(format!("\x1b[{back}D").as_bytes());
    }
}
