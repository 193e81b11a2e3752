//! Command line parser.
//!
//! ```text
//! line       := invocation (SEP invocation)*
//! invocation := key (WS switch)* (WS argstring)?
//! switch     := '-' char | '--' word
//! ```
//!
//! | Input | key | switches | args |
//! |-------|-----|----------|------|
//! | `look -v sword` | `look` | `-v` | `sword` |
//! | `say   hello    there` | `say` | | `hello there` |
//! | `give -q --all  bread` | `give` | `-q`, `--all` | `bread` |
//! | `page bob -urgent` | `page` | | `bob -urgent` |
//!
//! Switch tokens are only collected directly after the key. Unknown
//! switches are passed through; the handler decides what to do with them.

use super::error::ParseError;
use serde::{Deserialize, Serialize};

/// Default separator between invocations on one line.
pub const DEFAULT_SEPARATOR: char = ';';

/// One parsed command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// The invocation text as written, trimmed.
    pub raw: String,
    /// Command name candidate, case preserved.
    pub key: String,
    pub switches: Vec<String>,
    /// Remaining tokens joined by single spaces.
    pub args: String,
}

/// Stateless parser splitting a line into [`Invocation`]s.
///
/// # Example
///
/// ```
/// use campus_runtime::command::CommandParser;
///
/// let parser = CommandParser::default();
/// let invocations = parser.parse("look -v sword; help").expect("valid line");
///
/// assert_eq!(invocations.len(), 2);
/// assert_eq!(invocations[0].key, "look");
/// assert_eq!(invocations[0].switches, ["-v"]);
/// assert_eq!(invocations[0].args, "sword");
/// assert_eq!(invocations[1].key, "help");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandParser {
    separator: char,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl CommandParser {
    #[must_use]
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Parses `line` into invocations, in order.
    ///
    /// Blank segments are skipped, so an empty line yields no invocations.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingKey`] if any invocation starts with a
    /// switch. The whole line is rejected in that case.
    pub fn parse(&self, line: &str) -> Result<Vec<Invocation>, ParseError> {
        line.split(self.separator)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(parse_invocation)
            .collect()
    }
}

fn parse_invocation(raw: &str) -> Result<Invocation, ParseError> {
    let mut tokens = raw.split_whitespace();
    let key = tokens.next().unwrap_or_default();
    if key.starts_with('-') {
        return Err(ParseError::MissingKey {
            token: key.to_string(),
        });
    }

    let mut switches = Vec::new();
    let mut rest = Vec::new();
    for token in tokens {
        if rest.is_empty() && is_switch(token) {
            switches.push(token.to_string());
        } else {
            rest.push(token);
        }
    }

    Ok(Invocation {
        raw: raw.to_string(),
        key: key.to_string(),
        switches,
        args: rest.join(" "),
    })
}

/// `-x` (one character) or `--word`.
fn is_switch(token: &str) -> bool {
    if let Some(word) = token.strip_prefix("--") {
        return !word.is_empty() && !word.starts_with('-');
    }
    match token.strip_prefix('-') {
        Some(flag) => {
            let mut chars = flag.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c != '-')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Vec<Invocation> {
        CommandParser::default().parse(line).expect("line should parse")
    }

    #[test]
    fn single_invocation_with_switch() {
        let inv = parse("look -v sword");
        assert_eq!(inv.len(), 1);
        assert_eq!(inv[0].key, "look");
        assert_eq!(inv[0].switches, ["-v"]);
        assert_eq!(inv[0].args, "sword");
        assert_eq!(inv[0].raw, "look -v sword");
    }

    #[test]
    fn separator_splits_in_order() {
        let inv = parse("look; help");
        let keys: Vec<_> = inv.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, ["look", "help"]);
    }

    #[test]
    fn empty_and_blank_lines_yield_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
        assert!(parse(" ; ;; ").is_empty());
    }

    #[test]
    fn args_are_rejoined_with_single_spaces() {
        let inv = parse("say   hello    \"big   world\"");
        assert_eq!(inv[0].args, "hello \"big world\"");
    }

    #[test]
    fn switches_stop_at_first_argument() {
        let inv = parse("page -u bob -now");
        assert_eq!(inv[0].switches, ["-u"]);
        assert_eq!(inv[0].args, "bob -now");
    }

    #[test]
    fn long_and_unknown_switches_pass_through() {
        let inv = parse("give --all -q -z bread");
        assert_eq!(inv[0].switches, ["--all", "-q", "-z"]);
        assert_eq!(inv[0].args, "bread");
    }

    #[test]
    fn malformed_switch_shapes_are_arguments() {
        let inv = parse("roll -20 ---x --");
        assert!(inv[0].switches.is_empty());
        assert_eq!(inv[0].args, "-20 ---x --");
    }

    #[test]
    fn only_switches_is_an_error() {
        let err = CommandParser::default().parse("-v").expect_err("no key");
        assert_eq!(err, ParseError::MissingKey { token: "-v".into() });
    }

    #[test]
    fn one_bad_invocation_rejects_the_line() {
        assert!(CommandParser::default().parse("look; --all; help").is_err());
    }

    #[test]
    fn custom_separator() {
        let parser = CommandParser::new('|');
        let inv = parser.parse("look | help; me").expect("line should parse");
        assert_eq!(inv.len(), 2);
        assert_eq!(inv[1].args, "me");
        assert_eq!(inv[1].key, "help;");
    }

    #[test]
    fn key_case_is_preserved() {
        assert_eq!(parse("LOOK")[0].key, "LOOK");
    }

    mod proptest_parser {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn word_lines_round_trip_keys(words in prop::collection::vec("[a-z]{1,8}", 1..6)) {
                let line = words.join(" ; ");
                let inv = CommandParser::default().parse(&line).expect("words always parse");
                let keys: Vec<String> = inv.into_iter().map(|i| i.key).collect();
                prop_assert_eq!(keys, words);
            }

            #[test]
            fn args_never_have_double_spaces(line in "[a-z]{1,5}( {1,3}[a-z-]{1,5}){0,6}") {
                for inv in CommandParser::default().parse(&line).unwrap_or_default() {
                    prop_assert!(!inv.args.contains("  "));
                    prop_assert_eq!(inv.args.trim(), inv.args.as_str());
                }
            }
        }
    }
}
