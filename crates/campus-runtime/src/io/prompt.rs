//! Interactive prompt.

use crate::command::ExecutionContext;
use chrono::{Local, NaiveTime};

/// Default context label shown in the prompt.
pub const DEFAULT_CONTEXT_LABEL: &str = "campusworld";

/// Game-state key whose string value replaces the default label.
pub const CURRENT_GAME_KEY: &str = "current_game";

/// Renders `[<username>@<HH:MM:SS>] <label>> `.
///
/// # Example
///
/// ```
/// use campus_runtime::command::ExecutionContext;
/// use campus_runtime::io::Prompt;
/// use chrono::NaiveTime;
/// use serde_json::json;
///
/// let prompt = Prompt::default();
/// let at = NaiveTime::from_hms_opt(9, 5, 7).expect("valid time");
///
/// let ctx = ExecutionContext::guest();
/// assert_eq!(prompt.render_at(&ctx, at), "[guest@09:05:07] campusworld> ");
///
/// let ctx = ctx.with_state("current_game", json!("chess"));
/// assert_eq!(prompt.render_at(&ctx, at), "[guest@09:05:07] chess> ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    default_label: String,
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_LABEL)
    }
}

impl Prompt {
    #[must_use]
    pub fn new(default_label: impl Into<String>) -> Self {
        Self {
            default_label: default_label.into(),
        }
    }

    /// Label for `ctx`: the current game if set, else the default.
    #[must_use]
    pub fn label<'a>(&'a self, ctx: &'a ExecutionContext) -> &'a str {
        ctx.state(CURRENT_GAME_KEY)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_label)
    }

    /// Renders with the local wall-clock time.
    #[must_use]
    pub fn render(&self, ctx: &ExecutionContext) -> String {
        self.render_at(ctx, Local::now().time())
    }

    #[must_use]
    pub fn render_at(&self, ctx: &ExecutionContext, at: NaiveTime) -> String {
        format!(
            "[{}@{}] {}> ",
            ctx.username(),
            at.format("%H:%M:%S"),
            self.label(ctx)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn custom_default_label() {
        let prompt = Prompt::new("lab");
        let at = NaiveTime::from_hms_opt(23, 59, 0).expect("valid time");
        assert_eq!(
            prompt.render_at(&ExecutionContext::guest(), at),
            "[guest@23:59:00] lab> "
        );
    }

    #[test]
    fn non_string_or_empty_game_falls_back() {
        let prompt = Prompt::default();
        let ctx = ExecutionContext::guest().with_state(CURRENT_GAME_KEY, json!(7));
        assert_eq!(prompt.label(&ctx), DEFAULT_CONTEXT_LABEL);
        let ctx = ExecutionContext::guest().with_state(CURRENT_GAME_KEY, json!(""));
        assert_eq!(prompt.label(&ctx), DEFAULT_CONTEXT_LABEL);
    }
}
