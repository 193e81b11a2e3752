//! Command descriptors.

use super::error::RegistryError;
use super::handler::CommandHandler;
use campus_auth::{AccessLevel, Permission, Requirement, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Broad classification of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// Shell and account utilities (help, time, quit).
    #[default]
    System,
    /// In-world actions.
    Game,
    /// Operator tooling.
    Admin,
}

impl CommandType {
    /// Lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Game => "game",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable metadata for one invocable operation.
///
/// Keys and aliases are stored lower-cased; lookup is case-insensitive.
///
/// # Example
///
/// ```
/// use campus_runtime::command::{CommandDescriptor, CommandResult, CommandType, ExecutionContext};
/// use campus_auth::Role;
///
/// let kick = CommandDescriptor::new("Kick", |_: &mut ExecutionContext, _: &[String], args: &str| {
///     Ok(CommandResult::ok(format!("kicked {args}")))
/// })
/// .expect("key is valid")
/// .with_alias("boot")
/// .with_description("Disconnect a user")
/// .with_type(CommandType::Admin)
/// .with_role(Role::Moderator);
///
/// assert_eq!(kick.key(), "kick");
/// assert!(kick.matches_alias("BOOT"));
/// assert_eq!(kick.requirement().role, Some(Role::Moderator));
/// ```
#[derive(Clone)]
pub struct CommandDescriptor {
    key: String,
    aliases: Vec<String>,
    description: String,
    usage: Option<String>,
    category: String,
    command_type: CommandType,
    requirement: Requirement,
    handler: Arc<dyn CommandHandler>,
}

impl CommandDescriptor {
    /// Default category for descriptors that do not set one.
    pub const DEFAULT_CATEGORY: &'static str = "general";

    /// Creates a descriptor with the given key and handler.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidKey`] if the key is empty or
    /// contains whitespace.
    pub fn new(key: &str, handler: impl CommandHandler + 'static) -> Result<Self, RegistryError> {
        Self::with_shared_handler(key, Arc::new(handler))
    }

    /// Like [`new`](Self::new) but reuses an already shared handler.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidKey`] for an empty or spaced key.
    pub fn with_shared_handler(
        key: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<Self, RegistryError> {
        let key = normalize_name(key).ok_or_else(|| RegistryError::InvalidKey(key.to_string()))?;
        Ok(Self {
            key,
            aliases: Vec::new(),
            description: String::new(),
            usage: None,
            category: Self::DEFAULT_CATEGORY.to_string(),
            command_type: CommandType::default(),
            requirement: Requirement::none(),
            handler,
        })
    }

    /// Adds an alias. Invalid or duplicate aliases, and the key itself,
    /// are ignored.
    #[must_use]
    pub fn with_alias(mut self, alias: &str) -> Self {
        if let Some(alias) = normalize_name(alias) {
            if alias != self.key && !self.aliases.contains(&alias) {
                self.aliases.push(alias);
            }
        }
        self
    }

    /// Adds several aliases.
    #[must_use]
    pub fn with_aliases<'a>(self, aliases: impl IntoIterator<Item = &'a str>) -> Self {
        aliases.into_iter().fold(self, Self::with_alias)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_type(mut self, command_type: CommandType) -> Self {
        self.command_type = command_type;
        self
    }

    /// Requires a permission token.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<Permission>) -> Self {
        self.requirement.permission = Some(permission.into());
        self
    }

    /// Requires a minimum role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.requirement.role = Some(role);
        self
    }

    /// Requires a minimum access level.
    #[must_use]
    pub fn with_access_level(mut self, level: AccessLevel) -> Self {
        self.requirement.access_level = Some(level);
        self
    }

    /// Replaces the whole requirement.
    #[must_use]
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    #[must_use]
    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }

    /// Returns `true` if `name` equals one of the aliases (case-insensitive).
    #[must_use]
    pub fn matches_alias(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.aliases.iter().any(|a| *a == name)
    }

    /// Key followed by aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Returns `true` if key or any alias equals `name`.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Drops the given aliases. Used when a later descriptor overrides them.
    pub(crate) fn strip_aliases(&mut self, names: &[String]) {
        self.aliases.retain(|a| !names.contains(a));
    }

    /// Appends aliases not already present. Used by `Extend` merging.
    pub(crate) fn absorb_aliases(&mut self, other: &CommandDescriptor) {
        for alias in other.names() {
            if alias != self.key && !self.aliases.iter().any(|a| a == alias) {
                self.aliases.push(alias.to_string());
            }
        }
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("key", &self.key)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("command_type", &self.command_type)
            .field("requirement", &self.requirement)
            .finish_non_exhaustive()
    }
}

/// Lower-cases and validates a command name.
fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return None;
    }
    Some(name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandResult, ExecutionContext, HandlerError};

    fn noop(
        _: &mut ExecutionContext,
        _: &[String],
        _: &str,
    ) -> Result<CommandResult, HandlerError> {
        Ok(CommandResult::ok(""))
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            CommandDescriptor::new("", noop),
            Err(RegistryError::InvalidKey(_))
        ));
        assert!(CommandDescriptor::new("   ", noop).is_err());
        assert!(CommandDescriptor::new("two words", noop).is_err());
    }

    #[test]
    fn key_and_aliases_are_lowercased() {
        let d = CommandDescriptor::new("LOOK", noop)
            .expect("valid key")
            .with_aliases(["L", "Examine"]);
        assert_eq!(d.key(), "look");
        assert_eq!(d.aliases(), ["l", "examine"]);
        assert!(d.matches_alias("EXAMINE"));
    }

    #[test]
    fn alias_equal_to_key_or_duplicate_is_ignored() {
        let d = CommandDescriptor::new("look", noop)
            .expect("valid key")
            .with_aliases(["look", "l", "l", ""]);
        assert_eq!(d.aliases(), ["l"]);
    }

    #[test]
    fn names_lists_key_first() {
        let d = CommandDescriptor::new("quit", noop)
            .expect("valid key")
            .with_aliases(["exit", "q"]);
        assert_eq!(d.names().collect::<Vec<_>>(), ["quit", "exit", "q"]);
        assert!(d.answers_to("q"));
        assert!(!d.answers_to("qu"));
    }

    #[test]
    fn absorb_and_strip_aliases() {
        let mut a = CommandDescriptor::new("look", noop)
            .expect("valid key")
            .with_alias("l");
        let b = CommandDescriptor::new("look", noop)
            .expect("valid key")
            .with_aliases(["l", "see"]);
        a.absorb_aliases(&b);
        assert_eq!(a.aliases(), ["l", "see"]);

        a.strip_aliases(&["l".to_string()]);
        assert_eq!(a.aliases(), ["see"]);
    }

    #[test]
    fn defaults() {
        let d = CommandDescriptor::new("x", noop).expect("valid key");
        assert_eq!(d.category(), CommandDescriptor::DEFAULT_CATEGORY);
        assert_eq!(d.command_type(), CommandType::System);
        assert!(d.requirement().is_unrestricted());
        assert!(d.usage().is_none());
    }
}
