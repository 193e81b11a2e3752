//! Command sets.
//!
//! A [`CommandSet`] is a named, prioritized bundle of descriptors. The
//! registry folds the sets active for a caller into one
//! [`EffectiveSet`](super::EffectiveSet) using each set's [`MergeType`].

use super::context::ExecutionContext;
use super::descriptor::CommandDescriptor;
use super::error::RegistryError;
use campus_auth::{evaluate, Requirement};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How a set combines with the lower-precedence sets already merged.
///
/// | Merge | Same key below | Different key below |
/// |-------|----------------|---------------------|
/// | `Union` | this set's descriptor wins | kept |
/// | `Replace` | overwritten | kept, minus aliases this set claims |
/// | `Extend` | this set's descriptor wins, aliases accumulate | kept |
/// | `Remove` | deleted | kept |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeType {
    #[default]
    Union,
    Replace,
    Extend,
    Remove,
}

impl fmt::Display for MergeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Union => "union",
            Self::Replace => "replace",
            Self::Extend => "extend",
            Self::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// When a set takes part in a caller's merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Activation {
    /// Always active.
    #[default]
    Always,
    /// Active for callers whose grants satisfy the requirement.
    Requires(Requirement),
    /// Active while the context's game state maps `key` to `value`.
    GameState { key: String, value: Value },
}

impl Activation {
    /// Returns `true` if the set is active for `ctx`.
    #[must_use]
    pub fn holds(&self, ctx: &ExecutionContext) -> bool {
        match self {
            Self::Always => true,
            Self::Requires(requirement) => evaluate(ctx.grants(), requirement).is_ok(),
            Self::GameState { key, value } => ctx.state(key) == Some(value),
        }
    }
}

/// An ordered, named collection of descriptors.
///
/// Inside one set a name (key or alias) belongs to exactly one descriptor.
/// [`add`](Self::add) refuses a clash, [`add_override`](Self::add_override)
/// resolves it in favour of the new descriptor.
///
/// # Example
///
/// ```
/// use campus_runtime::command::{CommandDescriptor, CommandResult, CommandSet, ExecutionContext, MergeType};
///
/// let look = CommandDescriptor::new("look", |_: &mut ExecutionContext, _: &[String], _: &str| {
///     Ok(CommandResult::ok("A quiet courtyard."))
/// })
/// .expect("valid key")
/// .with_alias("l");
///
/// let mut set = CommandSet::new("world")
///     .with_priority(5)
///     .with_merge_type(MergeType::Extend);
/// set.add(look).expect("no conflicts in an empty set");
///
/// assert!(set.find("l").is_some());
/// assert_eq!(set.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CommandSet {
    key: String,
    priority: i32,
    merge_type: MergeType,
    activation: Activation,
    commands: Vec<CommandDescriptor>,
}

impl CommandSet {
    /// Creates an empty, always-active `Union` set at priority 0.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            priority: 0,
            merge_type: MergeType::default(),
            activation: Activation::default(),
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_merge_type(mut self, merge_type: MergeType) -> Self {
        self.merge_type = merge_type;
        self
    }

    #[must_use]
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Adds `descriptor`, replacing one with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NameConflict`] if the descriptor's key or
    /// an alias is already a name of a different descriptor in this set.
    pub fn add(&mut self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        for other in self.commands.iter().filter(|c| c.key() != descriptor.key()) {
            if let Some(name) = descriptor.names().find(|n| other.answers_to(n)) {
                return Err(RegistryError::name_conflict(
                    &self.key,
                    descriptor.key(),
                    name,
                    other.key(),
                ));
            }
        }
        self.insert(descriptor);
        Ok(())
    }

    /// Adds `descriptor`, taking its names away from earlier descriptors.
    ///
    /// A clashing alias is stripped from the earlier descriptor; an earlier
    /// descriptor whose key is claimed is dropped.
    pub fn add_override(&mut self, descriptor: CommandDescriptor) {
        let names: Vec<String> = descriptor.names().map(str::to_string).collect();
        self.commands
            .retain(|c| c.key() == descriptor.key() || !names.iter().any(|n| n == c.key()));
        for other in &mut self.commands {
            other.strip_aliases(&names);
        }
        self.insert(descriptor);
    }

    /// Removes the descriptor with `key`.
    pub fn remove(&mut self, key: &str) -> Option<CommandDescriptor> {
        let key = key.to_lowercase();
        let index = self.commands.iter().position(|c| c.key() == key)?;
        Some(self.commands.remove(index))
    }

    /// Descriptor with exactly this key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CommandDescriptor> {
        let key = key.to_lowercase();
        self.commands.iter().find(|c| c.key() == key)
    }

    /// Descriptor answering to `name` as key or alias.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CommandDescriptor> {
        let name = name.to_lowercase();
        self.get(&name)
            .or_else(|| self.commands.iter().find(|c| c.answers_to(&name)))
    }

    /// Descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter()
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[must_use]
    pub fn merge_type(&self) -> MergeType {
        self.merge_type
    }

    #[must_use]
    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    /// Returns `true` if this set takes part in `ctx`'s merge.
    #[must_use]
    pub fn is_active(&self, ctx: &ExecutionContext) -> bool {
        self.activation.holds(ctx)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn insert(&mut self, descriptor: CommandDescriptor) {
        match self.commands.iter_mut().find(|c| c.key() == descriptor.key()) {
            Some(slot) => *slot = descriptor,
            None => self.commands.push(descriptor),
        }
    }
}
