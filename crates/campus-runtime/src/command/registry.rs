//! Command registry and effective-set computation.
//!
//! # Merge Order
//!
//! ```text
//! active sets, sorted by (priority, registration seq) ascending
//!
//!   system  (p=0,  seq 0)  ──┐
//!   world   (p=5,  seq 1)  ──┼── fold: each set merges onto the accumulator
//!   combat  (p=5,  seq 2)  ──┤        using its own MergeType
//!   admin   (p=10, seq 3)  ──┘
//!                             ▼
//!                        EffectiveSet (key → descriptor, sorted)
//! ```
//!
//! Later sets in the fold outrank earlier ones, so at equal priority the
//! set registered later wins.
//!
//! Resolution looks for an exact key first, then for aliases. An alias
//! claimed by several descriptors goes to the one from the highest
//! priority; a tie at that priority is [`ResolveError::Ambiguous`].

use super::context::ExecutionContext;
use super::descriptor::{CommandDescriptor, CommandType};
use super::error::{RegistryError, ResolveError};
use super::set::{CommandSet, MergeType};
use campus_auth::{evaluate, Grants};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Entry {
    descriptor: CommandDescriptor,
    priority: i32,
    set: String,
}

/// Caller-specific mapping of command keys to descriptors.
///
/// Produced by [`CommandRegistry::merged_set`] (everything the caller's
/// active sets contribute) or [`CommandRegistry::effective_set`] (the same,
/// minus what the caller is not allowed to run). Iteration is in key order.
#[derive(Debug, Clone, Default)]
pub struct EffectiveSet {
    entries: BTreeMap<String, Entry>,
}

impl EffectiveSet {
    /// Resolves a key or alias, case-insensitively.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NotFound`] if nothing answers to `name`;
    /// [`ResolveError::Ambiguous`] if the best alias match is shared by
    /// several descriptors of equal priority.
    pub fn resolve(&self, name: &str) -> Result<&CommandDescriptor, ResolveError> {
        let name = name.to_lowercase();
        if let Some(entry) = self.entries.get(&name) {
            return Ok(&entry.descriptor);
        }

        let matches: Vec<&Entry> = self
            .entries
            .values()
            .filter(|e| e.descriptor.aliases().iter().any(|a| *a == name))
            .collect();
        let Some(top) = matches.iter().map(|e| e.priority).max() else {
            return Err(ResolveError::NotFound { name });
        };
        let best: Vec<&Entry> = matches.into_iter().filter(|e| e.priority == top).collect();
        match best[..] {
            [only] => Ok(&only.descriptor),
            _ => Err(ResolveError::Ambiguous {
                candidates: best.iter().map(|e| e.descriptor.key().to_string()).collect(),
                name,
            }),
        }
    }

    /// Descriptor with exactly this key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CommandDescriptor> {
        self.entries.get(&key.to_lowercase()).map(|e| &e.descriptor)
    }

    /// Key of the set that contributed `key`.
    #[must_use]
    pub fn source_set(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(|e| e.set.as_str())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Descriptors in key order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.entries.values().map(|e| &e.descriptor)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptors whose key, an alias or the description contains `query`.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&CommandDescriptor> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.iter()
            .filter(|d| {
                d.names().any(|n| n.contains(&query))
                    || d.description().to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Descriptors grouped by category; categories and members sorted.
    #[must_use]
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&CommandDescriptor>> {
        let mut groups: BTreeMap<&str, Vec<&CommandDescriptor>> = BTreeMap::new();
        for descriptor in self.iter() {
            groups.entry(descriptor.category()).or_default().push(descriptor);
        }
        groups
    }

    /// Descriptors grouped by [`CommandType`].
    #[must_use]
    pub fn by_type(&self) -> BTreeMap<CommandType, Vec<&CommandDescriptor>> {
        let mut groups: BTreeMap<CommandType, Vec<&CommandDescriptor>> = BTreeMap::new();
        for descriptor in self.iter() {
            groups.entry(descriptor.command_type()).or_default().push(descriptor);
        }
        groups
    }

    /// Every key and alias, sorted and deduplicated. Feeds tab completion.
    #[must_use]
    pub fn completion_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .iter()
            .flat_map(|d| d.names().map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Keeps only descriptors whose requirement `grants` satisfies.
    #[must_use]
    pub fn visible_to(&self, grants: &Grants) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(_, e)| evaluate(grants, e.descriptor.requirement()).is_ok())
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect();
        Self { entries }
    }

    fn merge(&mut self, set: &CommandSet) {
        match set.merge_type() {
            MergeType::Union => {
                for descriptor in set.iter() {
                    self.put(set, descriptor.clone());
                }
            }
            MergeType::Replace => {
                // Colliding keys are overwritten; survivors only lose the
                // aliases the incoming set now answers to.
                let claimed: Vec<String> = set
                    .iter()
                    .flat_map(CommandDescriptor::names)
                    .map(str::to_string)
                    .collect();
                for entry in self.entries.values_mut() {
                    entry.descriptor.strip_aliases(&claimed);
                }
                for descriptor in set.iter() {
                    self.put(set, descriptor.clone());
                }
            }
            MergeType::Extend => {
                for descriptor in set.iter() {
                    let mut merged = descriptor.clone();
                    if let Some(existing) = self.entries.get(descriptor.key()) {
                        merged.absorb_aliases(&existing.descriptor);
                        if merged.description().is_empty() {
                            merged = merged.with_description(existing.descriptor.description());
                        }
                    }
                    self.put(set, merged);
                }
            }
            MergeType::Remove => {
                for descriptor in set.iter() {
                    self.entries.remove(descriptor.key());
                }
            }
        }
    }

    fn put(&mut self, set: &CommandSet, descriptor: CommandDescriptor) {
        self.entries.insert(
            descriptor.key().to_string(),
            Entry {
                descriptor,
                priority: set.priority(),
                set: set.key().to_string(),
            },
        );
    }
}

#[derive(Debug)]
struct Registered {
    set: CommandSet,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    sets: Vec<Registered>,
    next_seq: u64,
}

impl Inner {
    fn position(&self, key: &str) -> Option<usize> {
        self.sets.iter().position(|r| r.set.key() == key)
    }

    /// Sets passing `filter`, in fold order.
    fn fold(&self, filter: impl Fn(&CommandSet) -> bool) -> EffectiveSet {
        let mut ordered: Vec<&Registered> = self.sets.iter().filter(|r| filter(&r.set)).collect();
        ordered.sort_by_key(|r| (r.set.priority(), r.seq));

        let mut merged = EffectiveSet::default();
        for registered in ordered {
            merged.merge(&registered.set);
        }
        merged
    }
}

/// Catalog of every command set.
///
/// Shared as `Arc<CommandRegistry>` between the executor and all sessions.
/// Reads run concurrently; mutations take a write lock and are seen by the
/// next resolution.
///
/// # Example
///
/// ```
/// use campus_runtime::command::{
///     CommandDescriptor, CommandRegistry, CommandResult, CommandSet, ExecutionContext, MergeType,
/// };
///
/// fn say(text: &'static str) -> impl Fn(&mut ExecutionContext, &[String], &str)
///     -> Result<CommandResult, campus_runtime::command::HandlerError> + Send + Sync {
///     move |_, _, _| Ok(CommandResult::ok(text))
/// }
///
/// let registry = CommandRegistry::new();
/// registry.add_set(CommandSet::new("base"));
/// registry
///     .register(CommandDescriptor::new("look", say("base look")).expect("valid key"), "base")
///     .expect("base exists");
///
/// let mut dark = CommandSet::new("dark").with_priority(5).with_merge_type(MergeType::Replace);
/// dark.add(CommandDescriptor::new("look", say("too dark")).expect("valid key"))
///     .expect("no conflicts");
/// registry.add_set(dark);
///
/// let ctx = ExecutionContext::guest();
/// let merged = registry.merged_set(&ctx);
/// assert_eq!(merged.source_set("look"), Some("dark"));
/// ```
#[derive(Debug, Default)]
pub struct CommandRegistry {
    inner: RwLock<Inner>,
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a set, replacing one with the same key.
    ///
    /// The set receives a new registration sequence number either way, so
    /// re-adding moves it behind equal-priority sets registered earlier.
    pub fn add_set(&self, set: CommandSet) {
        let mut inner = self.inner.write();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        tracing::debug!(
            set = set.key(),
            priority = set.priority(),
            merge = %set.merge_type(),
            commands = set.len(),
            seq,
            "command set added"
        );
        if let Some(index) = inner.position(set.key()) {
            inner.sets.remove(index);
        }
        inner.sets.push(Registered { set, seq });
    }

    /// Removes and returns the set with `key`.
    pub fn remove_set(&self, key: &str) -> Option<CommandSet> {
        let mut inner = self.inner.write();
        let index = inner.position(key)?;
        tracing::debug!(set = key, "command set removed");
        Some(inner.sets.remove(index).set)
    }

    /// Adds `descriptor` to the set `set_key`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownSet`] if no such set exists, or
    /// [`RegistryError::NameConflict`] from [`CommandSet::add`].
    pub fn register(
        &self,
        descriptor: CommandDescriptor,
        set_key: &str,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.write();
        let index = inner
            .position(set_key)
            .ok_or_else(|| RegistryError::UnknownSet(set_key.to_string()))?;
        let key = descriptor.key().to_string();
        inner.sets[index].set.add(descriptor)?;
        tracing::debug!(set = set_key, command = %key, "command registered");
        Ok(())
    }

    /// Removes the command `key` from every set.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if no set contained it.
    pub fn unregister(&self, key: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.write();
        let removed = inner
            .sets
            .iter_mut()
            .filter_map(|r| r.set.remove(key))
            .count();
        if removed == 0 {
            return Err(RegistryError::NotRegistered(key.to_string()));
        }
        tracing::debug!(command = key, sets = removed, "command unregistered");
        Ok(())
    }

    /// Resolves `name` across all sets, ignoring activation and grants.
    ///
    /// # Errors
    ///
    /// See [`EffectiveSet::resolve`].
    pub fn resolve(&self, name: &str) -> Result<CommandDescriptor, ResolveError> {
        let merged = self.inner.read().fold(|_| true);
        merged.resolve(name).cloned()
    }

    /// Merge of the sets active for `ctx`, without authorization filtering.
    #[must_use]
    pub fn merged_set(&self, ctx: &ExecutionContext) -> EffectiveSet {
        self.inner.read().fold(|set| set.is_active(ctx))
    }

    /// Commands `ctx` may see and run.
    #[must_use]
    pub fn effective_set(&self, ctx: &ExecutionContext) -> EffectiveSet {
        self.merged_set(ctx).visible_to(ctx.grants())
    }

    /// Keys of all sets in registration order.
    #[must_use]
    pub fn set_keys(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut sets: Vec<&Registered> = inner.sets.iter().collect();
        sets.sort_by_key(|r| r.seq);
        sets.into_iter().map(|r| r.set.key().to_string()).collect()
    }

    /// A copy of the set with `key`.
    #[must_use]
    pub fn set(&self, key: &str) -> Option<CommandSet> {
        let inner = self.inner.read();
        inner.position(key).map(|i| inner.sets[i].set.clone())
    }
}
