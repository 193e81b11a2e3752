//! Property tests for effective-set computation.

use campus_auth::{Grants, Permission, Role};
use campus_runtime::command::{
    CommandDescriptor, CommandRegistry, CommandResult, CommandSet, ExecutionContext,
    HandlerError, MergeType,
};
use campus_types::{CallerId, Principal};
use proptest::prelude::*;

const TOKENS: &[&str] = &[
    "user.create",
    "user.delete",
    "world.create",
    "world.edit",
    "system.view",
    "user.*",
    "world.*",
    "*",
    "all",
];

fn noop(
    _: &mut ExecutionContext,
    _: &[String],
    _: &str,
) -> Result<CommandResult, HandlerError> {
    Ok(CommandResult::ok(""))
}

fn merge_type() -> impl Strategy<Value = MergeType> {
    prop_oneof![
        Just(MergeType::Union),
        Just(MergeType::Replace),
        Just(MergeType::Extend),
        Just(MergeType::Remove),
    ]
}

fn role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Guest),
        Just(Role::User),
        Just(Role::Moderator),
        Just(Role::Developer),
        Just(Role::Admin),
        Just(Role::Owner),
    ]
}

/// (key index, required permission index, required role)
type Spec = (usize, Option<usize>, Option<Role>);

fn arb_set() -> impl Strategy<Value = (i32, MergeType, Vec<Spec>)> {
    (
        -3i32..3,
        merge_type(),
        prop::collection::vec(
            (0usize..8, prop::option::of(0usize..5), prop::option::of(role())),
            0..6,
        ),
    )
}

fn build(specs: &[(i32, MergeType, Vec<Spec>)]) -> CommandRegistry {
    let registry = CommandRegistry::new();
    for (i, (priority, merge, cmds)) in specs.iter().enumerate() {
        let mut set = CommandSet::new(format!("set{i}"))
            .with_priority(*priority)
            .with_merge_type(*merge);
        for (key, permission, role) in cmds {
            let mut descriptor =
                CommandDescriptor::new(&format!("cmd{key}"), noop).expect("valid key");
            if let Some(p) = permission {
                descriptor = descriptor.with_permission(TOKENS[*p]);
            }
            if let Some(r) = role {
                descriptor = descriptor.with_role(*r);
            }
            set.add_override(descriptor);
        }
        registry.add_set(set);
    }
    registry
}

fn grants() -> impl Strategy<Value = Grants> {
    (
        prop::collection::vec(0usize..TOKENS.len(), 0..4),
        prop::collection::vec(role(), 0..3),
    )
        .prop_map(|(tokens, roles)| {
            tokens
                .into_iter()
                .fold(Grants::new().with_roles(roles), |g, t| {
                    g.with_permission(TOKENS[t])
                })
        })
}

proptest! {
    #[test]
    fn effective_set_respects_permissions(
        specs in prop::collection::vec(arb_set(), 1..5),
        grants in grants(),
    ) {
        let registry = build(&specs);
        let ctx = ExecutionContext::new(Principal::User(CallerId::new("p")), "p", grants.clone());

        for descriptor in registry.effective_set(&ctx).iter() {
            let requirement = descriptor.requirement();
            if let Some(ref permission) = requirement.permission {
                prop_assert!(grants.permission_satisfies(permission));
            }
            if let Some(role) = requirement.role {
                prop_assert!(grants.role_satisfies(role));
            }
        }
    }

    #[test]
    fn effective_set_is_stable(
        specs in prop::collection::vec(arb_set(), 1..5),
        grants in grants(),
    ) {
        let registry = build(&specs);
        let ctx = ExecutionContext::new(Principal::User(CallerId::new("p")), "p", grants);

        let first: Vec<String> = registry.effective_set(&ctx).keys().map(String::from).collect();
        let second: Vec<String> = registry.effective_set(&ctx).keys().map(String::from).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn union_never_drops_lower_commands(
        low in prop::collection::btree_set(0usize..8, 0..6),
        high in prop::collection::btree_set(0usize..8, 0..6),
    ) {
        let registry = CommandRegistry::new();
        let to_set = |name: &str, priority: i32, merge: MergeType, keys: &std::collections::BTreeSet<usize>| {
            let mut set = CommandSet::new(name).with_priority(priority).with_merge_type(merge);
            for k in keys {
                set.add(CommandDescriptor::new(&format!("cmd{k}"), noop).expect("valid key"))
                    .expect("distinct keys");
            }
            set
        };
        registry.add_set(to_set("low", 0, MergeType::Union, &low));
        registry.add_set(to_set("high", 1, MergeType::Union, &high));

        let merged = registry.merged_set(&ExecutionContext::guest());
        for k in low.union(&high) {
            let key = format!("cmd{k}");
            prop_assert!(merged.contains(&key));
        }
    }

    #[test]
    fn replace_claims_colliding_keys(
        low in prop::collection::btree_set(0usize..8, 1..6),
        high in prop::collection::btree_set(0usize..8, 1..6),
    ) {
        let registry = CommandRegistry::new();
        for (name, priority, merge, keys) in [
            ("low", 0, MergeType::Union, &low),
            ("high", 1, MergeType::Replace, &high),
        ] {
            let mut set = CommandSet::new(name).with_priority(priority).with_merge_type(merge);
            for k in keys {
                set.add(CommandDescriptor::new(&format!("cmd{k}"), noop).expect("valid key"))
                    .expect("distinct keys");
            }
            registry.add_set(set);
        }

        let merged = registry.merged_set(&ExecutionContext::guest());
        for k in &high {
            prop_assert_eq!(merged.source_set(&format!("cmd{k}")), Some("high"));
        }
        for k in low.difference(&high) {
            prop_assert_eq!(merged.source_set(&format!("cmd{k}")), Some("low"));
        }
    }

    #[test]
    fn wildcard_satisfies_everything(ns in "[a-z]{1,6}", action in "[a-z]{1,6}") {
        let token = format!("{ns}.{action}");
        let everything = Grants::new().with_permission("*");
        prop_assert!(everything.permission_satisfies(&Permission::new(token.clone())));

        let scoped = Grants::new().with_permission(format!("{ns}.*"));
        prop_assert!(scoped.permission_satisfies(&Permission::new(token)));
        let elsewhere = format!("{ns}x.{action}");
        prop_assert!(!scoped.permission_satisfies(&Permission::new(elsewhere)));
    }
}
