//! Builtin commands.
//!
//! | Set | Priority | Commands |
//! |-----|----------|----------|
//! | `system` | 0 | help, version, time, whoami, perm, history, stats, quit |
//! | `admin` | 10 | sessions |
//!
//! `help` reads the caller's visible commands from the context, which the
//! executor refreshes before each dispatch, so it never needs the registry.

use super::context::{ExecutionContext, MessageLevel};
use super::descriptor::{CommandDescriptor, CommandType};
use super::error::{HandlerError, RegistryError};
use super::registry::{CommandRegistry, EffectiveSet};
use super::result::CommandResult;
use super::set::CommandSet;
use crate::session::SessionManager;
use campus_auth::Permission;
use chrono::{Local, TimeDelta, Utc};
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;

/// Key of the builtin system set.
pub const SYSTEM_SET: &str = "system";
/// Key of the builtin admin set.
pub const ADMIN_SET: &str = "admin";

const PRODUCT_NAME: &str = "CampusWorld";

/// Lines `history` shows when no count is given.
pub const HISTORY_DEFAULT_LIMIT: usize = 20;

/// Builds the `system` set. `stats` reports on `sessions`.
///
/// # Errors
///
/// Only if a builtin name is malformed or clashes, which is a bug.
pub fn system_set(sessions: Arc<SessionManager>) -> Result<CommandSet, RegistryError> {
    let mut set = CommandSet::new(SYSTEM_SET).with_priority(0);

    set.add(
        CommandDescriptor::new("help", help)?
            .with_aliases(["h", "?"])
            .with_description("Show available commands")
            .with_usage("help [command] | help -s <query> | help --types"),
    )?;
    set.add(
        CommandDescriptor::new("version", version)?
            .with_alias("ver")
            .with_description("Show the server version"),
    )?;
    set.add(
        CommandDescriptor::new("time", time)?
            .with_alias("date")
            .with_description("Show the current server time"),
    )?;
    set.add(
        CommandDescriptor::new("whoami", whoami)?
            .with_alias("user")
            .with_description("Show who you are logged in as"),
    )?;
    set.add(
        CommandDescriptor::new("perm", perm)?
            .with_alias("permission")
            .with_description("Check whether you hold a permission")
            .with_usage("perm <permission>"),
    )?;
    set.add(
        CommandDescriptor::new("history", history)?
            .with_description("Show the lines you entered this session")
            .with_usage("history [count]"),
    )?;
    let report = move |ctx: &mut ExecutionContext,
                       switches: &[String],
                       _: &str|
          -> Result<CommandResult, HandlerError> { Ok(stats(&sessions, ctx, switches)) };
    set.add(
        CommandDescriptor::new("stats", report)?
            .with_aliases(["stat", "status"])
            .with_description("Show server and session statistics")
            .with_usage("stats [-s|--system] [-p|--performance] [-u|--users] [-a|--all]"),
    )?;
    set.add(
        CommandDescriptor::new("quit", quit)?
            .with_aliases(["exit", "q"])
            .with_description("Leave the session"),
    )?;

    Ok(set)
}

/// Builds the `admin` set around the live session table.
///
/// # Errors
///
/// Only if a builtin name is malformed, which is a bug.
pub fn admin_set(sessions: Arc<SessionManager>) -> Result<CommandSet, RegistryError> {
    let mut set = CommandSet::new(ADMIN_SET).with_priority(10);

    let list = move |_: &mut ExecutionContext,
                     _: &[String],
                     _: &str|
          -> Result<CommandResult, HandlerError> {
        let now = Utc::now();
        let infos = sessions.list();
        let mut out = format!("{} active session(s):", infos.len());
        let mut rows = Vec::with_capacity(infos.len());
        for info in &infos {
            let idle = (now - info.last_activity).num_seconds().max(0);
            let _ = write!(
                out,
                "\n  {:<8} {:<15} {:<21} idle {idle}s",
                info.id.short(),
                info.username,
                info.peer.as_deref().unwrap_or("-"),
            );
            rows.push(json!({
                "id": info.id.to_string(),
                "username": info.username,
                "caller": info.caller.to_string(),
                "peer": info.peer,
                "created_at": info.created_at.to_rfc3339(),
                "idle_secs": idle,
            }));
        }
        Ok(CommandResult::ok(out).with_data(json!(rows)))
    };

    set.add(
        CommandDescriptor::new("sessions", list)?
            .with_alias("who")
            .with_description("List connected sessions")
            .with_category("admin")
            .with_type(CommandType::Admin)
            .with_permission("system.view"),
    )?;

    Ok(set)
}

/// Adds the `system` and `admin` sets to `registry`.
///
/// # Errors
///
/// See [`system_set`].
pub fn install(
    registry: &CommandRegistry,
    sessions: Arc<SessionManager>,
) -> Result<(), RegistryError> {
    registry.add_set(system_set(Arc::clone(&sessions))?);
    registry.add_set(admin_set(sessions)?);
    Ok(())
}

fn help(
    ctx: &mut ExecutionContext,
    switches: &[String],
    args: &str,
) -> Result<CommandResult, HandlerError> {
    let Some(visible) = ctx.visible_commands() else {
        return Err(HandlerError::failed("command list unavailable"));
    };

    if switches.iter().any(|s| s == "--types") {
        return Ok(help_types(visible));
    }
    if switches.iter().any(|s| s == "-s" || s == "--search") {
        if args.is_empty() {
            return Err(HandlerError::usage("help -s <query>"));
        }
        return Ok(help_search(visible, args));
    }
    if !args.is_empty() {
        return Ok(help_command(visible, args));
    }

    let mut out = String::from("Available commands:");
    for (category, commands) in visible.by_category() {
        let _ = write!(out, "\n[{category}]");
        for d in commands {
            let _ = write!(out, "\n{}", help_line(d.key(), d.description()));
        }
    }
    out.push_str("\nType 'help <command>' for details.");
    Ok(CommandResult::ok(out).with_data(json!({ "count": visible.len() })))
}

fn help_line(name: &str, description: &str) -> String {
    format!("  {name:<15} - {description}")
}

fn help_command(visible: &EffectiveSet, name: &str) -> CommandResult {
    let Ok(d) = visible.resolve(name) else {
        return CommandResult::failure(format!("No help available for '{name}'."), "not found");
    };

    let mut out = help_line(d.key(), d.description()).trim_start().to_string();
    if let Some(usage) = d.usage() {
        let _ = write!(out, "\nUsage: {usage}");
    }
    if !d.aliases().is_empty() {
        let _ = write!(out, "\nAliases: {}", d.aliases().join(", "));
    }
    let _ = write!(out, "\nType: {}  Category: {}", d.command_type(), d.category());
    if !d.requirement().is_unrestricted() {
        let _ = write!(out, "\nRequires: {}", d.requirement());
    }
    CommandResult::ok(out).with_data(json!({
        "key": d.key(),
        "aliases": d.aliases(),
        "category": d.category(),
        "type": d.command_type(),
    }))
}

fn help_search(visible: &EffectiveSet, query: &str) -> CommandResult {
    let hits = visible.search(query);
    if hits.is_empty() {
        return CommandResult::ok(format!("No commands match '{query}'."));
    }
    let mut out = format!("Commands matching '{query}':");
    for d in &hits {
        let _ = write!(out, "\n{}", help_line(d.key(), d.description()));
    }
    let keys: Vec<&str> = hits.iter().map(|d| d.key()).collect();
    CommandResult::ok(out).with_data(json!({ "matches": keys }))
}

fn help_types(visible: &EffectiveSet) -> CommandResult {
    let mut out = String::from("Commands by type:");
    let mut counts = serde_json::Map::new();
    for (command_type, commands) in visible.by_type() {
        let _ = write!(out, "\n  {:<8} {}", command_type.as_str(), commands.len());
        counts.insert(command_type.to_string(), json!(commands.len()));
    }
    CommandResult::ok(out).with_data(counts.into())
}

fn version(
    _: &mut ExecutionContext,
    _: &[String],
    _: &str,
) -> Result<CommandResult, HandlerError> {
    let version = env!("CARGO_PKG_VERSION");
    Ok(CommandResult::ok(format!("{PRODUCT_NAME} v{version}"))
        .with_data(json!({ "name": PRODUCT_NAME, "version": version })))
}

fn time(_: &mut ExecutionContext, _: &[String], _: &str) -> Result<CommandResult, HandlerError> {
    let now = Local::now();
    Ok(
        CommandResult::ok(format!("Server time: {}", now.format("%Y-%m-%d %H:%M:%S")))
            .with_data(json!({ "timestamp": now.to_rfc3339() })),
    )
}

fn whoami(
    ctx: &mut ExecutionContext,
    _: &[String],
    _: &str,
) -> Result<CommandResult, HandlerError> {
    let grants = ctx.grants();
    let roles: Vec<&str> = grants.roles().iter().map(|r| r.as_str()).collect();
    let roles_text = if roles.is_empty() {
        "none".to_string()
    } else {
        roles.join(", ")
    };

    let out = format!(
        "User: {}\nCaller: {}\nSession: {}\nRoles: {roles_text}\nAccess level: {}\nPermissions: {}",
        ctx.username(),
        ctx.caller_id(),
        ctx.session_id().short(),
        grants.access_level(),
        grants.permissions().len(),
    );
    let data = json!({
        "username": ctx.username(),
        "caller_id": ctx.caller_id(),
        "session_id": ctx.session_id(),
        "roles": roles,
        "access_level": grants.access_level(),
        "permissions": grants.permissions(),
    });
    Ok(CommandResult::ok(out).with_data(data))
}

fn perm(
    ctx: &mut ExecutionContext,
    _: &[String],
    args: &str,
) -> Result<CommandResult, HandlerError> {
    let token = args.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(HandlerError::usage("perm <permission>"));
    }
    let permission = Permission::new(token);
    let granted = ctx.grants().permission_satisfies(&permission);
    let message = if granted {
        format!("You hold '{permission}'.")
    } else {
        format!("You do not hold '{permission}'.")
    };
    Ok(CommandResult::ok(message).with_data(json!({
        "permission": permission,
        "granted": granted,
    })))
}

fn history(
    ctx: &mut ExecutionContext,
    _: &[String],
    args: &str,
) -> Result<CommandResult, HandlerError> {
    let limit = match args.trim() {
        "" => HISTORY_DEFAULT_LIMIT,
        count => count
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| HandlerError::usage("history [count]"))?,
    };

    let entries = ctx.history();
    if entries.is_empty() {
        return Ok(CommandResult::ok("No command history.").with_data(json!([])));
    }
    let skip = entries.len().saturating_sub(limit);
    let shown = &entries[skip..];

    let mut out = format!("Command history (last {}):", shown.len());
    for (i, line) in shown.iter().enumerate() {
        let _ = write!(out, "\n{:>4}  {line}", skip + i + 1);
    }
    Ok(CommandResult::ok(out).with_data(json!(shown)))
}

fn stats(sessions: &SessionManager, ctx: &ExecutionContext, switches: &[String]) -> CommandResult {
    let has = |short: &str, long: &str| switches.iter().any(|s| s == short || s == long);
    let all = has("-a", "--all");
    let mut system = all || has("-s", "--system");
    let mut performance = all || has("-p", "--performance");
    let mut users = all || has("-u", "--users");
    if !(system || performance || users) {
        (system, performance, users) = (true, true, true);
    }

    let now = Utc::now();
    let mut out = String::from("Statistics:");
    let mut data = serde_json::Map::new();

    if system {
        let uptime = (now - sessions.started_at()).max(TimeDelta::zero());
        let version = env!("CARGO_PKG_VERSION");
        let _ = write!(
            out,
            "\n[system]\n  Version:      {PRODUCT_NAME} v{version}\n  Uptime:       {}\n  Server time:  {}",
            format_uptime(uptime),
            now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        );
        data.insert(
            "system".into(),
            json!({
                "version": version,
                "uptime_secs": uptime.num_seconds(),
                "started_at": sessions.started_at().to_rfc3339(),
            }),
        );
    }

    if performance {
        let commands = ctx.history().len();
        let errors = ctx
            .messages()
            .iter()
            .filter(|m| m.level == MessageLevel::Error)
            .count();
        let _ = write!(
            out,
            "\n[performance]\n  Commands this session: {commands}\n  Recent errors:         {errors}"
        );
        data.insert(
            "performance".into(),
            json!({ "commands": commands, "recent_errors": errors }),
        );
    }

    if users {
        let infos = sessions.list();
        let guests = infos.iter().filter(|i| i.caller.is_guest()).count();
        let mut names: Vec<&str> = infos.iter().map(|i| i.username.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        let idle = sessions
            .idle_timeout()
            .map_or_else(|| "disabled".to_string(), |t| format!("{}s", t.as_secs()));
        let _ = write!(
            out,
            "\n[users]\n  Sessions:     {}/{}\n  Distinct:     {}\n  Guests:       {guests}\n  Idle timeout: {idle}",
            infos.len(),
            sessions.capacity(),
            names.len(),
        );
        data.insert(
            "users".into(),
            json!({
                "sessions": infos.len(),
                "capacity": sessions.capacity(),
                "distinct_users": names.len(),
                "guests": guests,
            }),
        );
    }

    CommandResult::ok(out).with_data(data.into())
}

fn format_uptime(uptime: TimeDelta) -> String {
    let secs = uptime.num_seconds();
    let (days, hours, minutes, seconds) =
        (secs / 86_400, secs % 86_400 / 3600, secs % 3600 / 60, secs % 60);
    if days > 0 {
        format!("{days}d {hours:02}h {minutes:02}m {seconds:02}s")
    } else {
        format!("{hours:02}h {minutes:02}m {seconds:02}s")
    }
}

fn quit(ctx: &mut ExecutionContext, _: &[String], _: &str) -> Result<CommandResult, HandlerError> {
    Ok(CommandResult::ok(format!("Goodbye, {}!", ctx.username())).with_exit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandExecutor;
    use crate::io::CommandHistory;
    use crate::session::ChannelTransport;
    use campus_auth::{AccessLevel, Grants, Role, RolePermissions};
    use campus_types::{CallerId, Principal, SessionId};

    fn executor() -> CommandExecutor {
        let registry = Arc::new(CommandRegistry::new());
        install(&registry, Arc::new(SessionManager::new(4))).expect("builtins are valid");
        CommandExecutor::new(registry)
    }

    fn ctx_with(role: Role) -> ExecutionContext {
        let grants = Grants::new()
            .with_role(role)
            .with_permissions(&RolePermissions::standard().permissions_for(role))
            .with_access_level(AccessLevel::for_role(role));
        ExecutionContext::new(Principal::User(CallerId::new("u1")), "alice", grants)
    }

    fn run(line: &str, ctx: &mut ExecutionContext) -> CommandResult {
        executor()
            .execute(line, ctx)
            .into_iter()
            .next()
            .expect("one result")
    }

    #[test]
    fn help_lists_visible_commands_by_category() {
        let result = run("help", &mut ctx_with(Role::User));
        assert!(result.success());
        assert!(result.message().starts_with("Available commands:"));
        assert!(result.message().contains("[general]"));
        assert!(result.message().contains(&help_line("quit", "Leave the session")));
        assert!(!result.message().contains("sessions"));
    }

    #[test]
    fn help_shows_admin_commands_to_developers() {
        let result = run("h", &mut ctx_with(Role::Developer));
        assert!(result.message().contains("[admin]"));
        assert!(result.message().contains("sessions"));
    }

    #[test]
    fn help_for_one_command() {
        let result = run("help exit", &mut ctx_with(Role::User));
        assert!(result.success());
        assert!(result.message().starts_with("quit"));
        assert!(result.message().contains("Aliases: exit, q"));

        let hidden = run("help sessions", &mut ctx_with(Role::User));
        assert_eq!(hidden.error(), Some("not found"));
    }

    #[test]
    fn help_search_and_types() {
        let result = run("help -s time", &mut ctx_with(Role::User));
        assert!(result.message().contains("time"));
        assert_eq!(result.data(), Some(&json!({ "matches": ["time"] })));

        let usage = run("help -s", &mut ctx_with(Role::User));
        assert_eq!(usage.error(), Some("usage: help -s <query>"));

        let types = run("help --types", &mut ctx_with(Role::User));
        assert_eq!(types.data(), Some(&json!({ "system": 8 })));
    }

    #[test]
    fn version_reports_crate_version() {
        let result = run("ver", &mut ctx_with(Role::Guest));
        assert_eq!(
            result.data().and_then(|d| d.get("version")),
            Some(&json!(env!("CARGO_PKG_VERSION")))
        );
    }

    #[test]
    fn whoami_and_perm() {
        let mut ctx = ctx_with(Role::Moderator);
        let who = run("whoami", &mut ctx);
        assert!(who.message().contains("User: alice"));
        assert!(who.message().contains("Roles: moderator"));

        assert!(run("perm campus.edit", &mut ctx).message().starts_with("You hold"));
        assert!(run("perm system.view", &mut ctx)
            .message()
            .starts_with("You do not hold"));
        assert!(run("perm", &mut ctx).error().is_some());
    }

    #[test]
    fn quit_requests_exit() {
        let mut ctx = ctx_with(Role::User);
        let result = run("q", &mut ctx);
        assert!(result.should_exit());
        assert!(ctx.exit_requested());
    }

    #[test]
    fn sessions_requires_system_view() {
        let denied = run("who", &mut ctx_with(Role::User));
        assert_eq!(denied.error(), Some("permission denied"));

        let allowed = run("who", &mut ctx_with(Role::Admin));
        assert!(allowed.success());
        assert!(allowed.message().starts_with("0 active session(s)"));
    }

    #[test]
    fn history_lists_submitted_lines() {
        let executor = executor();
        let mut ctx = ctx_with(Role::User);
        let mut history = CommandHistory::new(10);
        for line in ["look", "nosuch", "time"] {
            executor.execute_interactive(line, &mut ctx, &mut history);
        }

        let all = executor.execute_interactive("history", &mut ctx, &mut history);
        assert!(all[0].success());
        assert_eq!(
            all[0].data(),
            Some(&json!(["look", "nosuch", "time", "history"]))
        );
        assert!(all[0].message().starts_with("Command history (last 4):"));
        assert!(all[0].message().contains("   2  nosuch"));

        let last = executor.execute_interactive("history 2", &mut ctx, &mut history);
        assert_eq!(last[0].data(), Some(&json!(["history", "history 2"])));
        assert!(last[0].message().contains("   4  history"));

        let bad = executor.execute_interactive("history lots", &mut ctx, &mut history);
        assert_eq!(bad[0].error(), Some("usage: history [count]"));
    }

    #[test]
    fn history_is_empty_outside_interactive_sessions() {
        let result = run("history", &mut ctx_with(Role::User));
        assert!(result.success());
        assert_eq!(result.message(), "No command history.");
    }

    #[test]
    fn stats_sections_follow_switches() {
        let all = run("stats", &mut ctx_with(Role::User));
        assert!(all.success());
        let data = all.data().expect("stats data");
        assert!(data.get("system").is_some());
        assert!(data.get("performance").is_some());
        assert_eq!(data["users"]["sessions"], json!(0));
        assert_eq!(data["users"]["capacity"], json!(4));

        let users = run("status -u", &mut ctx_with(Role::User));
        let data = users.data().expect("stats data");
        assert!(data.get("system").is_none());
        assert!(data.get("performance").is_none());
        assert!(users.message().contains("[users]"));

        let two = run("stat --system -p", &mut ctx_with(Role::Guest));
        let data = two.data().expect("stats data");
        assert_eq!(data["system"]["version"], json!(env!("CARGO_PKG_VERSION")));
        assert!(data.get("users").is_none());
        assert!(two.message().contains("[performance]"));
    }

    #[test]
    fn stats_counts_live_sessions() {
        let sessions = Arc::new(SessionManager::new(4));
        let registry = Arc::new(CommandRegistry::new());
        install(&registry, Arc::clone(&sessions)).expect("builtins are valid");
        let executor = CommandExecutor::new(registry);

        for (name, caller) in [
            ("alice", Principal::User(CallerId::new("u1"))),
            ("alice", Principal::User(CallerId::new("u1"))),
            ("visitor", Principal::Guest),
        ] {
            let (transport, _signal) = ChannelTransport::new(None);
            sessions.register(SessionId::new(), name, caller, Arc::new(transport));
        }

        let mut ctx = ctx_with(Role::User);
        let result = executor.execute("stats -u", &mut ctx).remove(0);
        assert_eq!(
            result.data().map(|d| d["users"].clone()),
            Some(json!({
                "sessions": 3,
                "capacity": 4,
                "distinct_users": 2,
                "guests": 1,
            }))
        );
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(TimeDelta::seconds(59)), "00h 00m 59s");
        assert_eq!(format_uptime(TimeDelta::seconds(3_723)), "01h 02m 03s");
        assert_eq!(format_uptime(TimeDelta::seconds(90_061)), "1d 01h 01m 01s");
    }
}
