//! Integration tests for interactive line sessions.
//!
//! Raw bytes go in exactly as a terminal would send them; assertions are on
//! the editor state and the bytes written back.

use campus_auth::{Role, RolePermissions};
use campus_runtime::auth::Identity;
use campus_runtime::command::{builtin, CommandExecutor, CommandRegistry, ExecutionContext};
use campus_runtime::io::{EditAction, LineEditor, Prompt};
use campus_runtime::protocol::{InteractiveSession, CANCELLED_NOTICE, DISCONNECT_NOTICE};
use campus_runtime::session::SessionManager;
use std::sync::Arc;

fn commands() -> Vec<String> {
    ["help", "hello", "history", "look"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn session(role: Role) -> InteractiveSession {
    let registry = Arc::new(CommandRegistry::new());
    builtin::install(&registry, Arc::new(SessionManager::new(4))).expect("builtins are valid");
    let executor = Arc::new(CommandExecutor::new(registry));

    let identity = Identity::new("alice").with_roles([role]);
    let ctx = ExecutionContext::new(
        identity.principal(),
        "alice",
        identity.grants(&RolePermissions::standard()),
    );
    InteractiveSession::new(executor, ctx).with_prompt(Prompt::new("lobby"))
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

// ─── Editor ─────────────────────────────────────────────────────────

#[test]
fn backspace_corrects_typo_before_enter() {
    let mut editor = LineEditor::new(10);
    let mut out = Vec::new();
    let actions = editor.feed(b"hepl\x7f\x7flp", &commands(), &mut out);
    assert!(actions.is_empty());
    assert_eq!(editor.buffer(), "help");

    let actions = editor.feed(b"\r", &commands(), &mut out);
    assert_eq!(actions, [EditAction::Submit("help".into())]);
    assert_eq!(editor.buffer(), "");
}

#[test]
fn ctrl_h_is_backspace_too() {
    let mut editor = LineEditor::new(10);
    let mut out = Vec::new();
    editor.feed(b"lookk\x08", &commands(), &mut out);
    assert_eq!(editor.buffer(), "look");
}

#[test]
fn tab_cycles_through_candidates() {
    let mut editor = LineEditor::new(10);
    let mut out = Vec::new();
    editor.feed(b"he", &commands(), &mut out);

    editor.feed(b"\t", &commands(), &mut out);
    assert_eq!(editor.buffer(), "hello");
    editor.feed(b"\t", &commands(), &mut out);
    assert_eq!(editor.buffer(), "help");
    editor.feed(b"\t", &commands(), &mut out);
    assert_eq!(editor.buffer(), "hello");
}

#[test]
fn history_navigation_restores_draft() {
    let mut editor = LineEditor::new(10);
    let mut out = Vec::new();
    editor.feed(b"look\rhelp\rwor", &commands(), &mut out);

    editor.feed(b"\x1b[A", &commands(), &mut out);
    assert_eq!(editor.buffer(), "help");
    editor.feed(b"\x1b[A", &commands(), &mut out);
    assert_eq!(editor.buffer(), "look");
    editor.feed(b"\x1b[B\x1b[B", &commands(), &mut out);
    assert_eq!(editor.buffer(), "wor");
}

#[test]
fn control_keys_edit_the_line() {
    let mut editor = LineEditor::new(10);
    let mut out = Vec::new();

    editor.feed(b"say hello world", &commands(), &mut out);
    editor.feed(b"\x17", &commands(), &mut out); // Ctrl+W
    assert_eq!(editor.buffer(), "say hello ");

    editor.feed(b"\x01", &commands(), &mut out); // Ctrl+A
    assert_eq!(editor.cursor(), 0);
    editor.feed(b"\x0b", &commands(), &mut out); // Ctrl+K
    assert_eq!(editor.buffer(), "");

    editor.feed(b"look north\x05", &commands(), &mut out); // Ctrl+E
    assert_eq!(editor.cursor(), 10);
    editor.feed(b"\x15", &commands(), &mut out); // Ctrl+U
    assert_eq!(editor.buffer(), "");
}

#[test]
fn partial_escape_sequence_across_reads() {
    let mut editor = LineEditor::new(10);
    let mut out = Vec::new();
    editor.feed(b"look\rab\x1b", &commands(), &mut out);
    editor.feed(b"[", &commands(), &mut out);
    assert_eq!(editor.buffer(), "ab");
    editor.feed(b"D", &commands(), &mut out);
    assert_eq!(editor.cursor(), 1);
}

// ─── Session ────────────────────────────────────────────────────────

#[test]
fn submitted_line_is_executed_and_reprompted() {
    let mut session = session(Role::User);
    let out = text(&session.feed(b"whoami\r"));
    assert!(out.contains("User: alice"));
    assert!(out.contains("lobby> "));
    assert_eq!(session.editor().history().latest(), Some("whoami"));
}

#[test]
fn output_lines_start_at_column_zero() {
    let mut session = session(Role::User);
    let out = text(&session.feed(b"whoami\rhelp\r"));
    // Every line break carries a carriage return.
    assert!(!out.replace("\r\n", "").contains('\n'));
    assert!(out.matches("\r\n").count() > 6);
}

#[test]
fn ctrl_c_discards_input_with_notice() {
    let mut session = session(Role::User);
    let out = text(&session.feed(b"quit\x03"));
    assert!(out.contains(CANCELLED_NOTICE));
    assert!(!session.is_closed());
    assert_eq!(session.editor().buffer(), "");
    assert!(session.editor().history().is_empty());
}

#[test]
fn ctrl_d_ends_session() {
    let mut session = session(Role::User);
    let out = text(&session.feed(b"\x04look\r"));
    assert!(out.contains(DISCONNECT_NOTICE));
    assert!(session.is_closed());
    assert!(session.editor().history().is_empty());
}

#[test]
fn quit_closes_and_ignores_trailing_bytes() {
    let mut session = session(Role::User);
    let out = text(&session.feed(b"quit\rwhoami\r"));
    assert!(out.contains("Goodbye, alice!"));
    assert!(!out.contains("User: alice"));
    assert!(session.is_closed());
}

#[test]
fn tab_completion_only_offers_visible_commands() {
    let mut user = session(Role::User);
    user.feed(b"sess\t");
    assert_eq!(user.editor().buffer(), "sess");

    let mut admin = session(Role::Admin);
    admin.feed(b"sess\t");
    assert_eq!(admin.editor().buffer(), "sessions");
}

#[test]
fn denied_command_reports_permission_denied() {
    let mut session = session(Role::User);
    let out = text(&session.feed(b"sessions\r"));
    assert!(out.contains("Permission denied for command 'sessions'."));
    assert!(!session.is_closed());
}

#[test]
fn history_command_lists_this_sessions_lines() {
    let mut first = session(Role::User);
    first.feed(b"whoami\rbogus\r");
    let out = text(&first.feed(b"history\r"));
    assert!(out.contains("Command history (last 3):"));
    assert!(out.contains("   1  whoami\r\n"));
    assert!(out.contains("   2  bogus\r\n"));
    assert!(out.contains("   3  history\r\n"));

    // A second session starts with its own, empty history.
    let mut other = session(Role::User);
    let out = text(&other.feed(b"history 5\r"));
    assert!(out.contains("   1  history 5"));
    assert!(!out.contains("whoami"));
}

#[test]
fn stats_reports_session_activity() {
    let mut session = session(Role::User);
    session.feed(b"whoami\rnosuch\r");
    let out = text(&session.feed(b"stats -p\r"));
    assert!(out.contains("[performance]"));
    assert!(out.contains("Commands this session: 3"));
    assert!(out.contains("Recent errors:         1"));
    assert!(!out.contains("[users]"));
}
