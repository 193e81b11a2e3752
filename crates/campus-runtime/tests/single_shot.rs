//! Integration tests for the single-shot request path.

use campus_auth::{Requirement, Role};
use campus_runtime::command::{
    Activation, CommandDescriptor, CommandResult, CommandSet, ExecutionContext, HandlerError,
};
use campus_runtime::config::CampusConfig;
use campus_runtime::protocol::{CommandRequest, CommandResponse};
use campus_runtime::server::CampusEngine;
use serde_json::{json, Value};

fn engine() -> CampusEngine {
    let engine = CampusEngine::from_config(&CampusConfig::default()).expect("default config is valid");

    let mut chess = CommandSet::new("chess")
        .with_priority(20)
        .with_activation(Activation::GameState {
            key: "current_game".into(),
            value: json!("chess"),
        });
    chess
        .add(
            CommandDescriptor::new(
                "move",
                |ctx: &mut ExecutionContext, _: &[String], args: &str| {
                    let turn = ctx.state("turn").and_then(Value::as_u64).unwrap_or(0) + 1;
                    ctx.set_state("turn", json!(turn));
                    Ok(CommandResult::ok(format!("{args} played")).with_data(json!({ "turn": turn })))
                },
            )
            .expect("valid key")
            .with_alias("mv"),
        )
        .expect("empty set");
    engine.registry().add_set(chess);

    let mut ops = CommandSet::new("ops")
        .with_priority(30)
        .with_activation(Activation::Requires(Requirement::none().with_role(Role::Admin)));
    ops.add(
        CommandDescriptor::new(
            "crash",
            |_: &mut ExecutionContext, _: &[String], _: &str| -> Result<CommandResult, HandlerError> {
                Err(HandlerError::failed("disk on fire"))
            },
        )
        .expect("valid key"),
    )
    .expect("empty set");
    engine.registry().add_set(ops);

    engine
}

#[test]
fn request_builds_identity_from_fields() {
    let response = engine().single_shot().handle_json(
        r#"{"command_line": "whoami", "caller_id": "u-42", "roles": ["moderator"]}"#,
    );
    assert!(response.success);
    let data = response.data.expect("whoami returns data");
    assert_eq!(data["username"], "u-42");
    assert_eq!(data["roles"], json!(["moderator"]));
}

#[test]
fn unknown_command_is_not_found() {
    let response = engine().single_shot().handle(&CommandRequest::new("fly"));
    assert_eq!(
        response,
        CommandResponse {
            success: false,
            message: "Command 'fly' was not found. Type 'help' for available commands.".into(),
            data: None,
            error: Some("not found".into()),
        }
    );
}

#[test]
fn explicit_permission_unlocks_admin_builtin() {
    let adapter = engine().single_shot();
    let denied = adapter.handle(&CommandRequest::new("sessions"));
    assert_eq!(denied.error.as_deref(), Some("permission denied"));

    let allowed = adapter.handle(&CommandRequest::new("who").with_permission("system.*"));
    assert!(allowed.success);
    assert_eq!(allowed.data, Some(json!([])));
}

#[test]
fn game_state_activates_domain_set() {
    let adapter = engine().single_shot();

    let outside = adapter.handle(&CommandRequest::new("move e4"));
    assert_eq!(outside.error.as_deref(), Some("not found"));

    let inside = adapter.handle(
        &CommandRequest::new("mv e4; mv e5").with_state("current_game", json!("chess")),
    );
    assert!(inside.success);
    assert_eq!(inside.message, "e4 played\ne5 played");
    assert_eq!(inside.data, Some(json!([{ "turn": 1 }, { "turn": 2 }])));
}

#[test]
fn requests_share_no_state() {
    let adapter = engine().single_shot();
    let request = CommandRequest::new("mv e4").with_state("current_game", json!("chess"));
    let first = adapter.handle(&request);
    let second = adapter.handle(&request);
    assert_eq!(first.data, second.data);
}

#[test]
fn handler_failure_is_reported_not_raised() {
    let adapter = engine().single_shot();
    let response = adapter.handle(&CommandRequest::new("version; crash").with_roles([Role::Admin]));
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("disk on fire"));
    assert!(response.message.starts_with("CampusWorld v"));
}

#[test]
fn malformed_json_is_answered() {
    let response = engine().single_shot().handle_json("{not json");
    assert!(!response.success);
    assert!(response
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("invalid request:")));

    let line = response.to_json_line();
    let parsed: Value = serde_json::from_str(&line).expect("response is valid JSON");
    assert_eq!(parsed["success"], false);
    assert_eq!(parsed["data"], Value::Null);
}

#[test]
fn parse_error_rejects_whole_line() {
    let response = engine().single_shot().handle(&CommandRequest::new("version; --loud"));
    assert!(!response.success);
    assert!(response.data.is_none());
}
