//! campus CLI - command engine front end
//!
//! # Subcommands
//!
//! - `campus serve`: run the interactive and JSON-lines TCP listeners
//! - `campus exec <line>`: run one command line and print the result
//! - `campus request [JSON]`: answer one JSON request (argument or stdin)
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`CAMPUS_*`)
//! 3. Project config (`.campus/config.toml` in the project root)
//! 4. Global config (`~/.campus/config.toml`, or `--config`)
//! 5. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `CAMPUS_DEBUG`: Enable debug mode (`true`/`false`)
//! - `CAMPUS_HOST` / `CAMPUS_PORT` / `CAMPUS_REQUEST_PORT`: Listener addresses
//! - `CAMPUS_MAX_CONNECTIONS`: Interactive session capacity
//! - `CAMPUS_IDLE_TIMEOUT`: Idle seconds before a session is closed
//! - `CAMPUS_CONTEXT_LABEL`: Prompt label outside games
//! - `RUST_LOG`: Terminal log filter when neither `--debug` nor `--verbose`

mod tracing_writer;

use anyhow::{Context, Result};
use campus_auth::{AccessLevel, Role};
use campus_runtime::auth::Identity;
use campus_runtime::config::{CampusConfig, ConfigError, ConfigLoader};
use campus_runtime::protocol::CommandResponse;
use campus_runtime::server::{CampusEngine, Server};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// campus - command dispatch engine for CampusWorld
#[derive(Parser, Debug)]
#[command(name = "campus")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Global config file (defaults to ~/.campus/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to this file (plain text, debug level)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the TCP listeners until interrupted
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Interactive port (0 picks a free port)
        #[arg(short, long)]
        port: Option<u16>,

        /// JSON-lines request port
        #[arg(long)]
        request_port: Option<u16>,

        /// Interactive session capacity
        #[arg(long)]
        max_connections: Option<usize>,
    },

    /// Run one command line and print the result
    Exec {
        /// Run as this configured user (unknown names get the guest identity)
        #[arg(short, long)]
        user: Option<String>,

        /// Replace the caller's roles (repeatable)
        #[arg(short, long = "role", value_name = "ROLE")]
        roles: Vec<Role>,

        /// Grant an extra permission token (repeatable)
        #[arg(long = "permission", value_name = "TOKEN")]
        permissions: Vec<String>,

        /// Override the access level
        #[arg(long)]
        access_level: Option<AccessLevel>,

        /// Game state entry as KEY=VALUE; VALUE is JSON or a bare string (repeatable)
        #[arg(long = "state", value_name = "KEY=VALUE")]
        state: Vec<String>,

        /// Print the JSON response instead of the message
        #[arg(long)]
        json: bool,

        /// Command line
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },

    /// Answer one JSON request from the argument or stdin
    Request {
        /// Request document; read from stdin when absent
        json: Option<String>,
    },
}

/// CLI-based configuration resolver.
///
/// Merges file/env config via [`ConfigLoader`] and applies CLI argument
/// overrides as the highest-priority layer.
#[derive(Debug)]
struct CliConfigResolver {
    project_root: PathBuf,
    global_config: Option<PathBuf>,
    debug: bool,
    host: Option<String>,
    port: Option<u16>,
    request_port: Option<u16>,
    max_connections: Option<usize>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let project_root = args.project.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get current directory, using '.'");
                PathBuf::from(".")
            })
        });

        let mut resolver = Self {
            project_root,
            global_config: args.config.clone(),
            debug: args.debug,
            host: None,
            port: None,
            request_port: None,
            max_connections: None,
        };
        if let Command::Serve {
            host,
            port,
            request_port,
            max_connections,
        } = &args.command
        {
            resolver.host.clone_from(host);
            resolver.port = *port;
            resolver.request_port = *request_port;
            resolver.max_connections = *max_connections;
        }
        resolver
    }

    fn resolve(&self) -> Result<CampusConfig, ConfigError> {
        let mut loader = ConfigLoader::new().with_project_root(&self.project_root);
        if let Some(ref path) = self.global_config {
            loader = loader.with_global_config(path);
        }
        let mut config = loader.load()?;

        // CLI args override (highest priority)
        if self.debug {
            config.debug = true;
        }
        if let Some(ref host) = self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(port) = self.request_port {
            config.server.request_port = Some(port);
        }
        if let Some(max) = self.max_connections {
            config.server.max_connections = max;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args)?;

    let resolver = CliConfigResolver::from_args(&args);
    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
    info!(path = %resolver.project_root.display(), "Project root");

    let engine = CampusEngine::from_config(&config).context("failed to assemble engine")?;

    match args.command {
        Command::Serve { .. } => serve(engine, &config).await,
        Command::Exec {
            user,
            roles,
            permissions,
            access_level,
            state,
            json,
            line,
        } => {
            let mut identity = match user {
                Some(ref name) => engine.identities().identify(name),
                None => Identity::new("cli"),
            };
            if !roles.is_empty() {
                identity.roles = roles;
            }
            identity.permissions.extend(permissions);
            if access_level.is_some() {
                identity.access_level = access_level;
            }
            let game_state = parse_state(&state)?;
            let line = line.join(" ");
            info!(user = %identity.username, line = %line, "Command mode");

            let mut ctx = engine.context_for(&identity).with_game_state(game_state);
            let results = engine.executor().execute(&line, &mut ctx);
            Ok(print_response(&CommandResponse::fold(&results), json))
        }
        Command::Request { json } => {
            let text = match json {
                Some(text) => text,
                None => {
                    let mut text = String::new();
                    std::io::stdin()
                        .read_to_string(&mut text)
                        .context("failed to read request from stdin")?;
                    text
                }
            };
            let response = engine.single_shot().handle_json(text.trim());
            Ok(print_response(&response, true))
        }
    }
}

/// Terminal filter: --debug > --verbose > RUST_LOG env > default "warn".
/// File layer (--log-file): independent "debug" filter, ANSI disabled.
fn init_tracing(args: &Args) -> Result<()> {
    let terminal_filter = if args.debug {
        EnvFilter::new("debug,tokio=warn")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if let Some(ref path) = args.log_file {
        let file_writer = tracing_writer::FileMakeWriter::open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        let file_layer = fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(file_writer);

        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .with(file_layer.with_filter(EnvFilter::new("debug")))
            .init();
        info!(path = %path.display(), "File logging enabled");
    } else {
        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .init();
    }
    Ok(())
}

async fn serve(engine: CampusEngine, config: &CampusConfig) -> Result<ExitCode> {
    let server = Server::bind(Arc::new(engine), &config.server).await?;
    let addr = server.local_addr()?;
    println!("campus v{} listening on {addr}", env!("CARGO_PKG_VERSION"));
    if let Some(request_addr) = server.request_addr() {
        println!("requests on {request_addr}");
    }

    let shutdown = server.shutdown_handle();
    let mut running = tokio::spawn(server.run());

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("Interrupted, shutting down");
            shutdown.trigger();
            running.await??;
        }
        finished = &mut running => finished??,
    }
    Ok(ExitCode::SUCCESS)
}

fn print_response(response: &CommandResponse, json: bool) -> ExitCode {
    if json {
        println!("{}", response.to_json_line());
    } else if !response.message.is_empty() {
        println!("{}", response.message);
    }
    if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Parses repeated `KEY=VALUE` pairs. Values that are not valid JSON are
/// taken as strings, so `--state current_game=chess` works unquoted.
fn parse_state(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut state = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("invalid --state '{pair}': expected KEY=VALUE"))?;
        let key = key.trim();
        anyhow::ensure!(!key.is_empty(), "invalid --state '{pair}': empty key");
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        state.insert(key.to_string(), value);
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("valid argv")
    }

    /// Resolver rooted in an empty project with no global config file.
    fn isolated(argv: &[&str]) -> (tempfile::TempDir, CliConfigResolver) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut resolver = CliConfigResolver::from_args(&args(argv));
        resolver.project_root = dir.path().to_path_buf();
        resolver.global_config = Some(dir.path().join("absent.toml"));
        (dir, resolver)
    }

    #[test]
    fn serve_flags_override_config() {
        let (_dir, resolver) = isolated(&[
            "campus",
            "serve",
            "--host",
            "127.0.0.1",
            "--port",
            "0",
            "--request-port",
            "4001",
        ]);
        let config = resolver.resolve().expect("resolve should succeed");

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 0);
        assert_eq!(config.server.request_port, Some(4001));
    }

    #[test]
    fn debug_flag_is_global() {
        let (_dir, resolver) = isolated(&["campus", "--debug", "exec", "help"]);
        assert!(resolver.debug);
        assert!(resolver.resolve().expect("resolve").debug);
    }

    #[test]
    fn project_config_is_read() {
        let (dir, resolver) = isolated(&["campus", "request"]);
        let campus_dir = dir.path().join(".campus");
        std::fs::create_dir_all(&campus_dir).unwrap();
        std::fs::write(
            campus_dir.join("config.toml"),
            "[shell]\nseparator = \"|\"\n",
        )
        .unwrap();

        let config = resolver.resolve().expect("resolve should succeed");
        assert_eq!(config.shell.separator, '|');
    }

    #[test]
    fn invalid_override_is_rejected() {
        let (_dir, resolver) = isolated(&["campus", "serve", "--max-connections", "0"]);
        assert!(resolver.resolve().is_err());
    }

    #[test]
    fn exec_collects_roles_and_line() {
        let parsed = args(&[
            "campus", "exec", "-r", "admin", "--role", "dev", "--permission", "world.*", "look",
            "-v", "north",
        ]);
        let Command::Exec {
            roles,
            permissions,
            line,
            ..
        } = parsed.command
        else {
            panic!("expected exec");
        };
        assert_eq!(roles, [Role::Admin, Role::Developer]);
        assert_eq!(permissions, ["world.*"]);
        assert_eq!(line, ["look", "-v", "north"]);
    }

    #[test]
    fn parse_state_accepts_json_and_bare_strings() {
        let state = parse_state(&[
            "current_game=chess".into(),
            "turn=3".into(),
            "board={\"e4\":\"pawn\"}".into(),
        ])
        .unwrap();
        assert_eq!(state["current_game"], json!("chess"));
        assert_eq!(state["turn"], json!(3));
        assert_eq!(state["board"]["e4"], json!("pawn"));

        assert!(parse_state(&["novalue".into()]).is_err());
        assert!(parse_state(&["=1".into()]).is_err());
    }
}
