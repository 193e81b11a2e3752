//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! Configuration is loaded from multiple sources with priority-based merging:
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌───────────────────────────────────────────┐
//! │  1. CLI flags (campus serve --port …)     │  Per invocation
//! ├───────────────────────────────────────────┤
//! │  2. Environment Variables (CAMPUS_*)      │  Runtime override
//! ├───────────────────────────────────────────┤
//! │  3. Project Config (.campus/config.toml)  │  Deployment-specific
//! ├───────────────────────────────────────────┤
//! │  4. Global Config (~/.campus/config.toml) │  Host defaults
//! ├───────────────────────────────────────────┤
//! │  5. Default Values (compile-time)         │  Fallback
//! └───────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `CAMPUS_DEBUG` | `debug` | bool |
//! | `CAMPUS_HOST` | `server.host` | String |
//! | `CAMPUS_PORT` | `server.port` | u16 |
//! | `CAMPUS_REQUEST_PORT` | `server.request_port` | u16 |
//! | `CAMPUS_MAX_CONNECTIONS` | `server.max_connections` | usize |
//! | `CAMPUS_IDLE_TIMEOUT` | `server.idle_timeout_secs` | u64 |
//! | `CAMPUS_CONTEXT_LABEL` | `shell.context_label` | String |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.campus/config.toml
//! debug = false
//!
//! [server]
//! host = "0.0.0.0"
//! port = 2222
//! request_port = 2223
//! max_connections = 100
//! idle_timeout_secs = 1800
//!
//! [shell]
//! separator = ";"
//! history_size = 100
//! context_label = "campusworld"
//! conceal_denials = false
//!
//! [guest]
//! username = "guest"
//! roles = ["guest"]
//!
//! [[identities]]
//! username = "alice"
//! caller_id = "u-1001"
//! roles = ["admin"]
//!
//! [[identities]]
//! username = "bob"
//! permissions = ["world.*"]
//! access_level = "moderator"
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{CampusConfig, ServerConfig, ShellConfig, DEFAULT_BANNER};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".campus")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".campus";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
