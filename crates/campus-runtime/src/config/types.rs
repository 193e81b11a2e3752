//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use super::ConfigError;
use crate::auth::{Identity, StaticIdentities};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default banner shown before the login prompt.
pub const DEFAULT_BANNER: &str = "Welcome to CampusWorld.\nType 'help' for available commands.";

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers.
///
/// # Example
///
/// ```
/// use campus_runtime::config::CampusConfig;
///
/// let config = CampusConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.server.port, 2222);
/// assert_eq!(config.shell.separator, ';');
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CampusConfig {
    /// Enable debug logging.
    pub debug: bool,

    /// Listener configuration.
    pub server: ServerConfig,

    /// Interactive shell configuration.
    pub shell: ShellConfig,

    /// Identity given to unknown usernames.
    pub guest: Identity,

    /// Known callers.
    pub identities: Vec<Identity>,
}

impl CampusConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they differ
    /// from the default. Identities are merged by username, later layers
    /// replacing earlier ones.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.debug != default.debug {
            self.debug = other.debug;
        }
        self.server.merge(&other.server);
        self.shell.merge(&other.shell);
        if other.guest != default.guest {
            self.guest = other.guest.clone();
        }
        for identity in &other.identities {
            match self
                .identities
                .iter_mut()
                .find(|known| known.username.eq_ignore_ascii_case(&identity.username))
            {
                Some(known) => *known = identity.clone(),
                None => self.identities.push(identity.clone()),
            }
        }
    }

    /// Rejects values the server cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_connections == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_connections",
                "must be at least 1",
            ));
        }
        if self.server.reap_interval_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.reap_interval_secs",
                "must be at least 1",
            ));
        }
        if self.shell.separator.is_whitespace() || self.shell.separator == '-' {
            return Err(ConfigError::invalid_value(
                "shell.separator",
                "must not be whitespace or '-'",
            ));
        }
        if let Some(identity) = self
            .identities
            .iter()
            .find(|identity| identity.username.trim().is_empty())
        {
            return Err(ConfigError::invalid_value(
                "identities.username",
                format!("empty username (caller id {:?})", identity.caller_id),
            ));
        }
        Ok(())
    }

    /// Identity lookup over `[guest]` and `[[identities]]`.
    #[must_use]
    pub fn identity_provider(&self) -> StaticIdentities {
        let mut provider = StaticIdentities::new(self.guest.clone());
        for identity in &self.identities {
            provider.insert(identity.clone());
        }
        provider
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Interactive (line session) port.
    pub port: u16,

    /// JSON-lines request port. Disabled when absent.
    pub request_port: Option<u16>,

    /// Interactive sessions kept before the oldest is evicted.
    pub max_connections: usize,

    /// Seconds without input before a session is closed; 0 disables.
    pub idle_timeout_secs: u64,

    /// Seconds between idle sweeps.
    pub reap_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 2222,
            request_port: None,
            max_connections: 100,
            idle_timeout_secs: 1800,
            reap_interval_secs: 60,
        }
    }
}

impl ServerConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.host != default.host {
            self.host = other.host.clone();
        }
        if other.port != default.port {
            self.port = other.port;
        }
        if other.request_port.is_some() {
            self.request_port = other.request_port;
        }
        if other.max_connections != default.max_connections {
            self.max_connections = other.max_connections;
        }
        if other.idle_timeout_secs != default.idle_timeout_secs {
            self.idle_timeout_secs = other.idle_timeout_secs;
        }
        if other.reap_interval_secs != default.reap_interval_secs {
            self.reap_interval_secs = other.reap_interval_secs;
        }
    }

    /// `host:port` of the interactive listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `host:request_port`, if the request listener is enabled.
    #[must_use]
    pub fn request_addr(&self) -> Option<String> {
        self.request_port.map(|port| format!("{}:{port}", self.host))
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    #[must_use]
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

/// Interactive shell configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    /// Invocation separator within one line.
    pub separator: char,

    /// Lines remembered per session.
    pub history_size: usize,

    /// Prompt label when no game is active.
    pub context_label: String,

    /// Shown on connect, before login.
    pub banner: String,

    /// Report denied commands as unknown.
    pub conceal_denials: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            separator: crate::command::DEFAULT_SEPARATOR,
            history_size: crate::io::DEFAULT_HISTORY_SIZE,
            context_label: crate::io::DEFAULT_CONTEXT_LABEL.into(),
            banner: DEFAULT_BANNER.into(),
            conceal_denials: false,
        }
    }
}

impl ShellConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.separator != default.separator {
            self.separator = other.separator;
        }
        if other.history_size != default.history_size {
            self.history_size = other.history_size;
        }
        if other.context_label != default.context_label {
            self.context_label = other.context_label.clone();
        }
        if other.banner != default.banner {
            self.banner = other.banner.clone();
        }
        if other.conceal_denials != default.conceal_denials {
            self.conceal_denials = other.conceal_denials;
        }
    }
}
