//! Process-wide wiring.
//!
//! One [`CampusEngine`] is built at startup and shared by reference with
//! every listener and connection. Nothing in it is global state; tests
//! build as many as they like.

use super::ServerError;
use crate::auth::{Identity, IdentityProvider};
use crate::command::{
    builtin, CommandExecutor, CommandParser, CommandRegistry, DenialDisclosure, ExecutionContext,
};
use crate::config::{CampusConfig, ShellConfig};
use crate::io::Prompt;
use crate::protocol::{InteractiveSession, SingleShotAdapter};
use crate::session::SessionManager;
use campus_auth::RolePermissions;
use std::sync::Arc;

/// Registry, executor, session table and identity lookup for one server.
///
/// # Example
///
/// ```
/// use campus_runtime::config::CampusConfig;
/// use campus_runtime::protocol::CommandRequest;
/// use campus_runtime::server::CampusEngine;
///
/// let engine = CampusEngine::from_config(&CampusConfig::default()).unwrap();
/// let response = engine.single_shot().handle(&CommandRequest::new("whoami"));
/// assert!(response.success);
/// ```
#[derive(Debug, Clone)]
pub struct CampusEngine {
    registry: Arc<CommandRegistry>,
    executor: Arc<CommandExecutor>,
    sessions: Arc<SessionManager>,
    identities: Arc<dyn IdentityProvider>,
    roles: Arc<RolePermissions>,
    shell: ShellConfig,
}

impl CampusEngine {
    /// Builds the engine with the builtin command sets installed.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if `config` fails validation, or
    /// [`ServerError::Registry`] if the builtin sets cannot be assembled.
    pub fn from_config(config: &CampusConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let sessions = Arc::new(
            SessionManager::new(config.server.max_connections)
                .with_idle_timeout(config.server.idle_timeout()),
        );

        let registry = Arc::new(CommandRegistry::new());
        builtin::install(&registry, Arc::clone(&sessions))?;

        let disclosure = if config.shell.conceal_denials {
            DenialDisclosure::Conceal
        } else {
            DenialDisclosure::Reveal
        };
        let executor = Arc::new(
            CommandExecutor::new(Arc::clone(&registry))
                .with_parser(CommandParser::new(config.shell.separator))
                .with_disclosure(disclosure),
        );

        tracing::debug!(
            sets = registry.set_keys().len(),
            identities = config.identities.len(),
            capacity = sessions.capacity(),
            "engine assembled"
        );

        Ok(Self {
            registry,
            executor,
            sessions,
            identities: Arc::new(config.identity_provider()),
            roles: Arc::new(RolePermissions::standard()),
            shell: config.shell.clone(),
        })
    }

    /// Replaces the identity lookup.
    #[must_use]
    pub fn with_identities(mut self, identities: Arc<dyn IdentityProvider>) -> Self {
        self.identities = identities;
        self
    }

    #[must_use]
    pub fn with_role_permissions(mut self, roles: RolePermissions) -> Self {
        self.roles = Arc::new(roles);
        self
    }

    /// Registry for adding domain command sets.
    #[must_use]
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn executor(&self) -> &Arc<CommandExecutor> {
        &self.executor
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    #[must_use]
    pub fn identities(&self) -> &dyn IdentityProvider {
        self.identities.as_ref()
    }

    #[must_use]
    pub fn role_permissions(&self) -> &RolePermissions {
        &self.roles
    }

    #[must_use]
    pub fn shell(&self) -> &ShellConfig {
        &self.shell
    }

    /// Fresh context for `identity`.
    #[must_use]
    pub fn context_for(&self, identity: &Identity) -> ExecutionContext {
        ExecutionContext::new(
            identity.principal(),
            identity.username.clone(),
            identity.grants(&self.roles),
        )
    }

    /// Interactive session for `identity` with the configured prompt and
    /// history size.
    #[must_use]
    pub fn interactive_session(&self, identity: &Identity) -> InteractiveSession {
        InteractiveSession::new(Arc::clone(&self.executor), self.context_for(identity))
            .with_prompt(Prompt::new(self.shell.context_label.clone()))
            .with_history_size(self.shell.history_size)
    }

    #[must_use]
    pub fn single_shot(&self) -> SingleShotAdapter {
        SingleShotAdapter::new(Arc::clone(&self.executor))
            .with_role_permissions(Arc::clone(&self.roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CommandRequest;
    use campus_auth::Role;

    fn config() -> CampusConfig {
        CampusConfig {
            identities: vec![Identity::new("root").with_roles([Role::Owner])],
            ..Default::default()
        }
    }

    #[test]
    fn installs_builtin_sets() {
        let engine = CampusEngine::from_config(&config()).unwrap();
        assert_eq!(
            engine.registry().set_keys(),
            [builtin::SYSTEM_SET, builtin::ADMIN_SET]
        );
        assert_eq!(engine.sessions().capacity(), 100);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = config();
        config.server.max_connections = 0;
        let err = CampusEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn separator_and_disclosure_follow_config() {
        let mut config = config();
        config.shell.separator = '|';
        config.shell.conceal_denials = true;
        let engine = CampusEngine::from_config(&config).unwrap();
        let adapter = engine.single_shot();

        let response = adapter.handle(&CommandRequest::new("version | time"));
        assert!(response.success);
        assert_eq!(response.message.lines().count(), 2);

        let response = adapter.handle(&CommandRequest::new("sessions"));
        assert_eq!(response.error.as_deref(), Some("not found"));
    }

    #[test]
    fn interactive_session_uses_identity_grants() {
        let engine = CampusEngine::from_config(&config()).unwrap();
        let identity = engine.identities().identify("root");
        let mut session = engine.interactive_session(&identity);
        let out = String::from_utf8_lossy(&session.feed(b"sessions\r")).into_owned();
        assert!(out.contains("0 active session(s)"));
        assert_eq!(session.context().username(), "root");
    }
}
