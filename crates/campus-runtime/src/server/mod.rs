//! TCP front ends.
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!   port ───────────►│ interactive accept loop      │──► InteractiveSession
//!                    └──────────────────────────────┘        per connection
//!                    ┌──────────────────────────────┐
//!   request_port ───►│ request accept loop          │──► SingleShotAdapter
//!                    └──────────────────────────────┘        per line
//!                                 │
//!                       Arc<CampusEngine> (registry, executor,
//!                       sessions, identities)
//! ```
//!
//! [`Server::bind`] claims both ports up front so bind errors surface
//! before anything is spawned. [`Server::run`] drives the listeners and
//! the idle reaper until a [`ShutdownHandle`] fires, then closes every
//! live session with the shutdown notice.

mod engine;
mod error;
mod interactive;
mod request;

pub use engine::CampusEngine;
pub use error::ServerError;
pub use interactive::{handle_connection, LOGIN_PROMPT, LOGIN_TIMEOUT};
pub use request::{serve_requests, MAX_REQUEST_LINE};

use crate::config::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// Stops a running [`Server`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Signals every listener and connection to stop.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Bound listeners plus the engine they serve.
#[derive(Debug)]
pub struct Server {
    engine: Arc<CampusEngine>,
    interactive: TcpListener,
    requests: Option<TcpListener>,
    reap_interval: Duration,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Server {
    /// Binds the interactive port and, if configured, the request port.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] naming the address that failed.
    pub async fn bind(engine: Arc<CampusEngine>, config: &ServerConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let interactive = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(&addr, e))?;

        let requests = match config.request_addr() {
            Some(addr) => Some(
                TcpListener::bind(&addr)
                    .await
                    .map_err(|e| ServerError::bind(&addr, e))?,
            ),
            None => None,
        };

        let (tx, _) = watch::channel(false);
        Ok(Self {
            engine,
            interactive,
            requests,
            reap_interval: config.reap_interval(),
            shutdown: Arc::new(tx),
        })
    }

    /// Actual interactive address; useful when bound to port 0.
    ///
    /// # Errors
    ///
    /// Propagates the socket error.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.interactive.local_addr()?)
    }

    /// Actual request address, if that listener is enabled.
    #[must_use]
    pub fn request_addr(&self) -> Option<SocketAddr> {
        self.requests
            .as_ref()
            .and_then(|listener| listener.local_addr().ok())
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<CampusEngine> {
        &self.engine
    }

    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown),
        }
    }

    /// Serves until the shutdown handle fires.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Task`] if the request listener task panicked.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self {
            engine,
            interactive,
            requests,
            reap_interval,
            shutdown,
        } = self;

        if let Ok(addr) = interactive.local_addr() {
            info!(addr = %addr, "interactive listener ready");
        }
        let reaper = engine.sessions().spawn_reaper(reap_interval);

        let request_task = requests.map(|listener| {
            if let Ok(addr) = listener.local_addr() {
                info!(addr = %addr, "request listener ready");
            }
            tokio::spawn(request::accept_loop(
                listener,
                engine.single_shot(),
                shutdown.subscribe(),
            ))
        });

        interactive::accept_loop(interactive, Arc::clone(&engine), shutdown.subscribe()).await;

        let closed = engine.sessions().shutdown();
        reaper.abort();
        if let Some(task) = request_task {
            task.await?;
        }
        info!(closed, "server stopped");
        Ok(())
    }
}
