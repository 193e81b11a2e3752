//! Interactive TCP connections.
//!
//! ```text
//! accept ─► banner ─► "login: " ─► identify ─► register ─► greeting
//!                                                             │
//!            ┌────────────── read bytes ◄─────────────────────┘
//!            ▼
//!     feed (blocking pool) ─► write ─► closed? ─► remove
//!            ▲                               │ no
//!            └───────────────────────────────┘
//!    close signal (evicted / idle / shutdown) ─► notice ─► remove
//! ```

use super::{CampusEngine, ServerError};
use crate::io::{screen, EditAction, LineEditor};
use crate::protocol::InteractiveSession;
use crate::session::{ChannelTransport, CloseReason, CloseSignal};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Prompt shown during the login phase.
pub const LOGIN_PROMPT: &str = "login: ";

/// Time allowed to type a username.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(60);

const READ_BUFFER: usize = 1024;

/// Accepts connections until `shutdown` flips to `true`.
pub(super) async fn accept_loop(
    listener: TcpListener,
    engine: Arc<CampusEngine>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let engine = Arc::clone(&engine);
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, peer, engine, shutdown).await {
                            debug!(peer = %peer, error = %err, "connection ended with error");
                        }
                    });
                }
                Err(err) => warn!(error = %err, "interactive accept failed"),
            },
        }
    }
    debug!("interactive listener stopped");
}

/// Runs one connection from banner to close.
///
/// # Errors
///
/// Returns [`ServerError::Io`] on socket failure and
/// [`ServerError::LoginTimeout`] if no username arrives in time. Either
/// way only this connection is affected.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    engine: Arc<CampusEngine>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();
    info!(peer = %peer, "connection accepted");

    let mut out = Vec::new();
    if !engine.shell().banner.is_empty() {
        screen::write_line(&mut out, &engine.shell().banner);
    }
    out.extend_from_slice(LOGIN_PROMPT.as_bytes());
    writer.write_all(&out).await?;

    let login = tokio::time::timeout(
        LOGIN_TIMEOUT,
        read_username(&mut reader, &mut writer, shutdown),
    )
    .await
    .map_err(|_| ServerError::LoginTimeout)??;
    let Some(username) = login else {
        debug!(peer = %peer, "left during login");
        return Ok(());
    };

    let identity = engine.identities().identify(&username);
    let mut session = engine.interactive_session(&identity);
    let session_id = *session.context().session_id();

    let (transport, mut closed) = ChannelTransport::new(Some(peer.to_string()));
    engine.sessions().register(
        session_id,
        identity.username.clone(),
        identity.principal(),
        Arc::new(transport),
    );
    info!(
        peer = %peer,
        session = %session_id.short(),
        username = %identity.username,
        guest = identity.is_guest(),
        "logged in"
    );

    let greeting = format!("Logged in as {}.", identity.username);
    writer.write_all(&session.greeting(&greeting)).await?;

    let result = run_session(&mut reader, &mut writer, &engine, session, &mut closed).await;

    engine.sessions().remove(session_id);
    info!(session = %session_id.short(), "session ended");
    result
}

async fn run_session(
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
    engine: &CampusEngine,
    mut session: InteractiveSession,
    closed: &mut CloseSignal,
) -> Result<(), ServerError> {
    let session_id = *session.context().session_id();
    let mut buf = [0u8; READ_BUFFER];

    loop {
        tokio::select! {
            reason = closed.closed() => {
                notify_close(writer, reason).await;
                return Ok(());
            }
            read = reader.read(&mut buf) => {
                let n = read?;
                if n == 0 {
                    return Ok(());
                }
                engine.sessions().touch(session_id);

                // Handlers may block; keep them off the async workers.
                let chunk = buf[..n].to_vec();
                let (returned, out) = tokio::task::spawn_blocking(move || {
                    let out = session.feed(&chunk);
                    (session, out)
                })
                .await?;
                session = returned;

                writer.write_all(&out).await?;
                if session.is_closed() {
                    let _ = writer.shutdown().await;
                    return Ok(());
                }
            }
        }
    }
}

async fn notify_close(writer: &mut OwnedWriteHalf, reason: CloseReason) {
    let mut out = screen::NEWLINE.to_vec();
    screen::write_line(&mut out, reason.notice());
    if let Err(err) = writer.write_all(&out).await {
        debug!(error = %err, "close notice not delivered");
    }
    let _ = writer.shutdown().await;
}

/// Runs the login prompt. `None` if the peer left or the server stopped.
async fn read_username(
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
    mut shutdown: watch::Receiver<bool>,
) -> Result<Option<String>, ServerError> {
    let mut editor = LineEditor::new(0);
    editor.set_prompt(LOGIN_PROMPT);
    let none: Vec<String> = Vec::new();
    let mut buf = [0u8; READ_BUFFER];

    loop {
        let n = tokio::select! {
            _ = shutdown.changed() => return Ok(None),
            read = reader.read(&mut buf) => read?,
        };
        if n == 0 {
            return Ok(None);
        }

        let mut out = Vec::new();
        for action in editor.feed(&buf[..n], &none, &mut out) {
            match action {
                EditAction::Submit(name) => {
                    writer.write_all(&out).await?;
                    return Ok(Some(name.trim().to_string()));
                }
                EditAction::Reprompt | EditAction::Cancel => editor.render_prompt(&mut out),
                EditAction::Disconnect => {
                    writer.write_all(&out).await?;
                    return Ok(None);
                }
            }
        }
        writer.write_all(&out).await?;
    }
}
