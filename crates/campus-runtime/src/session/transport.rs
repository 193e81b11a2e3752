//! Transport handles held by the session manager.

use std::fmt;
use tokio::sync::watch;

/// Why a session's transport was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// Pushed out by a newer session at capacity.
    Evicted,
    /// No input within the idle timeout.
    IdleTimeout,
    /// Server shutting down.
    Shutdown,
    /// Peer went away or asked to quit.
    Disconnected,
}

impl CloseReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Evicted => "evicted",
            Self::IdleTimeout => "idle timeout",
            Self::Shutdown => "shutdown",
            Self::Disconnected => "disconnected",
        }
    }

    /// Line shown to the peer before the connection drops.
    #[must_use]
    pub fn notice(self) -> &'static str {
        match self {
            Self::Evicted => "Session closed: server at capacity.",
            Self::IdleTimeout => "Session closed: idle timeout.",
            Self::Shutdown => "Server shutting down.",
            Self::Disconnected => "Goodbye.",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection side of a session, as seen by the manager.
///
/// Closing is idempotent: the first reason sticks.
pub trait Transport: Send + Sync + fmt::Debug {
    fn close(&self, reason: CloseReason);

    fn is_closed(&self) -> bool;

    /// Remote address, if known.
    fn peer(&self) -> Option<String> {
        None
    }
}

/// [`Transport`] that signals a connection task through a watch channel.
///
/// # Example
///
/// ```
/// use campus_runtime::session::{ChannelTransport, CloseReason, Transport};
///
/// let (transport, signal) = ChannelTransport::new(Some("10.0.0.7:5000".into()));
/// transport.close(CloseReason::Evicted);
/// transport.close(CloseReason::Shutdown);
///
/// assert!(transport.is_closed());
/// assert_eq!(signal.reason(), Some(CloseReason::Evicted));
/// ```
#[derive(Debug)]
pub struct ChannelTransport {
    peer: Option<String>,
    tx: watch::Sender<Option<CloseReason>>,
}

impl ChannelTransport {
    /// Creates a transport and the signal its connection task waits on.
    #[must_use]
    pub fn new(peer: Option<String>) -> (Self, CloseSignal) {
        let (tx, rx) = watch::channel(None);
        (Self { peer, tx }, CloseSignal { rx })
    }
}

impl Transport for ChannelTransport {
    fn close(&self, reason: CloseReason) {
        self.tx.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason);
            true
        });
    }

    fn is_closed(&self) -> bool {
        self.tx.borrow().is_some()
    }

    fn peer(&self) -> Option<String> {
        self.peer.clone()
    }
}

/// Receiving half of a [`ChannelTransport`].
#[derive(Debug, Clone)]
pub struct CloseSignal {
    rx: watch::Receiver<Option<CloseReason>>,
}

impl CloseSignal {
    /// Close reason, if the transport has been closed.
    #[must_use]
    pub fn reason(&self) -> Option<CloseReason> {
        *self.rx.borrow()
    }

    /// Waits until the transport is closed.
    ///
    /// A dropped transport counts as [`CloseReason::Disconnected`].
    pub async fn closed(&mut self) -> CloseReason {
        loop {
            if let Some(reason) = *self.rx.borrow_and_update() {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                return CloseReason::Disconnected;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_until_closed() {
        let (transport, signal) = ChannelTransport::new(None);
        assert!(!transport.is_closed());
        assert_eq!(signal.reason(), None);
        assert_eq!(transport.peer(), None);

        transport.close(CloseReason::IdleTimeout);
        assert!(transport.is_closed());
        assert_eq!(signal.reason(), Some(CloseReason::IdleTimeout));
    }

    #[tokio::test]
    async fn closed_wakes_waiter() {
        let (transport, mut signal) = ChannelTransport::new(None);
        let waiter = tokio::spawn(async move { signal.closed().await });
        transport.close(CloseReason::Shutdown);
        assert_eq!(waiter.await.unwrap(), CloseReason::Shutdown);
    }

    #[tokio::test]
    async fn dropped_transport_reads_as_disconnect() {
        let (transport, mut signal) = ChannelTransport::new(None);
        drop(transport);
        assert_eq!(signal.closed().await, CloseReason::Disconnected);
    }

    #[test]
    fn reason_text() {
        assert_eq!(CloseReason::Evicted.to_string(), "evicted");
        assert!(CloseReason::IdleTimeout.notice().contains("idle"));
    }
}
