//! Bounded table of live interactive sessions.

use super::transport::{CloseReason, Transport};
use campus_types::{Principal, SessionId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Default session capacity.
pub const DEFAULT_MAX_SESSIONS: usize = 100;

/// Default idle timeout (30 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Snapshot of one session, as listed by `sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub username: String,
    pub caller: Principal,
    pub peer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl SessionInfo {
    /// Time since the last recorded activity, zero if `now` is earlier.
    #[must_use]
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_activity).to_std().unwrap_or_default()
    }
}

#[derive(Debug)]
struct Slot {
    info: SessionInfo,
    transport: Arc<dyn Transport>,
}

/// Owns the list of connected sessions.
///
/// Sessions are kept in arrival order. Registering past capacity closes and
/// drops the oldest one first.
///
/// # Example
///
/// ```
/// use campus_runtime::session::{ChannelTransport, CloseReason, SessionManager};
/// use campus_types::{Principal, SessionId};
/// use std::sync::Arc;
///
/// let manager = SessionManager::new(1);
///
/// let (first, signal) = ChannelTransport::new(None);
/// manager.register(SessionId::new(), "alice", Principal::Guest, Arc::new(first));
///
/// let (second, _signal) = ChannelTransport::new(None);
/// let evicted = manager.register(SessionId::new(), "bob", Principal::Guest, Arc::new(second));
///
/// assert_eq!(evicted.map(|info| info.username), Some("alice".to_string()));
/// assert_eq!(signal.reason(), Some(CloseReason::Evicted));
/// assert_eq!(manager.len(), 1);
/// ```
#[derive(Debug)]
pub struct SessionManager {
    capacity: usize,
    idle_timeout: Option<Duration>,
    started_at: DateTime<Utc>,
    slots: Mutex<VecDeque<Slot>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS).with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionManager {
    /// Manager holding at most `capacity` sessions (at least one), with no
    /// idle timeout.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            idle_timeout: None,
            started_at: Utc::now(),
            slots: Mutex::new(VecDeque::new()),
        }
    }

    /// Sets the idle timeout. A zero duration disables reaping.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// When this table was created, i.e. server start.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Adds a session. At capacity the oldest session is closed with
    /// [`CloseReason::Evicted`] and returned.
    pub fn register(
        &self,
        id: SessionId,
        username: impl Into<String>,
        caller: Principal,
        transport: Arc<dyn Transport>,
    ) -> Option<SessionInfo> {
        let now = Utc::now();
        let info = SessionInfo {
            id,
            username: username.into(),
            caller,
            peer: transport.peer(),
            created_at: now,
            last_activity: now,
        };

        let evicted = {
            let mut slots = self.slots.lock();
            let evicted = if slots.len() >= self.capacity {
                slots.pop_front()
            } else {
                None
            };
            slots.push_back(Slot { info, transport });
            evicted
        };

        info!(session = %id, capacity = self.capacity, "session registered");
        evicted.map(|slot| {
            info!(
                session = %slot.info.id,
                username = %slot.info.username,
                "session evicted"
            );
            slot.transport.close(CloseReason::Evicted);
            slot.info
        })
    }

    /// Records activity. Returns `false` if the session is unknown.
    pub fn touch(&self, id: SessionId) -> bool {
        let mut slots = self.slots.lock();
        match slots.iter_mut().find(|slot| slot.info.id == id) {
            Some(slot) => {
                slot.info.last_activity = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Drops a session without closing its transport.
    pub fn remove(&self, id: SessionId) -> Option<SessionInfo> {
        let mut slots = self.slots.lock();
        let index = slots.iter().position(|slot| slot.info.id == id)?;
        let slot = slots.remove(index)?;
        debug!(session = %id, "session removed");
        Some(slot.info)
    }

    /// Closes and drops sessions idle for longer than the timeout.
    pub fn reap_idle(&self, now: DateTime<Utc>) -> Vec<SessionInfo> {
        let Some(timeout) = self.idle_timeout else {
            return Vec::new();
        };

        let reaped: Vec<Slot> = {
            let mut slots = self.slots.lock();
            let (idle, live): (VecDeque<Slot>, VecDeque<Slot>) = slots
                .drain(..)
                .partition(|slot| slot.info.idle_for(now) > timeout);
            *slots = live;
            idle.into()
        };

        reaped
            .into_iter()
            .map(|slot| {
                info!(
                    session = %slot.info.id,
                    idle_secs = slot.info.idle_for(now).as_secs(),
                    "idle session reaped"
                );
                slot.transport.close(CloseReason::IdleTimeout);
                slot.info
            })
            .collect()
    }

    /// Closes every session. Returns how many were open.
    pub fn shutdown(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().drain(..).collect();
        for slot in &slots {
            slot.transport.close(CloseReason::Shutdown);
        }
        info!(count = slots.len(), "sessions shut down");
        slots.len()
    }

    /// Sessions, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<SessionInfo> {
        self.slots.lock().iter().map(|slot| slot.info.clone()).collect()
    }

    #[must_use]
    pub fn get(&self, id: SessionId) -> Option<SessionInfo> {
        self.slots
            .lock()
            .iter()
            .find(|slot| slot.info.id == id)
            .map(|slot| slot.info.clone())
    }

    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.slots.lock().iter().any(|slot| slot.info.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Spawns a task that reaps idle sessions every `period`.
    ///
    /// The task holds a weak reference and ends once the manager is dropped.
    pub fn spawn_reaper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);
        let period = period.max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    debug!("session manager dropped, reaper stopping");
                    break;
                };
                manager.reap_idle(Utc::now());
            }
        })
    }
}
