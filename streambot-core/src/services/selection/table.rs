// File: streambot-core/src/services/selection/table.rs

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::session::{SelectionSession, SessionKey};

/// A live session plus its expiry timer.
///
/// The tokio mutex serializes events for one session in arrival order.
pub struct SessionHandle {
    id: u64,
    key: SessionKey,
    pub session: Mutex<SelectionSession>,
    timer: parking_lot::Mutex<Option<AbortHandle>>,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }
}

/// All open browse sessions, indexed by id (from component custom ids)
/// and by (owner, channel) for supersession.
pub struct SessionTable {
    by_id: DashMap<u64, Arc<SessionHandle>>,
    by_key: DashMap<SessionKey, u64>,
    next_id: AtomicU64,
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTable {
    pub fn new() -> Self {
        // Random start so controls left over from a previous process never
        // line up with a fresh session id.
        let seed = u64::from(rand::random::<u32>()) << 16;
        Self {
            by_id: DashMap::new(),
            by_key: DashMap::new(),
            next_id: AtomicU64::new(seed.max(1)),
        }
    }

    pub fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Registers `session` and arms a bare expiry timer for it. Returns the
    /// new handle and the session it superseded for the same key, if any.
    pub fn insert(
        self: &Arc<Self>,
        session: SelectionSession,
    ) -> (Arc<SessionHandle>, Option<Arc<SessionHandle>>) {
        let id = session.id();
        let key = session.key();
        let handle = Arc::new(SessionHandle {
            id,
            key,
            session: Mutex::new(session),
            timer: parking_lot::Mutex::new(None),
        });

        self.by_id.insert(id, Arc::clone(&handle));
        let superseded = match self.by_key.insert(key, id) {
            Some(previous) if previous != id => {
                debug!("Session {previous} superseded by {id} for owner {}", key.owner_id);
                self.by_id.remove(&previous).map(|(_, old)| {
                    old.cancel_timer();
                    old
                })
            }
            _ => None,
        };

        self.arm_expiry(&handle, |_| std::future::ready(()));
        (handle, superseded)
    }

    pub fn get(&self, id: u64) -> Option<Arc<SessionHandle>> {
        self.by_id.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn get_by_key(&self, key: &SessionKey) -> Option<Arc<SessionHandle>> {
        let id = *self.by_key.get(key)?;
        self.get(id)
    }

    /// Drops the session and cancels its timer.
    pub fn remove(&self, id: u64) -> Option<Arc<SessionHandle>> {
        let (_, handle) = self.by_id.remove(&id)?;
        self.by_key.remove_if(&handle.key, |_, current| *current == id);
        handle.cancel_timer();
        Some(handle)
    }

    /// Spawns the inactivity timer for `handle`, replacing any earlier one.
    /// When it fires on a still idle session, the session is expired and
    /// removed, then `on_expire` runs. Removing the session any other way
    /// aborts the timer.
    pub fn arm_expiry<F, Fut>(self: &Arc<Self>, handle: &Arc<SessionHandle>, on_expire: F)
    where
        F: FnOnce(Arc<SessionHandle>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let table = Arc::clone(self);
        let watched = Arc::clone(handle);

        let task = tokio::spawn(async move {
            loop {
                let deadline = watched.session.lock().await.deadline();
                tokio::time::sleep_until(deadline).await;

                let mut session = watched.session.lock().await;
                if session.is_terminal() {
                    return;
                }
                if session.check_expiry(Instant::now()) {
                    drop(session);
                    trace!("Session {} expired", watched.id);
                    // Detach ourselves first so `remove` does not abort this task.
                    watched.timer.lock().take();
                    if table.remove(watched.id).is_some() {
                        on_expire(watched).await;
                    }
                    return;
                }
                // Deadline moved by navigation; sleep again.
            }
        });

        if let Some(previous) = handle.timer.lock().replace(task.abort_handle()) {
            previous.abort();
        }
    }
}
