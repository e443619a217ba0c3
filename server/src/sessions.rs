use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use inkroom_shared::{SessionId, Snapshot, Stroke};
use tokio::sync::RwLock;
use tracing::info;

use crate::peers::ConnectionId;

/// Canonical drawing state of one session. Only the engine's commands
/// change it; outside the crate it is readable through [`SessionState::snapshot`].
///
/// ```compile_fail
/// let mut state = inkroom_server::sessions::SessionState::new();
/// state.committed.clear();
/// ```
#[derive(Debug)]
pub struct SessionState {
    /// Render order, later strokes on top.
    pub(crate) committed: Vec<Stroke>,
    /// Last element is restored first.
    pub(crate) redo: Vec<Stroke>,
    /// Author -> index into `committed` of the stroke they are still drawing.
    pub(crate) open_strokes: HashMap<ConnectionId, usize>,
    /// Set while the session has no members.
    pub(crate) vacated_at: Option<Instant>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            committed: Vec::new(),
            redo: Vec::new(),
            open_strokes: HashMap::new(),
            vacated_at: Some(Instant::now()),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            lines: self.committed.clone(),
            redo_stack: self.redo.clone(),
        }
    }

    fn idle_for(&self, ttl: Duration, now: Instant) -> bool {
        self.vacated_at
            .is_some_and(|since| now.saturating_duration_since(since) >= ttl)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedSession = Arc<RwLock<SessionState>>;

/// Session id -> state. Each session carries its own lock; the map itself is
/// sharded so lookups for unrelated sessions never contend on one lock.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, SharedSession>,
}

impl SessionStore {
    pub fn get(&self, session_id: &SessionId) -> Option<SharedSession> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
    }

    pub fn create_if_absent(&self, session_id: &SessionId) -> SharedSession {
        if let Some(session) = self.get(session_id) {
            return session;
        }
        self.sessions
            .entry(session_id.clone())
            .or_insert_with(|| {
                info!(session = %session_id, "creating session");
                Arc::new(RwLock::new(SessionState::new()))
            })
            .value()
            .clone()
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops every session that has been without members for at least `ttl`.
    /// Sessions whose lock is currently held are in use and are kept.
    pub fn remove_idle(
        &self,
        ttl: Duration,
        now: Instant,
        is_occupied: impl Fn(&SessionId) -> bool,
    ) -> Vec<SessionId> {
        let candidates = self
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect::<Vec<_>>();
        candidates
            .into_iter()
            .filter(|session_id| {
                self.sessions
                    .remove_if(session_id, |session_id, session| {
                        !is_occupied(session_id)
                            && session
                                .try_read()
                                .is_ok_and(|state| state.idle_for(ttl, now))
                    })
                    .is_some()
            })
            .collect()
    }
}
