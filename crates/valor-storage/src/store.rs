//! Per-user session store.
//!
//! [`SessionStore`] is the seam the HTTP layer talks to. The only
//! implementation, [`MemorySessionStore`], keeps sessions in a bounded
//! least-recently-used map: once `capacity` sessions exist, creating another
//! evicts whichever session was touched longest ago.
//!
//! All operations take one short-lived lock; nothing here is held across an
//! `.await`, so the store is safe to share behind an `Arc` in async handlers.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;
use valor_core::models::message::{Message, MessageContent, Role};
use valor_core::models::session::Session;

use crate::error::StorageError;
use crate::snapshot::SessionSnapshot;

pub const DEFAULT_CAPACITY: usize = 1024;

pub trait SessionStore: Send + Sync {
    /// Return a copy of the user's session, creating it seeded with the
    /// system instruction on first reference.
    ///
    /// An empty `user_id` yields a fresh seeded session that is not stored.
    fn get(&self, user_id: &str) -> Session;

    fn append_user_message(
        &self,
        user_id: &str,
        content: MessageContent,
    ) -> Result<(), StorageError>;

    fn append_assistant_message(
        &self,
        user_id: &str,
        content: MessageContent,
    ) -> Result<(), StorageError>;

    /// Append a completed user/assistant turn as one adjacent pair.
    fn append_exchange(
        &self,
        user_id: &str,
        user: Message,
        assistant: Message,
    ) -> Result<(), StorageError>;

    /// Reset the transcript to just the system instruction.
    fn clear(&self, user_id: &str) -> Result<(), StorageError>;

    /// All sessions, least recently used first.
    fn snapshot(&self) -> SessionSnapshot;

    /// Replace the store contents with `snapshot`.
    fn restore(&self, snapshot: SessionSnapshot);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct MemorySessionStore {
    system_prompt: String,
    inner: Mutex<LruSessions>,
}

impl MemorySessionStore {
    pub fn new(system_prompt: impl Into<String>, capacity: usize) -> Result<Self, StorageError> {
        if capacity == 0 {
            return Err(StorageError::ZeroCapacity);
        }
        Ok(Self {
            system_prompt: system_prompt.into(),
            inner: Mutex::new(LruSessions {
                capacity,
                tick: 0,
                entries: HashMap::new(),
                order: BTreeMap::new(),
            }),
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    fn lock(&self) -> MutexGuard<'_, LruSessions> {
        // A panic mid-append leaves at worst a half-written turn; keep serving.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, StorageError> {
        if user_id.is_empty() {
            return Err(StorageError::EmptyUserId);
        }
        let mut sessions = self.lock();
        let session = sessions.touch(user_id, &self.system_prompt);
        Ok(f(session))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, user_id: &str) -> Session {
        self.with_session(user_id, |session| session.clone())
            .unwrap_or_else(|_| Session::new(user_id, &self.system_prompt))
    }

    fn append_user_message(
        &self,
        user_id: &str,
        content: MessageContent,
    ) -> Result<(), StorageError> {
        self.with_session(user_id, |session| {
            session.push(Message::new(Role::User, content));
        })
    }

    fn append_assistant_message(
        &self,
        user_id: &str,
        content: MessageContent,
    ) -> Result<(), StorageError> {
        self.with_session(user_id, |session| {
            session.push(Message::new(Role::Assistant, content));
        })
    }

    fn append_exchange(
        &self,
        user_id: &str,
        user: Message,
        assistant: Message,
    ) -> Result<(), StorageError> {
        self.with_session(user_id, |session| {
            session.push(user);
            session.push(assistant);
        })
    }

    fn clear(&self, user_id: &str) -> Result<(), StorageError> {
        self.with_session(user_id, Session::reset)
    }

    fn snapshot(&self) -> SessionSnapshot {
        let sessions = self.lock();
        SessionSnapshot {
            sessions: sessions
                .order
                .values()
                .filter_map(|user_id| sessions.entries.get(user_id))
                .map(|entry| entry.session.clone())
                .collect(),
        }
    }

    fn restore(&self, snapshot: SessionSnapshot) {
        let mut sessions = self.lock();
        sessions.entries.clear();
        sessions.order.clear();

        let skip = snapshot.sessions.len().saturating_sub(sessions.capacity);
        for session in snapshot.sessions.into_iter().skip(skip) {
            if session.user_id.is_empty() {
                continue;
            }
            sessions.insert(session);
        }

        debug!(sessions = sessions.entries.len(), "session store restored");
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

struct LruSessions {
    capacity: usize,
    tick: u64,
    entries: HashMap<String, Entry>,
    /// last-used tick → user id; the first key is the eviction candidate.
    order: BTreeMap<u64, String>,
}

struct Entry {
    session: Session,
    last_used: u64,
}

impl LruSessions {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, user_id: &str, system_prompt: &str) -> &mut Session {
        if !self.entries.contains_key(user_id) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let tick = self.next_tick();
        let entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| Entry {
                session: Session::new(user_id, system_prompt),
                last_used: tick,
            });
        if entry.last_used != tick {
            self.order.remove(&entry.last_used);
            entry.last_used = tick;
        }
        self.order.insert(tick, user_id.to_string());

        &mut entry.session
    }

    fn insert(&mut self, session: Session) {
        if let Some(old) = self.entries.remove(&session.user_id) {
            self.order.remove(&old.last_used);
        } else if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let tick = self.next_tick();
        self.order.insert(tick, session.user_id.clone());
        self.entries.insert(
            session.user_id.clone(),
            Entry {
                session,
                last_used: tick,
            },
        );
    }

    fn evict_oldest(&mut self) {
        if let Some((_, user_id)) = self.order.pop_first() {
            self.entries.remove(&user_id);
            debug!(user_id = %user_id, "evicted least recently used session");
        }
    }
}
