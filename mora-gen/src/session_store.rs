//! In-memory session arena
//!
//! Sessions live in a map keyed by id. The map lock is only held to look up,
//! insert or evict; each entry carries its own session lock and its own event
//! channel, so sessions never contend with each other while they run.
//!
//! The store is bounded: inserting beyond `max_sessions` evicts the oldest
//! terminal sessions, and terminal sessions idle for longer than the TTL are
//! dropped by [`SessionStore::evict_expired`]. Only settled sessions are
//! evicted: terminal, with the channel closed and the final write-through done.

use chrono::Utc;
use mora_common::events::EventChannel;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::models::{Session, SessionSnapshot};
use crate::services::SessionRepository;

/// Session store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Session store is full: all {capacity} sessions are still in use")]
    Full { capacity: usize },
}

/// One session with its event channel
pub struct SessionEntry {
    id: Uuid,
    session: RwLock<Session>,
    events: EventChannel,
    settled: AtomicBool,
}

impl SessionEntry {
    pub fn new(session: Session, subscriber_buffer: usize) -> Self {
        Self {
            id: session.id(),
            session: RwLock::new(session),
            events: EventChannel::new(subscriber_buffer),
            settled: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session(&self) -> &RwLock<Session> {
        &self.session
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    /// Mark the entry as finished with: terminal event sent, record persisted
    pub fn mark_settled(&self) {
        self.settled.store(true, Ordering::Release);
    }

    /// Whether the entry may be evicted
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire) && self.events.is_closed()
    }

    /// Current state plus the event count
    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.read().await;
        session.snapshot(self.events.len())
    }
}

/// Bounded session arena
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SessionEntry>>>,
    max_sessions: usize,
    session_ttl: Duration,
    subscriber_buffer: usize,
    repository: Option<Arc<dyn SessionRepository>>,
}

impl SessionStore {
    pub fn new(config: &StoreConfig, subscriber_buffer: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: config.max_sessions.max(1),
            session_ttl: config.session_ttl(),
            subscriber_buffer,
            repository: None,
        }
    }

    /// Attach write-through persistence
    pub fn with_repository(mut self, repository: Arc<dyn SessionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn capacity(&self) -> usize {
        self.max_sessions
    }

    /// Register a new session in `created` state
    ///
    /// At capacity the oldest settled sessions make room. Fails with
    /// [`StoreError::Full`] if no stored session is settled yet.
    pub async fn create(&self, video_url: impl Into<String>) -> Result<Arc<SessionEntry>, StoreError> {
        let session = Session::new(video_url);
        let entry = Arc::new(SessionEntry::new(session, self.subscriber_buffer));

        {
            let mut sessions = self.sessions.write().await;

            if sessions.len() >= self.max_sessions {
                let needed = sessions.len() + 1 - self.max_sessions;
                let mut settled = Vec::new();
                for (id, existing) in sessions.iter() {
                    if !existing.is_settled() {
                        continue;
                    }
                    let session = existing.session.read().await;
                    settled.push((session.updated_at(), *id));
                }

                if settled.len() < needed {
                    warn!(
                        capacity = self.max_sessions,
                        "Session store full of running sessions - rejecting new session"
                    );
                    return Err(StoreError::Full {
                        capacity: self.max_sessions,
                    });
                }

                settled.sort();
                for (_, id) in settled.into_iter().take(needed) {
                    sessions.remove(&id);
                    debug!(session_id = %id, "Evicted terminal session to make room");
                }
            }

            sessions.insert(entry.id(), Arc::clone(&entry));
        }

        info!(session_id = %entry.id(), "Session created");

        let snapshot = entry.session.read().await.clone();
        self.persist(&snapshot).await;

        Ok(entry)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionEntry>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Load a session that is no longer (or never was) in memory
    pub async fn load_persisted(&self, id: Uuid) -> mora_common::Result<Option<Session>> {
        match &self.repository {
            Some(repository) => repository.load(id).await,
            None => Ok(None),
        }
    }

    /// Write-through of a session snapshot
    ///
    /// Failures are logged and never affect the session.
    pub async fn persist(&self, session: &Session) {
        if let Some(repository) = &self.repository {
            if let Err(e) = repository.save(session).await {
                warn!(session_id = %session.id(), error = %e, "Failed to persist session");
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of sessions that are not terminal yet
    pub async fn active_count(&self) -> usize {
        let entries: Vec<Arc<SessionEntry>> = self.sessions.read().await.values().cloned().collect();
        let mut active = 0;
        for entry in entries {
            if !entry.session.read().await.is_terminal() {
                active += 1;
            }
        }
        active
    }

    /// Drop settled sessions idle for longer than the TTL
    ///
    /// Returns the number of evicted sessions.
    pub async fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let mut expired = Vec::new();
        for (id, entry) in sessions.iter() {
            if !entry.is_settled() {
                continue;
            }
            let session = entry.session.read().await;
            let idle = (now - session.updated_at()).to_std().unwrap_or_default();
            if idle > self.session_ttl {
                expired.push(*id);
            }
        }

        for id in &expired {
            sessions.remove(id);
            debug!(session_id = %id, "Evicted expired session");
        }

        expired.len()
    }
}

/// Background task calling [`SessionStore::evict_expired`] periodically
pub fn spawn_sweeper(store: Arc<SessionStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = store.evict_expired().await;
            if evicted > 0 {
                info!(evicted, "Session sweeper evicted expired sessions");
            }
        }
    })
}
