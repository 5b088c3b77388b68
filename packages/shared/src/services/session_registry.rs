use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::events::ServerEvent;
use crate::models::session::Session;

/// Observer for session lifecycle transitions (logging, metrics).
/// Listeners are registered once at startup and invoked for every
/// create/destroy; they hold no game logic.
pub trait SessionListener: Send + Sync {
    fn on_session_created(&self, session: &Session);
    fn on_session_closed(&self, session: &Session);
}

/// In-memory table of live connections, keyed by opaque connection id.
/// The registry is the sole owner of this table; all mutation goes
/// through the methods below.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry {
            sessions: Mutex::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Registers a lifecycle listener. Call before serving traffic.
    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners
            .write()
            .expect("session listener lock poisoned")
            .push(listener);
    }

    pub async fn register(&self, session: Session) {
        info!(
            connection_id = %session.connection_id,
            user_id = %session.user_id,
            username = %session.username,
            "session registered"
        );
        {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(session.connection_id.clone(), session.clone());
        }
        for listener in self
            .listeners
            .read()
            .expect("session listener lock poisoned")
            .iter()
        {
            listener.on_session_created(&session);
        }
    }

    pub async fn lookup(&self, connection_id: &str) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        sessions.get(connection_id).cloned()
    }

    pub async fn lookup_by_user(&self, user_id: &str) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        sessions.values().find(|s| s.user_id == user_id).cloned()
    }

    /// Removes the session for a disconnecting connection. Idempotent:
    /// a second call for the same id is a no-op returning `None`.
    pub async fn remove(&self, connection_id: &str) -> Option<Session> {
        let removed = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(connection_id)
        };
        match removed {
            Some(session) => {
                info!(
                    connection_id = %session.connection_id,
                    user_id = %session.user_id,
                    "session removed"
                );
                for listener in self
                    .listeners
                    .read()
                    .expect("session listener lock poisoned")
                    .iter()
                {
                    listener.on_session_closed(&session);
                }
                Some(session)
            }
            None => {
                debug!(connection_id, "remove for unknown session ignored");
                None
            }
        }
    }

    /// Binds or clears the room a session belongs to. Returns false if
    /// the session is already gone.
    pub async fn set_room(&self, connection_id: &str, room_id: Option<String>) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(connection_id) {
            Some(session) => {
                session.room_id = room_id;
                true
            }
            None => false,
        }
    }

    /// Fans an event out to the given connections. Connections that
    /// disappeared since the caller snapshotted the room are skipped.
    pub async fn broadcast_to(&self, connection_ids: &[String], event: &ServerEvent) {
        let sessions = self.sessions.lock().await;
        for connection_id in connection_ids {
            if let Some(session) = sessions.get(connection_id) {
                session.send(event.clone());
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
