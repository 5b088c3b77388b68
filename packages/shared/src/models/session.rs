use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::models::events::ServerEvent;

/// The server-side record binding a live connection to an authenticated
/// identity. One session per connection; created only after token
/// verification succeeds and destroyed on disconnect.
///
/// The embedded sender is the connection's outbound channel; everything
/// the client receives goes through it.
#[derive(Debug, Clone)]
pub struct Session {
    pub connection_id: String,
    pub user_id: String,
    pub username: String,
    pub room_id: Option<String>,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Session {
    pub fn new(
        connection_id: &str,
        user_id: &str,
        username: &str,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Self {
        Session {
            connection_id: connection_id.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            room_id: None,
            sender,
        }
    }

    /// Queues an event for delivery to this connection. A closed channel
    /// means the connection is already tearing down; the event is dropped.
    pub fn send(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<ServerEvent> {
        self.sender.clone()
    }

    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            connection_id: self.connection_id.clone(),
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            room_id: self.room_id.clone(),
        }
    }
}

/// Serializable session snapshot, the shape handed to the pluggable
/// session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub connection_id: String,
    pub user_id: String,
    pub username: String,
    pub room_id: Option<String>,
}
