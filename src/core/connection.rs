//! WebSocket connection handles
//! A handle is the delivery end of one live client connection

use log::warn;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::message_types::ServerEvent;

pub type ConnectionId = String;

/// Delivery handle for a single client connection
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Connection {
    /// Create a new connection with a unique ID
    pub fn new(sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), sender)
    }

    pub fn with_id(id: ConnectionId, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { id, sender }
    }

    /// Queue an event for this connection; false once the client is gone
    pub fn send(&self, event: &ServerEvent) -> bool {
        match self.sender.send(event.clone()) {
            Ok(_) => true,
            Err(_) => {
                warn!("Failed to queue event for connection {}", self.id);
                false
            }
        }
    }
}
