//! Per-connection event handling
//!
//! One `RoomSessionHandler` is bound to each live connection. The websocket
//! task feeds it inbound events one at a time, so events of a single
//! connection never overlap while different connections run concurrently.
//! Each handler call returns the events to deliver; persistence is always
//! awaited before a broadcast is produced.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::core::connection::ConnectionId;
use crate::core::message_types::{required, ClientEvent, ServerEvent};
use crate::core::server::SharedRoomServer;
use crate::error::{MurmurError, Result};
use crate::storage::{normalize_room_code, StoredRoom};

/// An event addressed to the acting connection or to a whole room
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Unicast(ServerEvent),
    Broadcast { room_code: String, event: ServerEvent },
}

pub struct RoomSessionHandler {
    conn_id: ConnectionId,
    server: SharedRoomServer,
}

impl RoomSessionHandler {
    pub fn new(conn_id: ConnectionId, server: SharedRoomServer) -> Self {
        Self { conn_id, server }
    }

    pub fn connection_id(&self) -> &str {
        &self.conn_id
    }

    /// Parse a raw text frame and handle it
    pub async fn handle_text(&self, text: &str, now: DateTime<Utc>) -> Vec<Outbound> {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.dispatch(event, now).await,
            Err(e) => {
                warn!("Unparseable event from {}: {}", self.conn_id, e);
                vec![Outbound::Unicast(
                    self.failure_event(MurmurError::from(e), "parse message"),
                )]
            }
        }
    }

    /// Route an inbound event, turning failures into events for the caller
    pub async fn dispatch(&self, event: ClientEvent, now: DateTime<Utc>) -> Vec<Outbound> {
        let (context, result) = match event {
            ClientEvent::JoinRoom { room_code, anon_id } => {
                let result = match (required(&room_code), required(&anon_id)) {
                    (Some(room_code), Some(anon_id)) => self.on_join(room_code, anon_id, now).await,
                    _ => Err(missing("Room code and anonymous ID are")),
                };
                ("join room", result)
            }

            ClientEvent::LeaveRoom { room_code } => {
                if let Some(room_code) = required(&room_code) {
                    self.on_leave(room_code);
                }
                ("leave room", Ok(Vec::new()))
            }

            ClientEvent::SendMessage {
                room_code,
                anon_id,
                content,
            } => {
                let result = match (required(&room_code), required(&anon_id), required(&content)) {
                    (Some(room_code), Some(anon_id), Some(content)) => {
                        self.on_send(room_code, anon_id, content, now).await
                    }
                    _ => Err(missing("Room code, anonymous ID, and content are")),
                };
                ("send message", result)
            }

            ClientEvent::EditMessage {
                message_id,
                content,
                anon_id,
            } => {
                let result = match (required(&message_id), required(&content), required(&anon_id)) {
                    (Some(message_id), Some(content), Some(anon_id)) => {
                        self.on_edit(message_id, anon_id, content, now).await
                    }
                    _ => Err(missing("Message ID, content, and anonymous ID are")),
                };
                ("edit message", result)
            }

            ClientEvent::DeleteMessage { message_id, anon_id } => {
                let result = match (required(&message_id), required(&anon_id)) {
                    (Some(message_id), Some(anon_id)) => {
                        self.on_delete(message_id, anon_id, now).await
                    }
                    _ => Err(missing("Message ID and anonymous ID are")),
                };
                ("delete message", result)
            }

            ClientEvent::ReportMessage { message_id, anon_id } => {
                let result = match (required(&message_id), required(&anon_id)) {
                    (Some(message_id), Some(_)) => self.on_report(message_id, now).await,
                    _ => Err(missing("Message ID and anonymous ID are")),
                };
                ("report message", result)
            }
        };

        result.unwrap_or_else(|e| vec![Outbound::Unicast(self.failure_event(e, context))])
    }

    /// Map an error onto the event the acting connection receives
    fn failure_event(&self, err: MurmurError, context: &str) -> ServerEvent {
        match err {
            MurmurError::RoomExpired(room_code) => ServerEvent::RoomExpired { room_code },
            MurmurError::Banned => ServerEvent::UserBanned {
                message: MurmurError::Banned.to_string(),
            },
            MurmurError::StorageError(detail) => {
                error!("Failed to {} for {}: {}", context, self.conn_id, detail);
                ServerEvent::error("INTERNAL", format!("Failed to {}", context))
            }
            other => {
                debug!("Rejected {} from {}: {}", context, self.conn_id, other);
                ServerEvent::error(other.code(), other.to_string())
            }
        }
    }

    /// Fetch a room that is present and not yet expired
    async fn live_room(&self, room_code: &str, now: DateTime<Utc>) -> Result<StoredRoom> {
        let room = self
            .server
            .rooms()
            .find_by_code(room_code)
            .await?
            .ok_or(MurmurError::RoomNotFound)?;
        if room.is_expired(now) {
            return Err(MurmurError::RoomExpired(room_code.to_string()));
        }
        Ok(room)
    }

    /// Anonymous ids without a session record are not banned
    async fn ensure_not_banned(&self, anon_id: &str) -> Result<()> {
        match self.server.sessions().find_by_anon_id(anon_id).await? {
            Some(session) if session.banned => Err(MurmurError::Banned),
            _ => Ok(()),
        }
    }

    pub async fn on_join(&self, room_code: &str, anon_id: &str, now: DateTime<Utc>) -> Result<Vec<Outbound>> {
        let room_code = normalize_room_code(room_code);
        let room = self.live_room(&room_code, now).await?;
        self.ensure_not_banned(anon_id).await?;

        // Load history before registering so a failed join leaves no membership
        let history = self.server.lifecycle().history(&room.code, now).await?;

        self.server.registry().join(&room.code, &self.conn_id);
        info!("Connection {} joined room {}", self.conn_id, room.code);

        let threshold = self.server.policy().hide_threshold;

        Ok(vec![
            Outbound::Unicast(ServerEvent::JoinedRoom {
                room_code: room.code.clone(),
                room_name: room.name,
                is_verified: room.is_verified,
            }),
            Outbound::Unicast(ServerEvent::RecentMessages {
                messages: history.iter().map(|m| m.view(threshold)).collect(),
            }),
        ])
    }

    /// Registry cleanup only
    pub fn on_leave(&self, room_code: &str) {
        let room_code = normalize_room_code(room_code);
        if self.server.registry().leave(&room_code, &self.conn_id) {
            info!("Connection {} left room {}", self.conn_id, room_code);
        }
    }

    pub async fn on_send(
        &self,
        room_code: &str,
        anon_id: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Outbound>> {
        let room_code = normalize_room_code(room_code);
        self.ensure_not_banned(anon_id).await?;

        // A missing room is reported as expired: the store purges expired rooms
        if let Err(err) = self.live_room(&room_code, now).await {
            return Err(match err {
                MurmurError::RoomNotFound => MurmurError::RoomExpired(room_code),
                other => other,
            });
        }

        // The slot is consumed even if persistence fails below
        if !self.server.rate_limiter().admit(anon_id, &room_code, now) {
            warn!("Rate limit exceeded for {} in room {}", anon_id, room_code);
            return Err(MurmurError::RateLimitExceeded);
        }

        let message = self
            .server
            .lifecycle()
            .create(&room_code, anon_id, content, now)
            .await?;

        Ok(vec![Outbound::Broadcast {
            room_code,
            event: ServerEvent::NewMessage(message.view(self.server.policy().hide_threshold)),
        }])
    }

    pub async fn on_edit(
        &self,
        message_id: &str,
        anon_id: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Outbound>> {
        let message = self
            .server
            .lifecycle()
            .edit(message_id, anon_id, content, now)
            .await?;

        let hidden = message.is_hidden(self.server.policy().hide_threshold);
        Ok(vec![Outbound::Broadcast {
            room_code: message.room_code,
            event: ServerEvent::MessageEdited {
                id: message.id,
                content: message.content,
                updated_at: message.updated_at.unwrap_or(now),
                hidden,
            },
        }])
    }

    pub async fn on_delete(&self, message_id: &str, anon_id: &str, now: DateTime<Utc>) -> Result<Vec<Outbound>> {
        let message = self
            .server
            .lifecycle()
            .delete(message_id, anon_id, now)
            .await?;

        Ok(vec![Outbound::Broadcast {
            room_code: message.room_code,
            event: ServerEvent::MessageDeleted { id: message.id },
        }])
    }

    /// The hide notice goes out on every report at or above the threshold
    pub async fn on_report(&self, message_id: &str, now: DateTime<Utc>) -> Result<Vec<Outbound>> {
        let outcome = self.server.lifecycle().report(message_id, now).await?;

        let mut events = Vec::with_capacity(2);
        if outcome.crossed_threshold {
            events.push(Outbound::Broadcast {
                room_code: outcome.room_code,
                event: ServerEvent::MessageHidden {
                    id: outcome.message_id,
                },
            });
        }
        events.push(Outbound::Unicast(ServerEvent::MessageReported { success: true }));
        Ok(events)
    }

    /// Drop this connection from every room; no storage access
    pub fn on_disconnect(&self) {
        let rooms = self.server.registry().sweep(&self.conn_id);
        info!("Connection {} disconnected from {} rooms", self.conn_id, rooms);
    }

    /// Hand the produced events to the registry for delivery
    pub fn deliver(&self, outbound: Vec<Outbound>) {
        for item in outbound {
            match item {
                Outbound::Unicast(event) => {
                    self.server.registry().send_to(&self.conn_id, &event);
                }
                Outbound::Broadcast { room_code, event } => {
                    let count = self.server.registry().broadcast(&room_code, &event);
                    debug!("Broadcast to {} connections in room {}", count, room_code);
                }
            }
        }
    }
}

fn missing(fields: &str) -> MurmurError {
    MurmurError::MissingFields(fields.to_string())
}
