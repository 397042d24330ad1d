//! In-memory storage implementation for development and testing
//!
//! Keeps every record in memory behind async locks. Expired messages are
//! purged by `purge_expired`, which the server calls periodically in place of
//! a document store's TTL index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::*;
use crate::core::message::Message;
use crate::error::{MurmurError, Result};

/// In-memory room storage
#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: Arc<RwLock<HashMap<String, StoredRoom>>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, room: StoredRoom) {
        self.rooms.write().await.insert(room.code.clone(), room);
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<StoredRoom>> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(&normalize_room_code(code)).cloned())
    }
}

/// In-memory anonymous session storage
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, session: StoredSession) {
        self.sessions
            .write()
            .await
            .insert(session.anon_id.clone(), session);
    }

    /// Ban or unban an anonymous participant, creating the record if needed
    pub async fn set_banned(&self, anon_id: &str, banned: bool) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(anon_id.to_string())
            .or_insert_with(|| StoredSession {
                anon_id: anon_id.to_string(),
                device_hash: String::new(),
                banned: false,
                created_at: Utc::now(),
            })
            .banned = banned;
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find_by_anon_id(&self, anon_id: &str) -> Result<Option<StoredSession>> {
        Ok(self.sessions.read().await.get(anon_id).cloned())
    }
}

/// In-memory message storage
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: Arc<RwLock<HashMap<String, Message>>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create(&self, message: Message) -> Result<Message> {
        let mut messages = self.messages.write().await;
        if messages.contains_key(&message.id) {
            return Err(MurmurError::StorageError(format!(
                "Duplicate message id {}",
                message.id
            )));
        }
        messages.insert(message.id.clone(), message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>> {
        Ok(self.messages.read().await.get(message_id).cloned())
    }

    async fn update_content(
        &self,
        message_id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Message>> {
        let mut messages = self.messages.write().await;
        Ok(messages.get_mut(message_id).map(|message| {
            message.content = content.to_string();
            message.updated_at = Some(updated_at);
            message.clone()
        }))
    }

    async fn delete(&self, message_id: &str) -> Result<bool> {
        Ok(self.messages.write().await.remove(message_id).is_some())
    }

    async fn increment_reports(&self, message_id: &str) -> Result<Option<Message>> {
        let mut messages = self.messages.write().await;
        Ok(messages.get_mut(message_id).map(|message| {
            message.report_count = message.report_count.saturating_add(1);
            message.clone()
        }))
    }

    async fn recent_by_room(&self, room_code: &str, limit: usize) -> Result<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut in_room: Vec<&Message> = messages
            .values()
            .filter(|m| m.room_code == room_code)
            .collect();

        // Newest first; id breaks ties between messages created in the same instant
        in_room.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        Ok(in_room.into_iter().take(limit).cloned().collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|_, m| !m.is_expired(now));
        Ok(before - messages.len())
    }
}
