//! Abstract storage interfaces for pluggable backends
//!
//! The engine only reads rooms and anonymous sessions; messages are the one
//! entity it writes. Backends are expected to purge records past their expiry
//! instant on their own schedule.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::expiry::is_expired;
use crate::core::message::Message;
use crate::error::Result;

/// Room record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRoom {
    /// Upper-case room code
    pub code: String,
    pub name: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredRoom {
    pub fn new(code: &str, name: String, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            code: normalize_room_code(code),
            name,
            is_verified: false,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.expires_at, now)
    }
}

/// Anonymous participant record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub anon_id: String,
    /// Diagnostic only
    pub device_hash: String,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
}

/// Room codes are compared case-insensitively
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Room lookup interface
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Find a room by its normalized code
    async fn find_by_code(&self, code: &str) -> Result<Option<StoredRoom>>;
}

/// Anonymous session lookup interface
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_by_anon_id(&self, anon_id: &str) -> Result<Option<StoredSession>>;
}

/// Message storage interface
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a new message, returning the stored record
    async fn create(&self, message: Message) -> Result<Message>;

    async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>>;

    /// Set content and edit time only, leaving the report counter untouched.
    /// Returns `None` if the message is gone.
    async fn update_content(
        &self,
        message_id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Message>>;

    /// Delete a message, returning whether it existed
    async fn delete(&self, message_id: &str) -> Result<bool>;

    /// Add one report atomically and return the updated record
    async fn increment_reports(&self, message_id: &str) -> Result<Option<Message>>;

    /// Most recent messages of a room, newest first
    async fn recent_by_room(&self, room_code: &str, limit: usize) -> Result<Vec<Message>>;

    /// Physically remove messages whose expiry instant has passed
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}
