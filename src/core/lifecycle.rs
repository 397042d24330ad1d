//! Message lifecycle: create, edit, delete and report
//!
//! Ownership is a bearer capability. Whoever presents a message's anonId may
//! edit or delete it inside the edit window; anonIds are not bound to devices.
//!
//! Reporting is unconditional: every call adds exactly one report, repeated
//! calls from the same reporter included. The hidden flag is recomputed from
//! the counter on every delivery, so `crossed_threshold` stays true for every
//! report once the threshold is reached and consumers see the hide notice again.

use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;

use crate::config::SessionPolicy;
use crate::core::message::Message;
use crate::error::{MurmurError, Result};
use crate::security::ContentFilter;
use crate::storage::MessageStore;

/// Outcome of a report call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub message_id: String,
    pub room_code: String,
    pub report_count: u32,
    /// The new count is at or above the hide threshold
    pub crossed_threshold: bool,
}

pub struct MessageLifecycleManager {
    store: Arc<dyn MessageStore>,
    filter: Arc<dyn ContentFilter>,
    policy: SessionPolicy,
}

impl MessageLifecycleManager {
    pub fn new(
        store: Arc<dyn MessageStore>,
        filter: Arc<dyn ContentFilter>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            store,
            filter,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Sanitize then trim, and enforce 1..=max characters
    fn clean_content(&self, raw: &str) -> Result<String> {
        let content = self.filter.sanitize(raw.trim()).trim().to_string();

        if content.is_empty() {
            return Err(MurmurError::ValidationError(
                "Message content is required".to_string(),
            ));
        }

        let length = content.chars().count();
        if length > self.policy.max_content_chars {
            return Err(MurmurError::ValidationError(format!(
                "Message too long. Maximum {} characters allowed",
                self.policy.max_content_chars
            )));
        }

        Ok(content)
    }

    /// Fetch a live message, treating logically expired records as gone
    async fn find_live(&self, message_id: &str, now: DateTime<Utc>) -> Result<Message> {
        match self.store.find_by_id(message_id).await? {
            Some(message) if !message.is_expired(now) => Ok(message),
            _ => Err(MurmurError::MessageNotFound),
        }
    }

    /// Ownership first, then the time window
    fn authorize_owner(&self, message: &Message, requester: &str, now: DateTime<Utc>) -> Result<()> {
        if !message.is_owned_by(requester) {
            return Err(MurmurError::Unauthorized);
        }
        if !message.within_edit_window(now, self.policy.edit_window) {
            return Err(MurmurError::EditWindowExpired);
        }
        Ok(())
    }

    pub async fn create(
        &self,
        room_code: &str,
        sender_anon_id: &str,
        raw_content: &str,
        now: DateTime<Utc>,
    ) -> Result<Message> {
        let content = self.clean_content(raw_content)?;
        let message = Message::new(
            room_code.to_string(),
            sender_anon_id.to_string(),
            content,
            now,
            self.policy.message_ttl,
        );
        let stored = self.store.create(message).await?;
        debug!("Stored message {} in room {}", stored.id, stored.room_code);
        Ok(stored)
    }

    /// Editing is allowed whether or not the message is currently hidden
    pub async fn edit(
        &self,
        message_id: &str,
        requester_anon_id: &str,
        raw_content: &str,
        now: DateTime<Utc>,
    ) -> Result<Message> {
        let message = self.find_live(message_id, now).await?;
        self.authorize_owner(&message, requester_anon_id, now)?;

        let content = self.clean_content(raw_content)?;
        self.store
            .update_content(&message.id, &content, now)
            .await?
            .ok_or(MurmurError::MessageNotFound)
    }

    /// Returns the deleted message so the caller knows which room to notify
    pub async fn delete(
        &self,
        message_id: &str,
        requester_anon_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Message> {
        let message = self.find_live(message_id, now).await?;
        self.authorize_owner(&message, requester_anon_id, now)?;

        if !self.store.delete(&message.id).await? {
            // Purged between the lookup and the delete
            return Err(MurmurError::MessageNotFound);
        }
        Ok(message)
    }

    pub async fn report(&self, message_id: &str, now: DateTime<Utc>) -> Result<ReportOutcome> {
        self.find_live(message_id, now).await?;

        let message = self
            .store
            .increment_reports(message_id)
            .await?
            .ok_or(MurmurError::MessageNotFound)?;

        Ok(ReportOutcome {
            crossed_threshold: message.is_hidden(self.policy.hide_threshold),
            report_count: message.report_count,
            message_id: message.id,
            room_code: message.room_code,
        })
    }

    /// Live messages of a room, oldest first, ready for replay
    pub async fn history(&self, room_code: &str, now: DateTime<Utc>) -> Result<Vec<Message>> {
        let mut messages = self
            .store
            .recent_by_room(room_code, self.policy.history_limit)
            .await?;
        messages.retain(|m| !m.is_expired(now));
        messages.reverse();
        Ok(messages)
    }
}
