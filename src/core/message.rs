use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::expiry::is_expired;

/// A chat message as persisted by the message store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub room_code: String,
    pub sender_anon_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Never decreases
    pub report_count: u32,
}

impl Message {
    pub fn new(
        room_code: String,
        sender_anon_id: String,
        content: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_code,
            sender_anon_id,
            content,
            created_at: now,
            expires_at: now + ttl,
            updated_at: None,
            report_count: 0,
        }
    }

    /// Hidden is derived from the report counter, never stored
    pub fn is_hidden(&self, threshold: u32) -> bool {
        self.report_count >= threshold
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.expires_at, now)
    }

    pub fn is_owned_by(&self, anon_id: &str) -> bool {
        self.sender_anon_id == anon_id
    }

    /// Inclusive: a message exactly `window` old is still editable
    pub fn within_edit_window(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.created_at <= window
    }

    pub fn view(&self, hide_threshold: u32) -> MessageView {
        MessageView {
            id: self.id.clone(),
            room_code: self.room_code.clone(),
            anon_id: self.sender_anon_id.clone(),
            content: self.content.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            hidden: self.is_hidden(hide_threshold),
        }
    }
}

/// Wire representation of a message delivered to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub room_code: String,
    pub anon_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub hidden: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Message {
        let now = Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap();
        Message::new(
            "ROOM01".to_string(),
            "anon-a".to_string(),
            "hello".to_string(),
            now,
            Duration::hours(24),
        )
    }

    #[test]
    fn test_message_creation() {
        let msg = sample();
        assert_eq!(msg.sender_anon_id, "anon-a");
        assert_eq!(msg.content, "hello");
        assert_eq!(msg.report_count, 0);
        assert_eq!(msg.expires_at - msg.created_at, Duration::hours(24));
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn test_hidden_is_derived_from_reports() {
        let mut msg = sample();
        msg.report_count = 2;
        assert!(!msg.view(3).hidden);
        msg.report_count = 3;
        assert!(msg.view(3).hidden);
        msg.report_count = 7;
        assert!(msg.is_hidden(3));
    }

    #[test]
    fn test_edit_window_is_inclusive() {
        let msg = sample();
        let window = Duration::minutes(2);
        assert!(msg.within_edit_window(msg.created_at + window, window));
        assert!(!msg.within_edit_window(msg.created_at + window + Duration::milliseconds(1), window));
    }

    #[test]
    fn test_view_uses_camel_case() {
        let json = serde_json::to_value(sample().view(3)).unwrap();
        assert_eq!(json["anonId"], "anon-a");
        assert_eq!(json["roomCode"], "ROOM01");
        assert_eq!(json["hidden"], false);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("expiresAt").is_some());
    }
}
