//! Event types exchanged with clients over the websocket

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::message::MessageView;

/// Client-to-server events.
///
/// Every payload field is optional so that an absent field surfaces as a
/// "missing fields" error rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinRoom {
        room_code: Option<String>,
        anon_id: Option<String>,
    },

    LeaveRoom {
        room_code: Option<String>,
    },

    SendMessage {
        room_code: Option<String>,
        anon_id: Option<String>,
        content: Option<String>,
    },

    EditMessage {
        message_id: Option<String>,
        content: Option<String>,
        anon_id: Option<String>,
    },

    DeleteMessage {
        message_id: Option<String>,
        anon_id: Option<String>,
    },

    ReportMessage {
        message_id: Option<String>,
        anon_id: Option<String>,
    },
}

/// Server-to-client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    JoinedRoom {
        room_code: String,
        room_name: String,
        is_verified: bool,
    },

    /// History replay, oldest first
    RecentMessages {
        messages: Vec<MessageView>,
    },

    /// Flattened message view
    NewMessage(MessageView),

    MessageEdited {
        id: String,
        content: String,
        updated_at: DateTime<Utc>,
        hidden: bool,
    },

    MessageDeleted {
        id: String,
    },

    MessageReported {
        success: bool,
    },

    MessageHidden {
        id: String,
    },

    RoomExpired {
        room_code: String,
    },

    UserBanned {
        message: String,
    },

    Error {
        code: String,
        message: String,
    },
}

impl ServerEvent {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Returns the value of a required field, treating empty strings as absent
pub fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_wire_names() {
        let event: ClientEvent = serde_json::from_value(json!({
            "type": "send-message",
            "roomCode": "ABC123",
            "anonId": "anon-1",
            "content": "hi"
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::SendMessage {
                room_code: Some("ABC123".to_string()),
                anon_id: Some("anon-1".to_string()),
                content: Some("hi".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_fields_still_parse() {
        let event: ClientEvent =
            serde_json::from_value(json!({ "type": "edit-message", "messageId": "m1" })).unwrap();
        match event {
            ClientEvent::EditMessage { content, anon_id, .. } => {
                assert!(content.is_none());
                assert!(anon_id.is_none());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_server_event_wire_shape() {
        let json = serde_json::to_value(ServerEvent::RoomExpired {
            room_code: "ABC123".to_string(),
        })
        .unwrap();
        assert_eq!(json, json!({ "type": "room-expired", "roomCode": "ABC123" }));

        let json = serde_json::to_value(ServerEvent::MessageReported { success: true }).unwrap();
        assert_eq!(json, json!({ "type": "message-reported", "success": true }));
    }

    #[test]
    fn test_required_rejects_empty() {
        assert_eq!(required(&Some("x".to_string())), Some("x"));
        assert_eq!(required(&Some(String::new())), None);
        assert_eq!(required(&None), None);
    }
}
