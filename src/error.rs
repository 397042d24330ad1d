use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MurmurError {
    // Validation errors
    MissingFields(String),
    ValidationError(String),
    MessageParseError(String),

    // Lookup errors
    RoomNotFound,
    MessageNotFound,

    // Expiry errors
    RoomExpired(String),

    // Authorization errors
    Unauthorized,
    EditWindowExpired,
    Banned,

    // Throttling
    RateLimitExceeded,

    // Storage errors
    StorageError(String),

    // Configuration errors
    ConfigError(String),
}

impl MurmurError {
    /// Machine readable code sent alongside `error` events
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "MISSING_FIELDS",
            Self::ValidationError(_) => "INVALID_CONTENT",
            Self::MessageParseError(_) => "INVALID_MESSAGE",
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::MessageNotFound => "MESSAGE_NOT_FOUND",
            Self::RoomExpired(_) => "ROOM_EXPIRED",
            Self::Unauthorized => "NOT_AUTHORIZED",
            Self::EditWindowExpired => "WINDOW_EXPIRED",
            Self::Banned => "BANNED",
            Self::RateLimitExceeded => "RATE_LIMITED",
            Self::StorageError(_) => "INTERNAL",
            Self::ConfigError(_) => "CONFIG",
        }
    }
}

impl fmt::Display for MurmurError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(fields) => write!(f, "{} required", fields),
            Self::ValidationError(msg) => write!(f, "{}", msg),
            // Parser details stay in the server log
            Self::MessageParseError(_) => write!(f, "Invalid message format"),
            Self::RoomNotFound => write!(f, "Room not found"),
            Self::MessageNotFound => write!(f, "Message not found"),
            Self::RoomExpired(code) => write!(f, "Room {} has expired", code),
            Self::Unauthorized => write!(f, "Not authorized to modify this message"),
            Self::EditWindowExpired => write!(f, "Edit window for this message has closed"),
            Self::Banned => write!(f, "You are banned from this room"),
            Self::RateLimitExceeded => write!(f, "Rate limit exceeded. Please slow down."),
            Self::StorageError(msg) => write!(f, "Storage error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for MurmurError {}

impl From<serde_json::Error> for MurmurError {
    fn from(err: serde_json::Error) -> Self {
        MurmurError::MessageParseError(err.to_string())
    }
}

// Generic result type for Murmur
pub type Result<T> = std::result::Result<T, MurmurError>;
