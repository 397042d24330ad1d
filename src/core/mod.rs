//! Core functionality of the room session engine

pub mod connection;
pub mod expiry;
pub mod lifecycle;
pub mod message;
pub mod message_handler;
pub mod message_types;
pub mod rate_limiter;
pub mod room;
pub mod server;

// Re-export main components for convenience
pub use connection::{Connection, ConnectionId};
pub use expiry::is_expired;
pub use lifecycle::{MessageLifecycleManager, ReportOutcome};
pub use message::{Message, MessageView};
pub use message_handler::{Outbound, RoomSessionHandler};
pub use message_types::{ClientEvent, ServerEvent};
pub use rate_limiter::SendRateLimiter;
pub use room::ConnectionRegistry;
pub use server::{RoomServer, SharedRoomServer};
