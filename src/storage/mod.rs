//! Storage collaborators for rooms, anonymous sessions and messages

pub mod memory;
pub mod traits;

pub use memory::{MemoryMessageStore, MemoryRoomStore, MemorySessionStore};
pub use traits::{
    normalize_room_code, MessageStore, RoomStore, SessionStore, StoredRoom, StoredSession,
};
