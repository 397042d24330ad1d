//! Murmur - ephemeral anonymous room chat over WebSockets
//!
//! This library provides the real-time room session and moderation engine:
//! live room membership, per-sender send throttling, and the message
//! lifecycle (create, edit, delete, report) with broadcast fan-out.

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;
pub mod security;
pub mod storage;

// Re-export main components
pub use config::*;
pub use constants::*;
