// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3030;
pub const WS_PATH: &str = "ws";

// Send throttling: at most MAX_SENDS_PER_WINDOW sends per (anonId, room) per window
pub const MAX_SENDS_PER_WINDOW: usize = 5;
pub const RATE_WINDOW_MS: i64 = 10_000;

// Message lifecycle
pub const EDIT_WINDOW_MS: i64 = 120_000;
pub const MESSAGE_TTL_HOURS: i64 = 24;
pub const MAX_CONTENT_CHARS: usize = 1000;
pub const HIDE_THRESHOLD: u32 = 3;

// Number of messages replayed on join
pub const RECENT_MESSAGES_LIMIT: usize = 50;

// Background maintenance
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
