//! Server configuration module
//! Handles the tunable parameters of the room session engine

use crate::constants::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SWEEP_INTERVAL_SECS, EDIT_WINDOW_MS, HIDE_THRESHOLD,
    MAX_CONTENT_CHARS, MAX_SENDS_PER_WINDOW, MESSAGE_TTL_HOURS, RATE_WINDOW_MS,
    RECENT_MESSAGES_LIMIT,
};
use crate::error::{MurmurError, Result};
use chrono::Duration;
use std::env;
use std::str::FromStr;

/// Limits and windows applied to every room session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPolicy {
    /// Sends admitted per (anonId, room) inside `rate_window`
    pub max_sends: usize,
    pub rate_window: Duration,
    /// How long after creation the owner may edit or delete a message
    pub edit_window: Duration,
    /// Retention of a message before it expires
    pub message_ttl: Duration,
    /// Report count at or above which a message is hidden
    pub hide_threshold: u32,
    /// Maximum content length in characters, after sanitization
    pub max_content_chars: usize,
    /// Messages replayed to a client when it joins a room
    pub history_limit: usize,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_sends: MAX_SENDS_PER_WINDOW,
            rate_window: Duration::milliseconds(RATE_WINDOW_MS),
            edit_window: Duration::milliseconds(EDIT_WINDOW_MS),
            message_ttl: Duration::hours(MESSAGE_TTL_HOURS),
            hide_threshold: HIDE_THRESHOLD,
            max_content_chars: MAX_CONTENT_CHARS,
            history_limit: RECENT_MESSAGES_LIMIT,
        }
    }
}

/// A room seeded into the memory store at startup (`CODE:Display name`)
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapRoom {
    pub code: String,
    pub name: String,
}

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub policy: SessionPolicy,
    /// Interval of the background sweep (rate windows, expired messages)
    pub sweep_interval: std::time::Duration,
    pub bootstrap_room: Option<BootstrapRoom>,
    /// Words masked by the content filter
    pub blocked_words: Vec<String>,
}

impl ServerConfig {
    /// Deterministic configuration for tests
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            policy: SessionPolicy::default(),
            sweep_interval: std::time::Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            bootstrap_room: None,
            blocked_words: Vec::new(),
        }
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("MURMUR_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, "MURMUR_PORT", DEFAULT_PORT)?;

        let defaults = SessionPolicy::default();
        let max_sends = parse_positive(&lookup, "MURMUR_MAX_SENDS", defaults.max_sends)?;
        let rate_window_ms = parse_positive(
            &lookup,
            "MURMUR_RATE_WINDOW_MS",
            defaults.rate_window.num_milliseconds(),
        )?;
        let edit_window_ms = parse_positive(
            &lookup,
            "MURMUR_EDIT_WINDOW_MS",
            defaults.edit_window.num_milliseconds(),
        )?;
        let message_ttl_hours = parse_positive(
            &lookup,
            "MURMUR_MESSAGE_TTL_HOURS",
            defaults.message_ttl.num_hours(),
        )?;
        let hide_threshold =
            parse_positive(&lookup, "MURMUR_HIDE_THRESHOLD", defaults.hide_threshold)?;
        let max_content_chars =
            parse_positive(&lookup, "MURMUR_MAX_CONTENT_CHARS", defaults.max_content_chars)?;
        let history_limit =
            parse_positive(&lookup, "MURMUR_HISTORY_LIMIT", defaults.history_limit)?;
        let sweep_secs =
            parse_positive(&lookup, "MURMUR_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;

        let bootstrap_room = match lookup("MURMUR_BOOTSTRAP_ROOM") {
            Some(raw) => Some(parse_bootstrap_room(&raw)?),
            None => None,
        };

        let blocked_words = lookup("MURMUR_BLOCKED_WORDS")
            .map(|raw| {
                raw.split(',')
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            policy: SessionPolicy {
                max_sends,
                rate_window: Duration::milliseconds(rate_window_ms),
                edit_window: Duration::milliseconds(edit_window_ms),
                message_ttl: Duration::hours(message_ttl_hours),
                hide_threshold,
                max_content_chars,
                history_limit,
            },
            sweep_interval: std::time::Duration::from_secs(sweep_secs),
            bootstrap_room,
            blocked_words,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| MurmurError::ConfigError(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

fn parse_positive<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    let value = parse_or(lookup, key, default)?;
    if value <= T::default() {
        return Err(MurmurError::ConfigError(format!("{} must be greater than zero", key)));
    }
    Ok(value)
}

fn parse_bootstrap_room(raw: &str) -> Result<BootstrapRoom> {
    let (code, name) = raw.split_once(':').ok_or_else(|| {
        MurmurError::ConfigError("MURMUR_BOOTSTRAP_ROOM must look like CODE:Name".to_string())
    })?;
    let code = code.trim().to_uppercase();
    let name = name.trim().to_string();
    if code.is_empty() || name.is_empty() {
        return Err(MurmurError::ConfigError(
            "MURMUR_BOOTSTRAP_ROOM needs both a code and a name".to_string(),
        ));
    }
    Ok(BootstrapRoom { code, name })
}
