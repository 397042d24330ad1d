//! Rate limiting module to prevent send spam
//!
//! Windows are keyed by (anonId, room code) and held in a sharded map so that
//! concurrent senders only contend when they hash to the same shard.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::SessionPolicy;

type WindowKey = (String, String);

/// Sliding-window limiter for message sends per sender and room
pub struct SendRateLimiter {
    windows: DashMap<WindowKey, VecDeque<DateTime<Utc>>>,
    max_sends: usize,
    window: Duration,
}

impl SendRateLimiter {
    pub fn new(max_sends: usize, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_sends,
            window,
        }
    }

    pub fn from_policy(policy: &SessionPolicy) -> Self {
        Self::new(policy.max_sends, policy.rate_window)
    }

    /// Admit or reject a send attempt at `now`.
    ///
    /// Instants older than the window are dropped first. A rejection leaves the
    /// window untouched; an admission records `now`.
    pub fn admit(&self, sender_id: &str, room_code: &str, now: DateTime<Utc>) -> bool {
        let key = (sender_id.to_string(), room_code.to_string());
        let mut sends = self.windows.entry(key).or_default();

        while let Some(oldest) = sends.front() {
            if now - *oldest >= self.window {
                sends.pop_front();
            } else {
                break;
            }
        }

        if sends.len() >= self.max_sends {
            return false;
        }
        sends.push_back(now);
        true
    }

    /// Sends currently counted against (sender, room)
    pub fn recent_count(&self, sender_id: &str, room_code: &str, now: DateTime<Utc>) -> usize {
        let key = (sender_id.to_string(), room_code.to_string());
        self.windows
            .get(&key)
            .map(|sends| sends.iter().filter(|&&t| now - t < self.window).count())
            .unwrap_or(0)
    }

    /// Clean up aged-out instants and drop empty windows
    pub fn cleanup_old_entries(&self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, sends| {
            sends.retain(|&t| now - t < self.window);
            !sends.is_empty()
        });
        before - self.windows.len()
    }

    /// Get number of tracked (sender, room) windows
    pub fn tracked_windows(&self) -> usize {
        self.windows.len()
    }

    /// Start periodic cleanup of idle windows
    pub fn start_cleanup_task(self: Arc<Self>, every: std::time::Duration) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = self.cleanup_old_entries(Utc::now());
                if removed > 0 {
                    log::debug!("Dropped {} idle rate-limit windows", removed);
                }
            }
        });
    }
}
