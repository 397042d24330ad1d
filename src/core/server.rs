//! Shared server state injected into every connection handler

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::config::SessionPolicy;
use crate::core::lifecycle::MessageLifecycleManager;
use crate::core::rate_limiter::SendRateLimiter;
use crate::core::room::ConnectionRegistry;
use crate::security::ContentFilter;
use crate::storage::{MessageStore, RoomStore, SessionStore};

/// Process-wide room session state.
///
/// Membership and rate windows live in this process only; they are not
/// shared with other instances.
pub struct RoomServer {
    registry: ConnectionRegistry,
    rate_limiter: Arc<SendRateLimiter>,
    lifecycle: MessageLifecycleManager,
    rooms: Arc<dyn RoomStore>,
    sessions: Arc<dyn SessionStore>,
    messages: Arc<dyn MessageStore>,
    policy: SessionPolicy,
}

impl RoomServer {
    pub fn new(
        policy: SessionPolicy,
        rooms: Arc<dyn RoomStore>,
        sessions: Arc<dyn SessionStore>,
        messages: Arc<dyn MessageStore>,
        filter: Arc<dyn ContentFilter>,
    ) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rate_limiter: Arc::new(SendRateLimiter::from_policy(&policy)),
            lifecycle: MessageLifecycleManager::new(messages.clone(), filter, policy.clone()),
            rooms,
            sessions,
            messages,
            policy,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn rate_limiter(&self) -> &SendRateLimiter {
        &self.rate_limiter
    }

    pub fn lifecycle(&self) -> &MessageLifecycleManager {
        &self.lifecycle
    }

    pub fn rooms(&self) -> &dyn RoomStore {
        self.rooms.as_ref()
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Start periodic pruning of idle rate windows and expired messages
    pub fn start_maintenance_task(self: Arc<Self>, every: Duration) {
        self.rate_limiter.clone().start_cleanup_task(every);

        let server = Arc::clone(&self);
        tokio::spawn(async move {
            let mut interval = interval(every);
            loop {
                interval.tick().await;
                match server.messages.purge_expired(Utc::now()).await {
                    Ok(0) => {}
                    Ok(purged) => log::info!("Purged {} expired messages", purged),
                    Err(e) => log::error!("Failed to purge expired messages: {}", e),
                }
            }
        });
    }
}

// Shared reference to the room server
pub type SharedRoomServer = Arc<RoomServer>;
