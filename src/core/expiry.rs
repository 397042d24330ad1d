//! Logical expiry of rooms and messages
//!
//! The backing store purges expired records on its own schedule, so a record
//! may still be readable after its expiry instant. Every read or mutation goes
//! through [`is_expired`] first and treats such records as gone.

use chrono::{DateTime, Utc};

/// True once `now` has reached `expires_at`
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}
