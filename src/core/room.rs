//! Live room membership used to target broadcasts
//!
//! This is in-process bookkeeping only. Whether a room exists is decided by
//! the room store; a room appears here while at least one connection is in it.
//! Membership is not shared between server instances, so a multi-instance
//! deployment needs sticky routing per room.

use dashmap::DashMap;
use std::collections::HashSet;

use crate::core::connection::{Connection, ConnectionId};
use crate::core::message_types::ServerEvent;

/// Tracks which connections are present in which rooms
pub struct ConnectionRegistry {
    /// Delivery handles of every open connection
    connections: DashMap<ConnectionId, Connection>,
    /// Room code to the set of member connections
    rooms: DashMap<String, HashSet<ConnectionId>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Register the delivery handle of a newly opened connection
    pub fn attach(&self, connection: Connection) {
        self.connections.insert(connection.id.clone(), connection);
    }

    /// Adds a connection to a room; a connection may be in several rooms
    pub fn join(&self, room_code: &str, conn_id: &str) {
        self.rooms
            .entry(room_code.to_string())
            .or_default()
            .insert(conn_id.to_string());
    }

    /// Removes a connection from a room, dropping the room once empty
    pub fn leave(&self, room_code: &str, conn_id: &str) -> bool {
        let removed = match self.rooms.get_mut(room_code) {
            Some(mut members) => members.remove(conn_id),
            None => false,
        };
        self.rooms.remove_if(room_code, |_, members| members.is_empty());
        removed
    }

    /// Removes a connection from every room and forgets its handle
    pub fn sweep(&self, conn_id: &str) -> usize {
        let mut left = 0;
        self.rooms.retain(|_, members| {
            if members.remove(conn_id) {
                left += 1;
            }
            !members.is_empty()
        });
        self.connections.remove(conn_id);
        left
    }

    /// Gets all members of a room (empty when nobody is present)
    pub fn members_of(&self, room_code: &str) -> HashSet<ConnectionId> {
        self.rooms
            .get(room_code)
            .map(|members| members.value().clone())
            .unwrap_or_default()
    }

    pub fn is_member(&self, room_code: &str, conn_id: &str) -> bool {
        self.rooms
            .get(room_code)
            .map(|members| members.contains(conn_id))
            .unwrap_or(false)
    }

    /// Number of rooms with at least one member
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Deliver an event to a single connection
    pub fn send_to(&self, conn_id: &str, event: &ServerEvent) -> bool {
        match self.connections.get(conn_id) {
            Some(connection) => connection.send(event),
            None => false,
        }
    }

    /// Deliver an event to every current member of a room
    pub fn broadcast(&self, room_code: &str, event: &ServerEvent) -> usize {
        // Snapshot first so no shard lock is held while delivering
        let members = self.members_of(room_code);
        let handles: Vec<Connection> = members
            .iter()
            .filter_map(|id| self.connections.get(id).map(|c| c.value().clone()))
            .collect();

        handles.iter().filter(|conn| conn.send(event)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn attached(registry: &ConnectionRegistry, id: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.attach(Connection::with_id(id.to_string(), tx));
        rx
    }

    #[test]
    fn test_join_and_leave() {
        let registry = ConnectionRegistry::new();
        registry.join("ROOM01", "c1");
        registry.join("ROOM01", "c2");
        assert_eq!(registry.members_of("ROOM01").len(), 2);

        assert!(registry.leave("ROOM01", "c1"));
        assert!(!registry.is_member("ROOM01", "c1"));
        assert!(registry.is_member("ROOM01", "c2"));
    }

    #[test]
    fn test_empty_rooms_are_removed() {
        let registry = ConnectionRegistry::new();
        registry.join("ROOM01", "c1");
        registry.leave("ROOM01", "c1");
        assert_eq!(registry.room_count(), 0);
        assert!(registry.members_of("ROOM01").is_empty());
    }

    #[test]
    fn test_leave_unknown_room_is_noop() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.leave("NOPE", "c1"));
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_sweep_removes_connection_everywhere() {
        let registry = ConnectionRegistry::new();
        let _rx = attached(&registry, "c1");
        registry.join("ROOM01", "c1");
        registry.join("ROOM02", "c1");
        registry.join("ROOM02", "c2");

        assert_eq!(registry.sweep("c1"), 2);
        assert_eq!(registry.room_count(), 1);
        assert!(registry.is_member("ROOM02", "c2"));
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn test_broadcast_reaches_members_only() {
        let registry = ConnectionRegistry::new();
        let mut rx1 = attached(&registry, "c1");
        let mut rx2 = attached(&registry, "c2");
        let mut rx3 = attached(&registry, "c3");
        registry.join("ROOM01", "c1");
        registry.join("ROOM01", "c2");
        registry.join("ROOM02", "c3");

        let event = ServerEvent::MessageDeleted { id: "m1".to_string() };
        assert_eq!(registry.broadcast("ROOM01", &event), 2);

        assert_eq!(rx1.try_recv().unwrap(), event);
        assert_eq!(rx2.try_recv().unwrap(), event);
        assert!(rx3.try_recv().is_err());
    }
}
