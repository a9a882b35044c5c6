//! Fan-out of server messages to the connections watching a game.

use crate::session::GameId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc::UnboundedSender;

pub type ConnectionId = u64;

/// Write side of one client connection. Frames pushed here are written to
/// the socket by that connection's forwarding task.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    tx: UnboundedSender<String>,
}

impl Connection {
    pub fn new(id: ConnectionId, tx: UnboundedSender<String>) -> Self {
        Connection { id, tx }
    }

    /// Queues a frame. Returns false if the connection has closed.
    pub fn send(&self, frame: String) -> bool {
        self.tx.send(frame).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Rooms keyed by game id. A room exists while it has members.
#[derive(Debug, Default)]
pub struct RoomBroadcaster {
    rooms: RwLock<HashMap<GameId, HashMap<ConnectionId, Connection>>>,
}

impl RoomBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room: &str, connection: Connection) {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection.id, connection);
    }

    pub fn leave(&self, room: &str, connection: ConnectionId) {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(members) = rooms.get_mut(room) {
            members.remove(&connection);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    /// Removes the room and all its members.
    pub fn close(&self, room: &str) {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        rooms.remove(room);
    }

    /// Sends `message` to every open member of `room` not in `exclude`.
    /// Returns how many members it was queued for.
    pub fn emit<T: Serialize>(&self, room: &str, message: &T, exclude: &[ConnectionId]) -> usize {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        let Some(members) = rooms.get(room) else {
            return 0;
        };
        let frame = match serde_json::to_string(message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(room, "Failed to encode message: {}", e);
                return 0;
            }
        };
        members
            .values()
            .filter(|member| !exclude.contains(&member.id) && !member.is_closed())
            .filter(|member| member.send(frame.clone()))
            .count()
    }

    pub fn member_count(&self, room: &str) -> usize {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        rooms.get(room).map_or(0, HashMap::len)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn connection(id: ConnectionId) -> (Connection, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        (Connection::new(id, tx), rx)
    }

    #[test]
    fn emit_skips_excluded_members() {
        let rooms = RoomBroadcaster::new();
        let (a, mut a_rx) = connection(1);
        let (b, mut b_rx) = connection(2);
        rooms.join("g1", a);
        rooms.join("g1", b);

        let sent = rooms.emit("g1", &json!({"event": "ping"}), &[1]);
        assert_eq!(sent, 1);
        assert!(a_rx.try_recv().is_err());
        assert_eq!(b_rx.try_recv().unwrap(), r#"{"event":"ping"}"#);
    }

    #[test]
    fn emit_to_missing_room_is_a_no_op() {
        let rooms = RoomBroadcaster::new();
        assert_eq!(rooms.emit("nowhere", &json!({}), &[]), 0);
    }

    #[test]
    fn closed_members_are_skipped() {
        let rooms = RoomBroadcaster::new();
        let (a, a_rx) = connection(1);
        let (b, mut b_rx) = connection(2);
        rooms.join("g1", a);
        rooms.join("g1", b);
        drop(a_rx);

        assert_eq!(rooms.emit("g1", &json!({"n": 1}), &[]), 1);
        assert!(b_rx.try_recv().is_ok());
    }

    #[test]
    fn room_is_deleted_when_empty() {
        let rooms = RoomBroadcaster::new();
        let (a, _a_rx) = connection(1);
        let (b, _b_rx) = connection(2);
        rooms.join("g1", a);
        rooms.join("g1", b);
        assert_eq!(rooms.member_count("g1"), 2);

        rooms.leave("g1", 1);
        assert_eq!(rooms.member_count("g1"), 1);
        rooms.leave("g1", 2);
        assert_eq!(rooms.room_count(), 0);

        rooms.leave("g1", 2);
        assert_eq!(rooms.room_count(), 0);
    }
}
