use crate::registry::ConnectionRegistry;
use crate::room::Room;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tandem_core::{ConnectionId, RoomId};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinResult {
    /// The connection is alone in the room and waits for a peer.
    Waiting,
    /// The connection became the second member.
    Paired { incumbent: ConnectionId },
    /// Duplicate join. Nothing changed.
    AlreadyMember,
    /// The room already holds two members. Nothing changed.
    Full,
    /// The connection still sits in another room and must leave it first.
    InOtherRoom(RoomId),
    UnknownConnection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveResult {
    NotMember,
    Left {
        remaining: Option<ConnectionId>,
        room_deleted: bool,
    },
}

/// Rooms keyed by id, at most two members each.
///
/// Every mutation runs under the map's per-key lock for that room, so
/// unrelated rooms never contend. Lock order is always room entry first,
/// connection entry second.
#[derive(Clone)]
pub struct RoomTable {
    rooms: Arc<DashMap<RoomId, Room>>,
    registry: ConnectionRegistry,
}

impl RoomTable {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            registry,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn join(&self, room_id: &RoomId, conn: ConnectionId) -> JoinResult {
        self.join_with(room_id, conn, |_| {})
    }

    /// Like [`join`](Self::join), but runs `on_commit` with the outcome while
    /// the room entry is still held. Nothing else touches the room until it
    /// returns.
    pub fn join_with<F>(&self, room_id: &RoomId, conn: ConnectionId, on_commit: F) -> JoinResult
    where
        F: FnOnce(&JoinResult),
    {
        if !self.registry.exists(&conn) {
            return JoinResult::UnknownConnection;
        }
        match self.registry.current_room(&conn) {
            Some(current) if &current != room_id => return JoinResult::InOtherRoom(current),
            _ => {}
        }

        let mut room = self.rooms.entry(room_id.clone()).or_default();

        let result = if room.contains(&conn) {
            JoinResult::AlreadyMember
        } else if !room.push(conn) {
            debug!("Room {} is full, rejecting {}", room_id, conn);
            JoinResult::Full
        } else {
            self.registry.set_current_room(&conn, Some(room_id.clone()));
            match room.peer_of(&conn) {
                Some(incumbent) => JoinResult::Paired { incumbent },
                None => JoinResult::Waiting,
            }
        };

        on_commit(&result);
        result
    }

    pub fn leave(&self, room_id: &RoomId, conn: &ConnectionId) -> LeaveResult {
        self.leave_with(room_id, conn, |_| {})
    }

    /// Like [`leave`](Self::leave). `on_commit` receives the member left
    /// behind and runs before the room entry is released. It is not called
    /// when `conn` was not a member.
    pub fn leave_with<F>(
        &self,
        room_id: &RoomId,
        conn: &ConnectionId,
        on_commit: F,
    ) -> LeaveResult
    where
        F: FnOnce(Option<ConnectionId>),
    {
        let Some(mut room) = self.rooms.get_mut(room_id) else {
            return LeaveResult::NotMember;
        };
        if !room.remove(conn) {
            return LeaveResult::NotMember;
        }
        if self.registry.current_room(conn).as_ref() == Some(room_id) {
            self.registry.set_current_room(conn, None);
        }

        let remaining = room.incumbent();
        let empty = room.is_empty();
        on_commit(remaining);
        drop(room);

        // A join may have slipped in between releasing the entry and here.
        let room_deleted = empty
            && self
                .rooms
                .remove_if(room_id, |_, room| room.is_empty())
                .is_some();

        LeaveResult::Left {
            remaining,
            room_deleted,
        }
    }

    pub fn room_of(&self, conn: &ConnectionId) -> Option<RoomId> {
        self.registry.current_room(conn)
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// No empty rooms, no connection in two rooms, and the reverse index in
    /// the registry agrees with the member lists.
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashSet::new();
        for entry in self.rooms.iter() {
            let room = entry.value();
            if room.is_empty() {
                return false;
            }
            for member in room.members() {
                if !seen.insert(*member) {
                    return false;
                }
                if self.registry.current_room(member).as_ref() != Some(entry.key()) {
                    return false;
                }
            }
        }
        true
    }
}
