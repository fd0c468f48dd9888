use tandem_core::ConnectionId;

/// Hard member cap of a room.
pub const ROOM_CAPACITY: usize = 2;

/// Members in arrival order. The first entry is the incumbent.
#[derive(Debug, Default, Clone)]
pub struct Room {
    members: heapless::Vec<ConnectionId, ROOM_CAPACITY>,
}

impl Room {
    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    pub fn incumbent(&self) -> Option<ConnectionId> {
        self.members.first().copied()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.members.contains(id)
    }

    /// The other member, if any.
    pub fn peer_of(&self, id: &ConnectionId) -> Option<ConnectionId> {
        self.members.iter().find(|m| *m != id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.is_full()
    }

    pub(crate) fn push(&mut self, id: ConnectionId) -> bool {
        self.members.push(id).is_ok()
    }

    pub(crate) fn remove(&mut self, id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != id);
        self.members.len() != before
    }
}
