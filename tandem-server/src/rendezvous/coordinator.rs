use crate::rendezvous::Notification;
use crate::room::{JoinResult, LeaveResult, RoomTable};
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use tandem_core::{ConnectionId, RoomId, ServerMessage};
use tracing::{debug, info, warn};

/// Pairs participants and tells each side who its counterpart is.
///
/// The joiner that completes a pair is the offerer and the incumbent is the
/// answerer. Both notifications come out of the same committed join, so the
/// assignment never depends on delivery order.
///
/// Notifications are pushed to the outboxes before the room entry is
/// released. A leave racing a join in the same room therefore always reaches
/// the survivor after the pairing it undoes.
#[derive(Clone)]
pub struct RendezvousCoordinator {
    rooms: RoomTable,
    output: Arc<dyn SignalingOutput>,
}

impl RendezvousCoordinator {
    pub fn new(rooms: RoomTable, output: Arc<dyn SignalingOutput>) -> Self {
        Self { rooms, output }
    }

    pub fn rooms(&self) -> &RoomTable {
        &self.rooms
    }

    pub fn join(&self, room_id: RoomId, conn: ConnectionId) -> JoinResult {
        if let Some(current) = self.rooms.room_of(&conn) {
            if current != room_id {
                info!("Connection {} switches from room {} to {}", conn, current, room_id);
                self.leave(&current, &conn);
            }
        }

        let result = self.rooms.join_with(&room_id, conn, |result| {
            self.dispatch(join_notifications(result, &room_id, conn));
        });

        match &result {
            JoinResult::Waiting => {
                info!("Connection {} waiting for a peer in room {}", conn, room_id);
            }
            JoinResult::Paired { incumbent } => {
                info!(
                    "Paired {} (offerer) with {} (answerer) in room {}",
                    conn, incumbent, room_id
                );
            }
            JoinResult::AlreadyMember => {
                debug!("Duplicate join of {} to room {}", conn, room_id);
            }
            JoinResult::Full => {
                warn!("Room {} is full, {} turned away", room_id, conn);
            }
            JoinResult::InOtherRoom(other) => {
                warn!("Connection {} still listed in room {}", conn, other);
            }
            JoinResult::UnknownConnection => {
                debug!("Join from unregistered connection {}", conn);
            }
        }
        result
    }

    /// Returns whether the connection was actually a member.
    pub fn leave(&self, room_id: &RoomId, conn: &ConnectionId) -> bool {
        let result = self.rooms.leave_with(room_id, conn, |remaining| {
            if let Some(peer) = remaining {
                self.dispatch(vec![Notification::new(
                    peer,
                    ServerMessage::PeerLeft { peer_id: *conn },
                )]);
            }
        });

        match result {
            LeaveResult::NotMember => {
                debug!("Leave of {} from room {} ignored (not a member)", conn, room_id);
                false
            }
            LeaveResult::Left { room_deleted, .. } => {
                info!("Connection {} left room {}", conn, room_id);
                if room_deleted {
                    info!("Room {} deleted (empty)", room_id);
                }
                true
            }
        }
    }

    /// Leaves the connection's room while it is still resolvable, then drops
    /// it from the registry.
    pub fn disconnect(&self, conn: &ConnectionId) {
        if let Some(room_id) = self.rooms.room_of(conn) {
            self.leave(&room_id, conn);
        }
        self.rooms.registry().unregister(conn);
        info!("Connection {} disconnected", conn);
    }

    fn dispatch(&self, notifications: Vec<Notification>) {
        for Notification { target, message } in notifications {
            if !self.output.deliver(target, message) {
                debug!("Notification for {} dropped (gone)", target);
            }
        }
    }
}

fn join_notifications(
    result: &JoinResult,
    room_id: &RoomId,
    conn: ConnectionId,
) -> Vec<Notification> {
    match result {
        JoinResult::Paired { incumbent } => vec![
            Notification::new(*incumbent, ServerMessage::PeerJoined { peer_id: conn }),
            Notification::new(
                conn,
                ServerMessage::PeerAlreadyPresent {
                    peer_id: *incumbent,
                },
            ),
        ],
        JoinResult::Full => vec![Notification::new(
            conn,
            ServerMessage::RoomFull {
                room_id: room_id.clone(),
            },
        )],
        _ => Vec::new(),
    }
}
