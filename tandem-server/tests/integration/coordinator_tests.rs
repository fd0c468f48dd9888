use std::sync::{Arc, Mutex, mpsc as std_mpsc};
use std::thread;
use std::time::Duration;

use tandem_core::{ConnectionId, RoomId, ServerMessage};
use tandem_server::{
    ConnectionRegistry, JoinResult, RendezvousCoordinator, RoomTable, SignalingOutput,
};
use tokio::sync::mpsc;

use crate::utils::{MockSignalingOutput, TestService, init_tracing};

#[test]
fn test_joiner_is_told_incumbent_is_present_and_incumbent_is_told_peer_joined() {
    init_tracing();
    let mut t = TestService::new();
    let a = t.connect();
    let b = t.connect();
    let room = RoomId::from("room-7");

    assert_eq!(
        t.service.coordinator().join(room.clone(), a),
        JoinResult::Waiting
    );
    assert!(t.output.all().is_empty(), "a lone joiner hears nothing");

    assert_eq!(
        t.service.coordinator().join(room.clone(), b),
        JoinResult::Paired { incumbent: a }
    );
    assert_eq!(
        t.output.messages_for(&a),
        vec![ServerMessage::PeerJoined { peer_id: b }]
    );
    assert_eq!(
        t.output.messages_for(&b),
        vec![ServerMessage::PeerAlreadyPresent { peer_id: a }]
    );
}

#[test]
fn test_leave_notifies_the_remaining_peer() {
    init_tracing();
    let mut t = TestService::new();
    let a = t.connect();
    let b = t.connect();
    let room = RoomId::from("r");
    let coordinator = t.service.coordinator().clone();

    coordinator.join(room.clone(), a);
    coordinator.join(room.clone(), b);
    t.output.clear();

    assert!(coordinator.leave(&room, &a));
    assert_eq!(
        t.output.messages_for(&b),
        vec![ServerMessage::PeerLeft { peer_id: a }]
    );
    assert_eq!(coordinator.rooms().members(&room), vec![b]);
}

#[test]
fn test_second_leave_is_a_no_op() {
    init_tracing();
    let mut t = TestService::new();
    let a = t.connect();
    let b = t.connect();
    let room = RoomId::from("r");
    let coordinator = t.service.coordinator().clone();

    coordinator.join(room.clone(), a);
    coordinator.join(room.clone(), b);
    coordinator.leave(&room, &a);
    t.output.clear();

    assert!(!coordinator.leave(&room, &a));
    assert!(t.output.all().is_empty());
    assert_eq!(coordinator.rooms().members(&room), vec![b]);
}

#[test]
fn test_switching_rooms_leaves_the_previous_one() {
    init_tracing();
    let mut t = TestService::new();
    let a = t.connect();
    let b = t.connect();
    let first = RoomId::from("first");
    let second = RoomId::from("second");
    let coordinator = t.service.coordinator().clone();

    coordinator.join(first.clone(), a);
    coordinator.join(first.clone(), b);
    t.output.clear();

    assert_eq!(coordinator.join(second.clone(), a), JoinResult::Waiting);
    assert_eq!(
        t.output.messages_for(&b),
        vec![ServerMessage::PeerLeft { peer_id: a }]
    );
    assert_eq!(coordinator.rooms().room_of(&a), Some(second));
    assert_eq!(coordinator.rooms().members(&first), vec![b]);
    assert!(coordinator.rooms().is_consistent());
}

#[test]
fn test_third_joiner_gets_room_full_and_members_hear_nothing() {
    init_tracing();
    let mut t = TestService::new();
    let a = t.connect();
    let b = t.connect();
    let c = t.connect();
    let room = RoomId::from("r");
    let coordinator = t.service.coordinator().clone();

    coordinator.join(room.clone(), a);
    coordinator.join(room.clone(), b);
    t.output.clear();

    assert_eq!(coordinator.join(room.clone(), c), JoinResult::Full);
    assert_eq!(
        t.output.all().into_iter().map(|d| d.target).collect::<Vec<_>>(),
        vec![c]
    );
    assert_eq!(
        t.output.messages_for(&c),
        vec![ServerMessage::RoomFull { room_id: room.clone() }]
    );
    assert_eq!(coordinator.rooms().members(&room), vec![a, b]);
}

#[test]
fn test_duplicate_join_emits_nothing() {
    init_tracing();
    let mut t = TestService::new();
    let a = t.connect();
    let b = t.connect();
    let room = RoomId::from("r");
    let coordinator = t.service.coordinator().clone();

    coordinator.join(room.clone(), a);
    coordinator.join(room.clone(), b);
    t.output.clear();

    assert_eq!(coordinator.join(room.clone(), b), JoinResult::AlreadyMember);
    assert!(t.output.all().is_empty());
}

#[test]
fn test_disconnect_leaves_room_before_unregistering() {
    init_tracing();
    let mut t = TestService::new();
    let a = t.connect();
    let b = t.connect();
    let room = RoomId::from("r");

    t.service.coordinator().join(room.clone(), a);
    t.service.coordinator().join(room.clone(), b);
    t.output.clear();

    t.service.disconnect(b);

    assert_eq!(
        t.output.messages_for(&a),
        vec![ServerMessage::PeerLeft { peer_id: b }]
    );
    assert!(!t.service.registry().exists(&b));
    assert_eq!(t.service.coordinator().rooms().members(&room), vec![a]);

    t.service.disconnect(a);
    assert_eq!(t.service.stats().rooms, 0);
    assert_eq!(t.service.stats().connections, 0);
}

#[test]
fn test_disconnect_of_unknown_connection_is_harmless() {
    init_tracing();
    let t = TestService::new();
    t.service.disconnect(ConnectionId::new());
    assert!(t.output.all().is_empty());
}

/// Records, for every `peer-joined` it delivers, whether both members were
/// already recorded in the registry's reverse index at that moment.
struct CommitCheckingOutput {
    rooms: RoomTable,
    room: RoomId,
    observed: Mutex<Vec<bool>>,
}

impl SignalingOutput for CommitCheckingOutput {
    fn deliver(&self, target: ConnectionId, msg: ServerMessage) -> bool {
        if let ServerMessage::PeerJoined { peer_id } = msg {
            let committed = self.rooms.room_of(&target).as_ref() == Some(&self.room)
                && self.rooms.room_of(&peer_id).as_ref() == Some(&self.room);
            if let Ok(mut observed) = self.observed.lock() {
                observed.push(committed);
            }
        }
        true
    }
}

#[test]
fn test_notifications_are_sent_after_the_join_is_committed() {
    init_tracing();
    let registry = ConnectionRegistry::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    registry.register(a, tx.clone());
    registry.register(b, tx);

    let room = RoomId::from("r");
    let table = RoomTable::new(registry);
    let output = Arc::new(CommitCheckingOutput {
        rooms: table.clone(),
        room: room.clone(),
        observed: Mutex::new(Vec::new()),
    });
    let coordinator = RendezvousCoordinator::new(table, output.clone());

    coordinator.join(room.clone(), a);
    coordinator.join(room.clone(), b);

    assert_eq!(*output.observed.lock().unwrap(), vec![true]);
}

/// Holds up delivery of `peer-already-present` until released, announcing
/// when it has started.
struct StallingOutput {
    inner: MockSignalingOutput,
    started: Mutex<Option<std_mpsc::Sender<()>>>,
    stall: Duration,
}

impl SignalingOutput for StallingOutput {
    fn deliver(&self, target: ConnectionId, msg: ServerMessage) -> bool {
        if let ServerMessage::PeerAlreadyPresent { .. } = msg {
            if let Some(started) = self.started.lock().unwrap().take() {
                let _ = started.send(());
            }
            thread::sleep(self.stall);
        }
        self.inner.deliver(target, msg)
    }
}

#[test]
fn test_leave_racing_a_join_reaches_the_joiner_after_the_pairing() {
    init_tracing();
    let registry = ConnectionRegistry::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    registry.register(a, tx.clone());
    registry.register(b, tx);

    let (started_tx, started_rx) = std_mpsc::channel();
    let recorder = MockSignalingOutput::new(registry.clone());
    let output = Arc::new(StallingOutput {
        inner: recorder.clone(),
        started: Mutex::new(Some(started_tx)),
        stall: Duration::from_millis(100),
    });
    let coordinator = RendezvousCoordinator::new(RoomTable::new(registry), output);
    let room = RoomId::from("r");

    coordinator.join(room.clone(), a);

    let joiner = {
        let coordinator = coordinator.clone();
        let room = room.clone();
        thread::spawn(move || coordinator.join(room, b))
    };
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("pairing delivery started");
    assert!(coordinator.leave(&room, &a));
    assert_eq!(joiner.join().unwrap(), JoinResult::Paired { incumbent: a });

    assert_eq!(
        recorder.messages_for(&b),
        vec![
            ServerMessage::PeerAlreadyPresent { peer_id: a },
            ServerMessage::PeerLeft { peer_id: a },
        ]
    );
    assert_eq!(coordinator.rooms().members(&room), vec![b]);
}

#[test]
fn test_concurrent_joiners_never_overfill_a_room() {
    init_tracing();
    let mut t = TestService::new();
    let ids: Vec<_> = (0..16).map(|_| t.connect()).collect();
    let room = RoomId::from("contended");

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let coordinator = t.service.coordinator().clone();
                let room = room.clone();
                let id = *id;
                scope.spawn(move || coordinator.join(room, id))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut admitted = 0;
    let mut full = 0;
    for result in results {
        match result {
            JoinResult::Waiting | JoinResult::Paired { .. } => admitted += 1,
            JoinResult::Full => full += 1,
            other => panic!("unexpected join result {:?}", other),
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(full, 14);
    assert_eq!(t.service.coordinator().rooms().members(&room).len(), 2);
    assert!(t.service.coordinator().rooms().is_consistent());
}
