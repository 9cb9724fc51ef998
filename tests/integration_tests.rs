//! Integration tests for the chat relay core

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use chat_relay::relay::{Envelope, Gateway, Hub, JoinOutcome, RelayEvent};
use chat_relay::{ConnectionId, RelayError};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};

fn register(hub: &Hub, id: &str) -> UnboundedReceiver<Envelope> {
    let (tx, rx) = mpsc::unbounded_channel();
    hub.register(ConnectionId::from(id), None, tx).unwrap();
    rx
}

fn drain(rx: &mut UnboundedReceiver<Envelope>) -> Vec<RelayEvent> {
    let mut out = Vec::new();
    while let Ok(env) = rx.try_recv() {
        out.push(env.event);
    }
    out
}

#[test]
fn test_register_then_deregister_clears_everything() {
    let hub = Hub::new();
    let _rx = register(&hub, "c");
    let c = ConnectionId::from("c");
    for room in ["lobby", "general", "random"] {
        hub.join(room, &c);
    }

    hub.deregister(&c);

    assert!(!hub.exists(&c));
    for room in ["lobby", "general", "random"] {
        assert!(!hub.members_of(room).contains(&c));
    }
}

#[test]
fn test_duplicate_registration_fails() {
    let hub = Hub::new();
    let _rx = register(&hub, "c");
    let (tx, _rx2) = mpsc::unbounded_channel();

    let err = hub.register(ConnectionId::from("c"), None, tx).unwrap_err();

    assert_eq!(err, RelayError::DuplicateConnection(ConnectionId::from("c")));
}

#[test]
fn test_deregister_unknown_is_noop() {
    let hub = Hub::new();
    assert!(hub.deregister(&ConnectionId::from("ghost")).is_empty());
}

#[test]
fn test_double_join_keeps_member_count() {
    let hub = Hub::new();
    let _rx = register(&hub, "c");
    let c = ConnectionId::from("c");

    assert_eq!(hub.join("general", &c), JoinOutcome::Joined);
    let before = hub.members_of("general").len();
    assert_eq!(hub.join("general", &c), JoinOutcome::AlreadyMember);

    assert_eq!(hub.members_of("general").len(), before);
}

#[test]
fn test_private_message_to_never_registered_receiver() {
    let hub = Hub::new();
    let mut rx = register(&hub, "s");

    let delivered = hub.route_private(&ConnectionId::from("s"), &ConnectionId::from("r"), "hello");

    assert_eq!(delivered, 0);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_lobby_delivery_excludes_sender() {
    let hub = Hub::new();
    let ids = ["s", "a", "b", "c"];
    let mut receivers: Vec<_> = ids.iter().map(|id| register(&hub, id)).collect();
    for id in ids {
        hub.join("lobby", &ConnectionId::from(id));
    }

    let delivered = hub.route_to_room("lobby", RelayEvent::Pong, Some(&ConnectionId::from("s")));

    assert_eq!(delivered, 3);
    assert!(drain(&mut receivers[0]).is_empty());
    for rx in &mut receivers[1..] {
        assert_eq!(drain(rx), vec![RelayEvent::Pong]);
    }
}

#[test]
fn test_general_scenario_hi() {
    let gateway = Gateway::new(Arc::new(Hub::new()));
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let a = gateway.on_connect(Some("alice".to_string()), tx_a).unwrap();
    let b = gateway.on_connect(None, tx_b).unwrap();
    gateway.on_join_room(&a, "general");
    gateway.on_join_room(&b, "general");
    drain(&mut rx_a);
    drain(&mut rx_b);

    gateway.on_room_message(&a, "general", "hi");

    assert!(drain(&mut rx_a).is_empty());
    let received = drain(&mut rx_b);
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0],
        RelayEvent::RoomMessage {
            room: "general".to_string(),
            sender: a,
            sender_name: Some("alice".to_string()),
            message: "hi".to_string(),
        }
    );
}

#[test]
fn test_disconnect_during_room_broadcasts() {
    let hub = Arc::new(Hub::new());
    let mut rx_a = register(&hub, "a");
    let mut rx_b = register(&hub, "b");
    let a = ConnectionId::from("a");
    let b = ConnectionId::from("b");
    hub.join("general", &a);
    hub.join("general", &b);

    let stop = Arc::new(AtomicBool::new(false));
    let rounds = Arc::new(AtomicUsize::new(0));
    let broadcaster = {
        let hub = Arc::clone(&hub);
        let stop = Arc::clone(&stop);
        let rounds = Arc::clone(&rounds);
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                hub.route_to_room("general", RelayEvent::Pong, None);
                rounds.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    // let some broadcasts be in flight before A leaves
    while rounds.load(Ordering::SeqCst) < 10 {
        thread::yield_now();
    }
    hub.deregister(&a);
    stop.store(true, Ordering::SeqCst);
    broadcaster.join().unwrap();

    // After deregistration only B is reachable
    assert_eq!(hub.route_to_room("general", RelayEvent::Pong, None), 1);

    // Whatever A got before it left, its channel is now closed for good
    drain(&mut rx_a);
    assert_eq!(rx_a.try_recv().unwrap_err(), TryRecvError::Disconnected);
    assert!(!drain(&mut rx_b).is_empty());
}

#[test]
fn test_concurrent_connections_through_gateway() {
    let gateway = Gateway::new(Arc::new(Hub::new()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let gateway = gateway.clone();
            thread::spawn(move || {
                let (tx, _rx) = mpsc::unbounded_channel();
                let id = gateway.on_connect(None, tx).unwrap();
                gateway.on_join_room(&id, "general");
                gateway.on_room_message(&id, "general", "hello");
                gateway.on_disconnect(&id);
                gateway.on_disconnect(&id);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let hub = gateway.hub();
    assert_eq!(hub.connection_count(), 0);
    assert!(hub.members_of("general").is_empty());
    // empty rooms are kept
    assert_eq!(hub.room_names(), vec!["general".to_string()]);
}
