//! Session gateway
//!
//! Drives the per-connection lifecycle
//! `Connected -> (Joined<room>)* -> Disconnected` and dispatches inbound
//! events to the router. Every compound step (join + notify, leave + notify,
//! deregister + notify) runs under a single hub lock.
//!
//! The gateway does not authenticate. Whoever accepts the connection is
//! expected to have done that already.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::events::{Envelope, Outbox, RelayEvent};
use super::{Hub, JoinOutcome, RelayError};
use crate::types::{ConnectionId, Message};

/// Inbound events from a transport
#[derive(Debug)]
pub enum GatewayEvent {
    Connect {
        user: Option<String>,
        outbox: Outbox,
    },
    JoinRoom {
        connection_id: ConnectionId,
        room: String,
    },
    LeaveRoom {
        connection_id: ConnectionId,
        room: String,
    },
    PrivateMessage {
        connection_id: ConnectionId,
        receiver: ConnectionId,
        payload: String,
    },
    RoomMessage {
        connection_id: ConnectionId,
        room: String,
        payload: String,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
}

/// What a dispatched event produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A new connection was registered under this id
    Connected(ConnectionId),
    /// Number of envelopes handed to outboxes
    Delivered(usize),
}

/// Entry point for transports
#[derive(Debug, Clone)]
pub struct Gateway {
    hub: Arc<Hub>,
}

impl Gateway {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Handle one inbound event
    pub fn dispatch(&self, event: GatewayEvent) -> Result<Dispatch, RelayError> {
        match event {
            GatewayEvent::Connect { user, outbox } => {
                self.on_connect(user, outbox).map(Dispatch::Connected)
            }
            GatewayEvent::JoinRoom { connection_id, room } => {
                Ok(Dispatch::Delivered(self.on_join_room(&connection_id, &room)))
            }
            GatewayEvent::LeaveRoom { connection_id, room } => {
                Ok(Dispatch::Delivered(self.on_leave_room(&connection_id, &room)))
            }
            GatewayEvent::PrivateMessage {
                connection_id,
                receiver,
                payload,
            } => Ok(Dispatch::Delivered(
                self.on_private_message(&connection_id, &receiver, &payload),
            )),
            GatewayEvent::RoomMessage {
                connection_id,
                room,
                payload,
            } => Ok(Dispatch::Delivered(
                self.on_room_message(&connection_id, &room, &payload),
            )),
            GatewayEvent::Disconnect { connection_id } => {
                Ok(Dispatch::Delivered(self.on_disconnect(&connection_id)))
            }
        }
    }

    /// Allocate and register a new connection, then greet it with its id
    pub fn on_connect(
        &self,
        user: Option<String>,
        outbox: Outbox,
    ) -> Result<ConnectionId, RelayError> {
        let id = ConnectionId::generate();
        let mut tables = self.hub.lock();

        if let Err(e) = tables.registry.register(id.clone(), user.clone(), outbox) {
            warn!(connection_id = %id, error = %e, "connection registration failed");
            return Err(e);
        }

        if let Some(entry) = tables.registry.get(&id) {
            entry.send(Envelope::new(RelayEvent::Connected {
                connection_id: id.clone(),
            }));
        }

        info!(connection_id = %id, user = ?user, "client connected");
        Ok(id)
    }

    /// Join a room and tell every member, the joiner included.
    /// Repeated joins and joins from unknown connections notify nobody.
    pub fn on_join_room(&self, id: &ConnectionId, room: &str) -> usize {
        let mut tables = self.hub.lock();

        match tables.join(room, id) {
            JoinOutcome::Joined => {
                let event = RelayEvent::MemberJoined {
                    room: room.to_string(),
                    connection_id: id.clone(),
                    user: tables.registry.user_of(id),
                };
                let delivered = tables.router().route_to_room(room, event, None);
                info!(connection_id = %id, room = %room, "joined room");
                delivered
            }
            JoinOutcome::AlreadyMember => 0,
            JoinOutcome::UnknownConnection => {
                debug!(
                    connection_id = %id,
                    room = %room,
                    "join from unregistered connection ignored"
                );
                0
            }
        }
    }

    /// Leave a room and tell the members that remain
    pub fn on_leave_room(&self, id: &ConnectionId, room: &str) -> usize {
        let mut tables = self.hub.lock();

        if !tables.rooms.leave(room, id) {
            return 0;
        }

        let event = RelayEvent::MemberLeft {
            room: room.to_string(),
            connection_id: id.clone(),
        };
        debug!(connection_id = %id, room = %room, "left room");
        tables.router().route_to_room(room, event, None)
    }

    pub fn on_private_message(
        &self,
        id: &ConnectionId,
        receiver: &ConnectionId,
        payload: &str,
    ) -> usize {
        self.hub.route(&Message::private(id.clone(), receiver.clone(), payload))
    }

    pub fn on_room_message(&self, id: &ConnectionId, room: &str, payload: &str) -> usize {
        self.hub.route(&Message::to_room(id.clone(), room, payload))
    }

    /// Deregister the connection, drop its memberships and tell the rooms it was in.
    /// Safe to call more than once.
    pub fn on_disconnect(&self, id: &ConnectionId) -> usize {
        let mut tables = self.hub.lock();

        let Some(rooms) = tables.deregister(id) else {
            return 0;
        };

        let router = tables.router();
        let delivered: usize = rooms
            .iter()
            .map(|room| {
                let event = RelayEvent::MemberLeft {
                    room: room.clone(),
                    connection_id: id.clone(),
                };
                router.route_to_room(room, event, None)
            })
            .sum();

        info!(connection_id = %id, rooms = rooms.len(), "client disconnected");
        delivered
    }
}
