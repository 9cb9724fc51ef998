//! Real-time messaging relay
//!
//! In-memory core that tracks connections and rooms and routes chat traffic
//! between them. Transport-agnostic: each connection is represented by an
//! [`Outbox`] whose receiving half is drained by whatever transport accepted
//! it (the WebSocket handler in this crate).
//!
//! ## Components
//! - [`ConnectionRegistry`] - live connections
//! - [`RoomTable`] - room name to member set
//! - [`MessageRouter`] - private and room delivery
//! - [`Gateway`] - per-connection lifecycle and event dispatch
//!
//! All of them operate on tables owned by one [`Hub`]. The hub keeps the
//! registry and room table behind a single lock so that a join racing a
//! disconnect can never leave a member that is no longer registered.

pub mod events;
pub mod gateway;
pub mod registry;
pub mod rooms;
pub mod router;

use std::collections::HashSet;

use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

pub use events::{Envelope, Outbox, RelayEvent};
pub use gateway::{Dispatch, Gateway, GatewayEvent};
pub use registry::{ConnectionEntry, ConnectionRegistry};
pub use rooms::RoomTable;
pub use router::MessageRouter;

use crate::types::{ConnectionId, Message};

/// Relay errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("connection {0} is already registered")]
    DuplicateConnection(ConnectionId),
}

/// Result of a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Newly added to the room
    Joined,
    /// Was already a member; nothing changed
    AlreadyMember,
    /// Connection is not registered (e.g. already disconnected); nothing changed
    UnknownConnection,
}

/// Registry and room table, always mutated together
#[derive(Debug, Default)]
pub struct RelayTables {
    pub registry: ConnectionRegistry,
    pub rooms: RoomTable,
}

impl RelayTables {
    pub fn router(&self) -> MessageRouter<'_> {
        MessageRouter::new(&self.registry, &self.rooms)
    }

    fn join(&mut self, room: &str, id: &ConnectionId) -> JoinOutcome {
        if !self.registry.exists(id) {
            return JoinOutcome::UnknownConnection;
        }
        if self.rooms.join(room, id) {
            JoinOutcome::Joined
        } else {
            JoinOutcome::AlreadyMember
        }
    }

    /// Deregister and drop all memberships. Returns the rooms the connection was in.
    fn deregister(&mut self, id: &ConnectionId) -> Option<Vec<String>> {
        self.registry.deregister(id)?;
        Some(self.rooms.leave_all(id))
    }
}

/// Shared relay state, constructed once at startup and passed to handlers
#[derive(Debug, Default)]
pub struct Hub {
    tables: Mutex<RelayTables>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock both tables for a compound operation
    pub(crate) fn lock(&self) -> MutexGuard<'_, RelayTables> {
        self.tables.lock()
    }

    // Connection registry

    pub fn register(
        &self,
        id: ConnectionId,
        user: Option<String>,
        outbox: Outbox,
    ) -> Result<(), RelayError> {
        self.lock().registry.register(id, user, outbox)
    }

    /// Remove a connection and every membership it holds. Idempotent.
    pub fn deregister(&self, id: &ConnectionId) -> Vec<String> {
        let left = self.lock().deregister(id);
        if left.is_none() {
            debug!(connection_id = %id, "deregister of unknown connection ignored");
        }
        left.unwrap_or_default()
    }

    pub fn exists(&self, id: &ConnectionId) -> bool {
        self.lock().registry.exists(id)
    }

    // Room membership

    pub fn join(&self, room: &str, id: &ConnectionId) -> JoinOutcome {
        self.lock().join(room, id)
    }

    pub fn leave(&self, room: &str, id: &ConnectionId) -> bool {
        self.lock().rooms.leave(room, id)
    }

    pub fn leave_all(&self, id: &ConnectionId) -> Vec<String> {
        self.lock().rooms.leave_all(id)
    }

    pub fn members_of(&self, room: &str) -> HashSet<ConnectionId> {
        self.lock().rooms.members_of(room)
    }

    // Routing

    pub fn route_private(
        &self,
        sender: &ConnectionId,
        receiver: &ConnectionId,
        payload: &str,
    ) -> usize {
        self.lock().router().route_private(sender, receiver, payload)
    }

    pub fn route_to_room(
        &self,
        room: &str,
        event: RelayEvent,
        exclude: Option<&ConnectionId>,
    ) -> usize {
        self.lock().router().route_to_room(room, event, exclude)
    }

    pub fn route(&self, message: &Message) -> usize {
        self.lock().router().route(message)
    }

    // Stats

    pub fn connection_count(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn room_count(&self) -> usize {
        self.lock().rooms.room_count()
    }

    pub fn room_names(&self) -> Vec<String> {
        self.lock().rooms.room_names()
    }
}
