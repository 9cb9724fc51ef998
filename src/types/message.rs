//! Relay request types

use super::ConnectionId;

/// Where a message is headed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single connection
    Private(ConnectionId),
    /// Every member of a room, minus the sender
    Room(String),
}

/// A chat message in transit. Never stored; built and consumed by one routing call.
#[derive(Debug, Clone)]
pub struct Message {
    pub sender: ConnectionId,
    pub target: Target,
    pub payload: String,
}

impl Message {
    pub fn private(
        sender: ConnectionId,
        receiver: ConnectionId,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            target: Target::Private(receiver),
            payload: payload.into(),
        }
    }

    pub fn to_room(
        sender: ConnectionId,
        room: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            target: Target::Room(room.into()),
            payload: payload.into(),
        }
    }
}
