//! Message router
//!
//! Resolves targets against the registry and room table, then hands each
//! target its own copy of the envelope. Delivery is best-effort and
//! at-most-once: a private message to a connection that is not registered is
//! dropped without telling the sender, and a closed outbox on one member does
//! not stop the rest of the room from receiving.

use tracing::debug;

use super::events::{Envelope, RelayEvent};
use super::registry::ConnectionRegistry;
use super::rooms::RoomTable;
use crate::types::{ConnectionId, Message, Target};

/// Borrowing view over the relay tables used for one routing call
pub struct MessageRouter<'a> {
    registry: &'a ConnectionRegistry,
    rooms: &'a RoomTable,
}

impl<'a> MessageRouter<'a> {
    pub fn new(registry: &'a ConnectionRegistry, rooms: &'a RoomTable) -> Self {
        Self { registry, rooms }
    }

    /// Deliver a direct message. Returns the number of deliveries (0 or 1).
    pub fn route_private(
        &self,
        sender: &ConnectionId,
        receiver: &ConnectionId,
        payload: &str,
    ) -> usize {
        let Some(target) = self.registry.get(receiver) else {
            debug!(
                sender = %sender,
                receiver = %receiver,
                "dropping private message to unknown receiver"
            );
            return 0;
        };

        let event = RelayEvent::PrivateMessage {
            sender: sender.clone(),
            sender_name: self.registry.user_of(sender),
            message: payload.to_string(),
        };

        if target.send(Envelope::new(event)) {
            1
        } else {
            debug!(receiver = %receiver, "receiver outbox closed");
            0
        }
    }

    /// Deliver an event to every member of a room except `exclude`.
    /// Returns the number of successful deliveries.
    pub fn route_to_room(
        &self,
        room: &str,
        event: RelayEvent,
        exclude: Option<&ConnectionId>,
    ) -> usize {
        let envelope = Envelope::new(event);
        let mut delivered = 0;

        for member in self.rooms.members(room) {
            if exclude == Some(member) {
                continue;
            }
            match self.registry.get(member) {
                Some(entry) if entry.send(envelope.clone()) => delivered += 1,
                Some(_) => debug!(room = %room, member = %member, "member outbox closed"),
                None => debug!(room = %room, member = %member, "member not registered"),
            }
        }

        delivered
    }

    /// Route a chat [`Message`]. Room messages skip the sender and require
    /// the sender to be a member of the room.
    pub fn route(&self, message: &Message) -> usize {
        match &message.target {
            Target::Private(receiver) => {
                self.route_private(&message.sender, receiver, &message.payload)
            }
            Target::Room(room) => {
                if !self.rooms.is_member(room, &message.sender) {
                    debug!(
                        room = %room,
                        sender = %message.sender,
                        "sender is not a member, dropping"
                    );
                    return 0;
                }
                let event = RelayEvent::RoomMessage {
                    room: room.clone(),
                    sender: message.sender.clone(),
                    sender_name: self.registry.user_of(&message.sender),
                    message: message.payload.clone(),
                };
                self.route_to_room(room, event, Some(&message.sender))
            }
        }
    }
}
