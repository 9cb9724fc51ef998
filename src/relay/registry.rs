//! Connection registry: the set of live client links

use std::collections::HashMap;

use super::events::{Envelope, Outbox};
use super::RelayError;
use crate::types::ConnectionId;

/// One registered connection
#[derive(Debug)]
pub struct ConnectionEntry {
    /// Username attached after login, if the client supplied one
    pub user: Option<String>,
    outbox: Outbox,
}

impl ConnectionEntry {
    /// Hand an envelope to the transport. False if the receiving side is gone.
    pub(crate) fn send(&self, envelope: Envelope) -> bool {
        self.outbox.send(envelope).is_ok()
    }
}

/// Tracks active connections. Not synchronized on its own; see [`super::Hub`].
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live connection
    pub fn register(
        &mut self,
        id: ConnectionId,
        user: Option<String>,
        outbox: Outbox,
    ) -> Result<(), RelayError> {
        if self.connections.contains_key(&id) {
            return Err(RelayError::DuplicateConnection(id));
        }

        self.connections.insert(id, ConnectionEntry { user, outbox });
        Ok(())
    }

    /// Remove a connection. Unknown ids are ignored.
    ///
    /// Dropping the entry drops its outbox, which closes the transport's receiver.
    pub fn deregister(&mut self, id: &ConnectionId) -> Option<ConnectionEntry> {
        self.connections.remove(id)
    }

    pub fn exists(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&ConnectionEntry> {
        self.connections.get(id)
    }

    /// Username attached to a connection, if any
    pub fn user_of(&self, id: &ConnectionId) -> Option<String> {
        self.connections.get(id).and_then(|entry| entry.user.clone())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
