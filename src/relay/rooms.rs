//! Room membership table
//!
//! Rooms are created on first join and are never removed, so a room that
//! loses its last member stays listed with an empty member set.

use std::collections::{HashMap, HashSet};

use crate::types::ConnectionId;

/// Maps room name to its member connections
#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room, creating the room if needed.
    /// Returns true if the connection was not already a member.
    pub fn join(&mut self, room: &str, id: &ConnectionId) -> bool {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(id.clone())
    }

    /// Remove a connection from one room. Unknown rooms are a no-op.
    pub fn leave(&mut self, room: &str, id: &ConnectionId) -> bool {
        self.rooms
            .get_mut(room)
            .map(|members| members.remove(id))
            .unwrap_or(false)
    }

    /// Remove a connection from every room, returning the rooms it was in
    pub fn leave_all(&mut self, id: &ConnectionId) -> Vec<String> {
        let mut left: Vec<String> = self
            .rooms
            .iter_mut()
            .filter_map(|(name, members)| members.remove(id).then(|| name.clone()))
            .collect();
        left.sort();
        left
    }

    /// Current members of a room; empty for a room that does not exist
    pub fn members_of(&self, room: &str) -> HashSet<ConnectionId> {
        self.rooms.get(room).cloned().unwrap_or_default()
    }

    pub(crate) fn members(&self, room: &str) -> impl Iterator<Item = &ConnectionId> {
        self.rooms.get(room).into_iter().flatten()
    }

    pub fn is_member(&self, room: &str, id: &ConnectionId) -> bool {
        self.rooms
            .get(room)
            .map(|members| members.contains(id))
            .unwrap_or(false)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rooms.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ConnectionId {
        ConnectionId::from(s)
    }

    #[test]
    fn test_join_creates_room_lazily() {
        let mut rooms = RoomTable::new();
        assert_eq!(rooms.room_count(), 0);

        assert!(rooms.join("general", &id("a")));

        assert_eq!(rooms.room_count(), 1);
        assert!(rooms.is_member("general", &id("a")));
    }

    #[test]
    fn test_join_twice_is_idempotent() {
        let mut rooms = RoomTable::new();
        assert!(rooms.join("general", &id("a")));
        assert!(!rooms.join("general", &id("a")));

        assert_eq!(rooms.members_of("general").len(), 1);
    }

    #[test]
    fn test_members_of_unknown_room_is_empty() {
        let rooms = RoomTable::new();
        assert!(rooms.members_of("nowhere").is_empty());
        assert_eq!(rooms.members("nowhere").count(), 0);
    }

    #[test]
    fn test_leave_unknown_room_is_noop() {
        let mut rooms = RoomTable::new();
        assert!(!rooms.leave("nowhere", &id("a")));
        assert_eq!(rooms.room_count(), 0);
    }

    #[test]
    fn test_leave_all_removes_from_every_room() {
        let mut rooms = RoomTable::new();
        rooms.join("general", &id("a"));
        rooms.join("random", &id("a"));
        rooms.join("random", &id("b"));

        let left = rooms.leave_all(&id("a"));

        assert_eq!(left, vec!["general".to_string(), "random".to_string()]);
        assert!(!rooms.is_member("general", &id("a")));
        assert!(!rooms.is_member("random", &id("a")));
        assert!(rooms.is_member("random", &id("b")));
    }

    #[test]
    fn test_empty_rooms_are_retained() {
        let mut rooms = RoomTable::new();
        rooms.join("general", &id("a"));
        rooms.leave("general", &id("a"));

        assert_eq!(rooms.room_names(), vec!["general".to_string()]);
        assert!(rooms.members_of("general").is_empty());
    }
}
