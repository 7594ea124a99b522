//! Room registry
//!
//! Process-wide map from room name to room. The registry lock is only held
//! for map access; room membership has its own lock. When both are needed the
//! registry lock is taken first.

use super::room::Room;
use super::RelayError;
use log::info;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Size reported for a room that does not exist
pub const MISSING_ROOM_SIZE: i64 = -1;

/// All active rooms
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty room under `name`.
    ///
    /// A closed room still waiting for removal is replaced.
    pub fn create(&self, name: &str) -> Result<Arc<Room>, RelayError> {
        if name.is_empty() {
            return Err(RelayError::InvalidRoomName);
        }

        let mut rooms = self.rooms.write();
        if let Some(existing) = rooms.get(name) {
            if !existing.is_closed() {
                return Err(RelayError::RoomConflict(name.to_string()));
            }
        }

        let room = Arc::new(Room::new(name));
        rooms.insert(name.to_string(), room.clone());
        info!("Room {} created ({} rooms active)", name, rooms.len());
        Ok(room)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Room>> {
        self.rooms.read().get(name).cloned()
    }

    /// Remove a room by name; no-op if absent
    pub fn delete(&self, name: &str) -> Option<Arc<Room>> {
        let removed = self.rooms.write().remove(name);
        if removed.is_some() {
            info!("Room {} deleted", name);
        }
        removed
    }

    /// Remove `room` if it is still the registered instance and has been
    /// closed by its last peer leaving.
    pub fn remove_if_empty(&self, room: &Arc<Room>) -> bool {
        let mut rooms = self.rooms.write();
        let registered = rooms
            .get(room.name())
            .is_some_and(|current| Arc::ptr_eq(current, room));
        if registered && room.is_closed() {
            rooms.remove(room.name());
            info!("Room {} is empty, removed after {:?}", room.name(), room.age());
            return true;
        }
        false
    }

    /// Peer count of a room, or `MISSING_ROOM_SIZE`
    pub fn size(&self, name: &str) -> i64 {
        match self.get(name) {
            Some(room) if !room.is_closed() => room.count() as i64,
            _ => MISSING_ROOM_SIZE,
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// Total peers across all rooms
    pub fn peer_count(&self) -> usize {
        let rooms: Vec<Arc<Room>> = self.rooms.read().values().cloned().collect();
        rooms.iter().map(|room| room.count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::Peer;
    use crate::transport::ConnectionHandle;

    fn join(room: &Room) -> crate::relay::PeerId {
        let id = room.next_peer_id();
        let (handle, _outbox) = ConnectionHandle::new(id, 4);
        room.add_peer(Peer::new(id, handle)).unwrap();
        id
    }

    #[test]
    fn test_create_twice_conflicts() {
        let registry = RoomRegistry::new();
        let room = registry.create("r1").unwrap();
        join(&room);

        assert_eq!(
            registry.create("r1").unwrap_err(),
            RelayError::RoomConflict("r1".to_string())
        );
        assert_eq!(registry.size("r1"), 1);
        assert!(Arc::ptr_eq(&registry.get("r1").unwrap(), &room));
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let registry = RoomRegistry::new();
        assert_eq!(registry.create("").unwrap_err(), RelayError::InvalidRoomName);
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_size_sentinel() {
        let registry = RoomRegistry::new();
        assert_eq!(registry.size("nope"), MISSING_ROOM_SIZE);
        registry.create("r").unwrap();
        assert_eq!(registry.size("r"), 0);
    }

    #[test]
    fn test_delete_is_noop_when_absent() {
        let registry = RoomRegistry::new();
        assert!(registry.delete("r").is_none());
        registry.create("r").unwrap();
        assert!(registry.delete("r").is_some());
        assert!(registry.delete("r").is_none());
    }

    #[test]
    fn test_last_leave_removes_room() {
        let registry = RoomRegistry::new();
        let room = registry.create("r").unwrap();
        let a = join(&room);
        let b = join(&room);

        room.remove_peer(b);
        assert!(!registry.remove_if_empty(&room));
        assert_eq!(registry.size("r"), 1);

        room.remove_peer(a);
        assert!(registry.remove_if_empty(&room));
        assert_eq!(registry.size("r"), MISSING_ROOM_SIZE);
        assert!(!registry.remove_if_empty(&room));
    }

    #[test]
    fn test_fresh_empty_room_is_kept() {
        let registry = RoomRegistry::new();
        let room = registry.create("r").unwrap();
        assert!(!registry.remove_if_empty(&room));
        assert!(registry.get("r").is_some());
    }

    #[test]
    fn test_cleanup_does_not_remove_replacement() {
        let registry = RoomRegistry::new();
        let old = registry.create("r").unwrap();
        let id = join(&old);
        old.remove_peer(id);

        let replacement = registry.create("r").unwrap();
        assert!(!Arc::ptr_eq(&old, &replacement));
        assert!(!registry.remove_if_empty(&old));
        assert!(Arc::ptr_eq(&registry.get("r").unwrap(), &replacement));
    }

    #[test]
    fn test_concurrent_create_same_name() {
        let registry = Arc::new(RoomRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.create("shared").is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn test_concurrent_create_distinct_names() {
        let registry = Arc::new(RoomRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.create(&format!("room-{}", i)).is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(registry.room_count(), 16);
    }

    #[test]
    fn test_peer_count_spans_rooms() {
        let registry = RoomRegistry::new();
        let a = registry.create("a").unwrap();
        let b = registry.create("b").unwrap();
        join(&a);
        join(&a);
        join(&b);
        assert_eq!(registry.peer_count(), 3);
    }
}
