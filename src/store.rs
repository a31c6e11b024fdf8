//! Authoritative per-room object store.
//!
//! DESIGN
//! ======
//! `RoomStore` owns the mapping `room id → objects` for every live room.
//! It is a plain synchronous structure constructed once in `main` and
//! injected into `AppState` behind a `tokio::sync::RwLock`; each relay
//! mutation runs to completion under the write lock, so calls never
//! interleave and the store itself needs no locking.
//!
//! Missing-entity semantics: `update_position` and `remove` on an unknown
//! room or object return `false` with no side effect. Reads never create
//! rooms; only `get_or_create` and `add` do. Rooms are never evicted here —
//! `destroy` exists for an external lifecycle policy to call.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;

use events::{Position, RoomObject};

/// A single synchronization scope: objects keyed by object id.
#[derive(Debug, Default)]
pub struct Room {
    objects: HashMap<String, RoomObject>,
}

impl Room {
    /// Create an empty room.
    #[must_use]
    pub fn new() -> Self {
        Self { objects: HashMap::new() }
    }

    /// Insert or replace an object. An existing object with the same `id`
    /// is overwritten.
    pub fn insert(&mut self, object: RoomObject) {
        self.objects.insert(object.id.clone(), object);
    }

    /// Return a reference to an object by id.
    #[must_use]
    pub fn get(&self, object_id: &str) -> Option<&RoomObject> {
        self.objects.get(object_id)
    }

    /// Number of objects currently in the room.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the room contains no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// The authoritative room map. One instance per server process.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<String, Room>,
}

impl RoomStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { rooms: HashMap::new() }
    }

    /// Return the room, creating an empty one if absent. Idempotent.
    pub fn get_or_create(&mut self, room_id: &str) -> &mut Room {
        self.rooms.entry(room_id.to_owned()).or_default()
    }

    /// Insert or overwrite an object by id. Creates the room if absent.
    pub fn add(&mut self, room_id: &str, object: RoomObject) {
        self.get_or_create(room_id).insert(object);
    }

    /// Move an object in place. Returns `false` without side effect when
    /// the room or object is missing.
    pub fn update_position(&mut self, room_id: &str, object_id: &str, position: Position) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        let Some(object) = room.objects.get_mut(object_id) else {
            return false;
        };
        object.x = position.x;
        object.y = position.y;
        true
    }

    /// Remove an object. Same missing-entity semantics as `update_position`.
    pub fn remove(&mut self, room_id: &str, object_id: &str) -> bool {
        self.rooms
            .get_mut(room_id)
            .is_some_and(|room| room.objects.remove(object_id).is_some())
    }

    /// Snapshot copy of a room's objects. Iteration order carries no
    /// meaning. Returns an empty list for an unknown room — a read must
    /// never create one.
    #[must_use]
    pub fn list(&self, room_id: &str) -> Vec<RoomObject> {
        self.rooms
            .get(room_id)
            .map(|room| room.objects.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a room currently exists.
    #[must_use]
    pub fn exists(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Evict a room and everything in it. Returns `false` if it did not
    /// exist. Called only by an external lifecycle policy.
    pub fn destroy(&mut self, room_id: &str) -> bool {
        self.rooms.remove(room_id).is_some()
    }
}
