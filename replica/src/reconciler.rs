//! Local replica of one room with optimistic edits and throttled emission.
//!
//! DESIGN
//! ======
//! The reconciler applies the user's own edits to the local mirror
//! immediately — the canvas must stay responsive whether or not the
//! socket is up — and decides per call whether a wire event goes out.
//! Emission is suppressed while disconnected and, for continuous drags,
//! while inside the per-object throttle window. The window is a
//! monotonic-clock comparison against the last emission for that object
//! id; no timer runs in the background. Peer events merge into the
//! mirror and never produce emissions of their own.

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod reconciler_test;

use std::collections::HashMap;
use std::time::Instant;

use events::{ClientEvent, Position, RoomObject, ServerEvent};

use crate::consts::EMIT_INTERVAL;

/// Connection state of the underlying transport, as reported by the host.
/// Only `Connected` allows emission; `Connecting` exists for reconnect
/// loops that want to surface the distinction in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    #[default]
    Disconnected,
}

/// The client's mirror of one room's objects, plus peer cursors and the
/// per-object throttle bookkeeping.
#[derive(Debug, Default)]
pub struct Reconciler {
    objects: HashMap<String, RoomObject>,
    cursors: HashMap<String, Position>,
    last_emit: HashMap<String, Instant>,
    status: ConnectionStatus,
}

impl Reconciler {
    /// Create an empty, disconnected replica.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Connectivity ---

    /// Record a transport status change. Never touches local state; a
    /// disconnect only stops future emission.
    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    // --- Local (optimistic) mutations ---

    /// Append a locally created object. Creation is a discrete event, so
    /// the emission is never throttled — only connectivity gates it.
    pub fn create_local(&mut self, object: RoomObject) -> Option<ClientEvent> {
        self.objects.insert(object.id.clone(), object.clone());
        self.is_connected().then_some(ClientEvent::CreateObject(object))
    }

    /// Move an object locally; emit only if the per-object throttle window
    /// has elapsed. Returns `None` for an unknown id.
    pub fn update_local_throttled(&mut self, object_id: &str, position: Position) -> Option<ClientEvent> {
        self.update_local_throttled_at(object_id, position, Instant::now())
    }

    /// Move an object locally and emit unconditionally, resetting the
    /// throttle window — used once per drag gesture, at gesture end, so
    /// the final position is never lost to the throttle.
    pub fn update_local_forced(&mut self, object_id: &str, position: Position) -> Option<ClientEvent> {
        self.update_local_forced_at(object_id, position, Instant::now())
    }

    /// Remove an object locally. Returns `None` for an unknown id.
    pub fn delete_local(&mut self, object_id: &str) -> Option<ClientEvent> {
        self.objects.remove(object_id)?;
        self.last_emit.remove(object_id);
        self.is_connected()
            .then(|| ClientEvent::DeleteObject { object_id: object_id.to_owned() })
    }

    fn update_local_throttled_at(
        &mut self,
        object_id: &str,
        position: Position,
        now: Instant,
    ) -> Option<ClientEvent> {
        self.apply_position(object_id, position)?;
        if !self.is_connected() {
            return None;
        }

        // Non-emitting calls leave the window anchored at the last actual
        // emission, not at the last attempt.
        let open = self
            .last_emit
            .get(object_id)
            .is_none_or(|last| now.duration_since(*last) >= EMIT_INTERVAL);
        if !open {
            return None;
        }

        self.last_emit.insert(object_id.to_owned(), now);
        Some(ClientEvent::UpdateObject { object_id: object_id.to_owned(), position })
    }

    fn update_local_forced_at(
        &mut self,
        object_id: &str,
        position: Position,
        now: Instant,
    ) -> Option<ClientEvent> {
        self.apply_position(object_id, position)?;
        if !self.is_connected() {
            return None;
        }

        self.last_emit.insert(object_id.to_owned(), now);
        Some(ClientEvent::UpdateObject { object_id: object_id.to_owned(), position })
    }

    fn apply_position(&mut self, object_id: &str, position: Position) -> Option<()> {
        let object = self.objects.get_mut(object_id)?;
        object.x = position.x;
        object.y = position.y;
        Some(())
    }

    // --- Inbound reconciliation ---

    /// Replace the mirror wholesale. Used for the `room_state` checkpoint
    /// and for installing undo/redo snapshots.
    pub fn load_snapshot(&mut self, objects: Vec<RoomObject>) {
        self.objects.clear();
        for object in objects {
            self.objects.insert(object.id.clone(), object);
        }
    }

    /// Merge a server event into the mirror. Peer edits overwrite local
    /// state; an update for an id we do not hold is dropped.
    pub fn apply_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::RoomState(objects) => self.load_snapshot(objects),
            ServerEvent::ObjectCreated(object) => {
                self.objects.insert(object.id.clone(), object);
            }
            ServerEvent::ObjectUpdated { object_id, position } => {
                if let Some(object) = self.objects.get_mut(&object_id) {
                    object.x = position.x;
                    object.y = position.y;
                }
            }
            ServerEvent::ObjectDeleted { object_id } => {
                self.objects.remove(&object_id);
                self.last_emit.remove(&object_id);
            }
            ServerEvent::CursorMoved { client_id, x, y } => {
                self.cursors.insert(client_id, Position { x, y });
            }
            ServerEvent::PeerLeft { client_id } => {
                self.cursors.remove(&client_id);
            }
        }
    }

    // --- Queries ---

    /// Look up an object by id.
    #[must_use]
    pub fn get(&self, object_id: &str) -> Option<&RoomObject> {
        self.objects.get(object_id)
    }

    /// Snapshot of the mirror, sorted by id for a stable order.
    #[must_use]
    pub fn objects(&self) -> Vec<RoomObject> {
        let mut objects: Vec<RoomObject> = self.objects.values().cloned().collect();
        objects.sort_by(|a, b| a.id.cmp(&b.id));
        objects
    }

    /// Last known peer cursor positions, keyed by connection id.
    #[must_use]
    pub fn cursors(&self) -> &HashMap<String, Position> {
        &self.cursors
    }

    /// Number of objects in the mirror.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the mirror holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
