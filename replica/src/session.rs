//! Canvas session — the seam a rendering host drives.
//!
//! Ties the local replica to the undo history and decides which edits are
//! committed moments. The host feeds pointer lifecycle callbacks in
//! (create, drag move, drag end, delete, undo/redo) and puts the returned
//! events on the wire; inbound socket events come back through
//! [`CanvasSession::apply_server`]. Only the user's own committed edits
//! grow the undo stack — a drag in progress, a peer's change, and the
//! initial snapshot never do.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use events::{ClientEvent, Position, RoomObject, ServerEvent};

use crate::history::HistoryManager;
use crate::reconciler::{ConnectionStatus, Reconciler};

/// One client's view of one room: replica, history, and join state.
#[derive(Debug, Default)]
pub struct CanvasSession {
    reconciler: Reconciler,
    history: HistoryManager,
    room_id: Option<String>,
}

impl CanvasSession {
    /// Create an empty, unjoined session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Room lifecycle ---

    /// Switch to a room. History is cleared — the new room's edits are a
    /// fresh sequence. Returns the `join_room` event to send.
    pub fn join_room(&mut self, room_id: impl Into<String>) -> ClientEvent {
        let room_id = room_id.into();
        self.history.reset();
        self.room_id = Some(room_id.clone());
        ClientEvent::JoinRoom { room_id }
    }

    /// The joined room, if any.
    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    // --- Local committed edits ---

    /// Create an object: optimistic local apply, history commit, and the
    /// wire event when connected.
    pub fn create_object(&mut self, object: RoomObject) -> Option<ClientEvent> {
        let event = self.reconciler.create_local(object);
        self.commit();
        event
    }

    /// Delete an object. A miss is a no-op that commits nothing.
    pub fn delete_object(&mut self, object_id: &str) -> Option<ClientEvent> {
        if self.reconciler.get(object_id).is_none() {
            return None;
        }
        let event = self.reconciler.delete_local(object_id);
        self.commit();
        event
    }

    // --- Drag gesture ---

    /// Mid-drag move: local apply plus throttled emission. Not a committed
    /// edit — undo never lands inside a gesture.
    pub fn drag_to(&mut self, object_id: &str, position: Position) -> Option<ClientEvent> {
        self.reconciler.update_local_throttled(object_id, position)
    }

    /// Drag release: forced emission (the authoritative final position
    /// must never be dropped by the throttle) and the gesture's single
    /// history commit.
    pub fn end_drag(&mut self, object_id: &str, position: Position) -> Option<ClientEvent> {
        if self.reconciler.get(object_id).is_none() {
            return None;
        }
        let event = self.reconciler.update_local_forced(object_id, position);
        self.commit();
        event
    }

    // --- Undo / redo ---

    /// Step back one committed edit, installing the snapshot into the
    /// replica. Local-only: nothing is emitted.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.reconciler.load_snapshot(snapshot);
        true
    }

    /// Mirror of [`Self::undo`].
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.reconciler.load_snapshot(snapshot);
        true
    }

    // --- Inbound ---

    /// Merge a server event. Peer-originated changes must not pollute the
    /// local undo stack, so the history only has its current state
    /// replaced — the next commit snapshots peer edits without making
    /// them undoable.
    pub fn apply_server(&mut self, event: ServerEvent) {
        self.reconciler.apply_server_event(event);
        self.history.replace_without_history(self.reconciler.objects());
    }

    // --- Connectivity ---

    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.reconciler.set_status(status);
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.reconciler.status()
    }

    // --- Queries ---

    /// Snapshot of the local mirror, sorted by id.
    #[must_use]
    pub fn objects(&self) -> Vec<RoomObject> {
        self.reconciler.objects()
    }

    /// Look up an object by id.
    #[must_use]
    pub fn get(&self, object_id: &str) -> Option<&RoomObject> {
        self.reconciler.get(object_id)
    }

    /// Last known peer cursors.
    #[must_use]
    pub fn cursors(&self) -> &std::collections::HashMap<String, Position> {
        self.reconciler.cursors()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn commit(&mut self) {
        self.history.commit(self.reconciler.objects());
    }
}
