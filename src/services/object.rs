//! Object service — create/move/delete mutations against the room store.
//!
//! Each function takes the store's write lock, applies the mutation to
//! completion, and releases it before any broadcast happens — the relay
//! never holds the lock while touching peer channels.

use events::{Position, RoomObject};

use crate::state::AppState;

/// Insert or overwrite an object. Creates the room if absent; always
/// succeeds.
pub async fn create_object(state: &AppState, room_id: &str, object: RoomObject) {
    state.store.write().await.add(room_id, object);
}

/// Move an object. Returns `false` for an unknown room or object — the
/// caller must not forward anything downstream in that case.
pub async fn update_object(
    state: &AppState,
    room_id: &str,
    object_id: &str,
    position: Position,
) -> bool {
    state.store.write().await.update_position(room_id, object_id, position)
}

/// Delete an object. Same missing-entity semantics as `update_object`.
pub async fn delete_object(state: &AppState, room_id: &str, object_id: &str) -> bool {
    state.store.write().await.remove(room_id, object_id)
}
