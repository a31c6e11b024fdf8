//! Room service — join/leave membership and peer broadcast.
//!
//! DESIGN
//! ======
//! Membership is transport state, kept apart from the object store: a
//! room's objects outlive every connection that touched them. Joining
//! registers the connection's outbound channel and returns the object
//! snapshot for the `room_state` reply; leaving only drops the channel.
//! Broadcast is best-effort — a slow client with a full channel misses
//! the event rather than stalling the room.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use events::{RoomObject, ServerEvent};

use crate::state::AppState;

/// Join a room: create it if absent, register the client's outbound
/// channel, and return the current object snapshot.
pub async fn join_room(
    state: &AppState,
    room_id: &str,
    client_id: Uuid,
    tx: mpsc::Sender<ServerEvent>,
) -> Vec<RoomObject> {
    let objects = {
        let mut store = state.store.write().await;
        store.get_or_create(room_id);
        store.list(room_id)
    };

    let mut peers = state.peers.write().await;
    let room_peers = peers.entry(room_id.to_owned()).or_default();
    room_peers.insert(client_id, tx);
    info!(%room_id, %client_id, peers = room_peers.len(), "client joined room");

    objects
}

/// Leave a room: drop the client's peer registration. Objects are left
/// untouched — they outlive their creator's connection.
pub async fn leave_room(state: &AppState, room_id: &str, client_id: Uuid) {
    let mut peers = state.peers.write().await;
    let Some(room_peers) = peers.get_mut(room_id) else {
        return;
    };

    room_peers.remove(&client_id);
    info!(%room_id, %client_id, remaining = room_peers.len(), "client left room");

    if room_peers.is_empty() {
        peers.remove(room_id);
    }
}

/// Broadcast an event to every member of a room, optionally excluding one
/// connection (echo suppression for the originator).
pub async fn broadcast(state: &AppState, room_id: &str, event: &ServerEvent, exclude: Option<Uuid>) {
    let peers = state.peers.read().await;
    let Some(room_peers) = peers.get(room_id) else {
        return;
    };

    for (client_id, tx) in room_peers {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: if a client's channel is full, skip it.
        let _ = tx.try_send(event.clone());
    }
}
