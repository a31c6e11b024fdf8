//! WebSocket handler — the per-connection room relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client id and enters a `select!` loop:
//! - Incoming client events → decode + dispatch by event
//! - Broadcast events from room peers → forward to the client
//!
//! Handler functions are pure business logic — they validate, mutate the
//! store, and return an `Outcome`. The dispatch layer owns all outbound
//! concerns: reply to sender and broadcast to peers.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → connection starts unjoined
//! 2. `join_room` → register peer channel, reply `room_state` to sender only
//! 3. Mutations → store apply → broadcast to room minus sender
//! 4. Close → broadcast `peer_left` → drop peer registration
//!
//! A connection that never joins cannot mutate any room: such requests are
//! dropped with a warn line, never errored back — the protocol has no NACK
//! channel, and an unjoined mutation indicates a client sequencing bug.

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use events::{ClientEvent, Position, RoomObject, ServerEvent};

use crate::services;
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what — handlers never send events directly.
enum Outcome {
    /// Send to the requesting client only. Used for the join checkpoint.
    Reply(ServerEvent),
    /// Send to every other member of the room. The sender already applied
    /// the change optimistically, so echoing it back would at best be
    /// redundant and at worst race its next local edit.
    Broadcast(ServerEvent),
    /// Nothing to deliver: failed precondition or missing-entity no-op.
    Silent,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast events from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(256);

    info!(%client_id, "ws: client connected");

    // Which room this connection has joined, if any.
    let mut current_room: Option<String> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies =
                            process_inbound_text(&state, &mut current_room, client_id, &client_tx, &text).await;
                        for event in replies {
                            let _ = send_event(&mut socket, &event).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    // Presence only: peers drop this connection's cursor. Objects and the
    // room itself are never cleaned up on disconnect.
    if let Some(room_id) = current_room {
        let parted = ServerEvent::PeerLeft { client_id: client_id.to_string() };
        services::room::broadcast(&state, &room_id, &parted, Some(client_id)).await;
        services::room::leave_room(&state, &room_id, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

/// Decode and process one inbound text frame, returning events for the
/// sender. Kept free of socket I/O so tests can exercise the relay at the
/// channel level.
async fn process_inbound_text(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    text: &str,
) -> Vec<ServerEvent> {
    let event = match events::decode_client_event(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound event, dropping");
            return Vec::new();
        }
    };

    if !matches!(event, ClientEvent::CursorMoved { .. }) {
        info!(%client_id, event = event.name(), "ws: recv event");
    }

    let outcome = match event {
        ClientEvent::JoinRoom { room_id } => {
            handle_join(state, current_room, client_id, client_tx, room_id).await
        }
        ClientEvent::CreateObject(object) => {
            handle_create(state, current_room.as_deref(), client_id, object).await
        }
        ClientEvent::UpdateObject { object_id, position } => {
            handle_update(state, current_room.as_deref(), client_id, &object_id, position).await
        }
        ClientEvent::DeleteObject { object_id } => {
            handle_delete(state, current_room.as_deref(), client_id, &object_id).await
        }
        ClientEvent::CursorMoved { x, y } => handle_cursor(current_room.as_deref(), client_id, x, y),
    };

    match outcome {
        Outcome::Reply(event) => vec![event],
        Outcome::Broadcast(event) => {
            if let Some(room_id) = current_room.as_deref() {
                services::room::broadcast(state, room_id, &event, Some(client_id)).await;
            }
            Vec::new()
        }
        Outcome::Silent => Vec::new(),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_join(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    room_id: String,
) -> Outcome {
    // A repeat join switches rooms: drop the old registration first.
    if let Some(old_room) = current_room.take() {
        services::room::leave_room(state, &old_room, client_id).await;
    }

    let objects = services::room::join_room(state, &room_id, client_id, client_tx.clone()).await;
    *current_room = Some(room_id);

    // The synchronization checkpoint: a late joiner catches up in one
    // round trip, and nobody else hears about it.
    Outcome::Reply(ServerEvent::RoomState(objects))
}

async fn handle_create(
    state: &AppState,
    current_room: Option<&str>,
    client_id: Uuid,
    object: RoomObject,
) -> Outcome {
    let Some(room_id) = current_room else {
        warn!(%client_id, "ws: create_object before join_room, dropping");
        return Outcome::Silent;
    };

    services::object::create_object(state, room_id, object.clone()).await;
    Outcome::Broadcast(ServerEvent::ObjectCreated(object))
}

async fn handle_update(
    state: &AppState,
    current_room: Option<&str>,
    client_id: Uuid,
    object_id: &str,
    position: Position,
) -> Outcome {
    let Some(room_id) = current_room else {
        warn!(%client_id, "ws: update_object before join_room, dropping");
        return Outcome::Silent;
    };

    if services::object::update_object(state, room_id, object_id, position).await {
        Outcome::Broadcast(ServerEvent::ObjectUpdated { object_id: object_id.to_owned(), position })
    } else {
        // Unknown object: nothing valid to reconcile downstream.
        Outcome::Silent
    }
}

async fn handle_delete(
    state: &AppState,
    current_room: Option<&str>,
    client_id: Uuid,
    object_id: &str,
) -> Outcome {
    let Some(room_id) = current_room else {
        warn!(%client_id, "ws: delete_object before join_room, dropping");
        return Outcome::Silent;
    };

    if services::object::delete_object(state, room_id, object_id).await {
        Outcome::Broadcast(ServerEvent::ObjectDeleted { object_id: object_id.to_owned() })
    } else {
        Outcome::Silent
    }
}

fn handle_cursor(current_room: Option<&str>, client_id: Uuid, x: f64, y: f64) -> Outcome {
    if current_room.is_none() {
        // Silently ignore cursor moves before joining.
        return Outcome::Silent;
    }

    Outcome::Broadcast(ServerEvent::CursorMoved { client_id: client_id.to_string(), x, y })
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = events::encode_event(event);
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}
