//! Shared event model and JSON codec for the realtime room protocol.
//!
//! This crate owns the wire representation used by both `roomsync` (server)
//! and `replica` (client core). Events travel as JSON text frames shaped
//! `{"event": <name>, "data": <payload>}` over one WebSocket per client.
//! Object payloads keep their core fields typed while passing unknown keys
//! through untouched, so rendering-specific shapes never leak into the sync
//! core.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned by [`decode_client_event`] and [`decode_server_event`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text frame could not be decoded as a protocol event.
    #[error("failed to decode event frame: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A positioned canvas object — the unit of synchronization.
///
/// `id` is assigned by the creating client and is unique within a room.
/// `kind` is an open tag (serialized as `type`); the sync core never
/// interprets it and must not reject unknown values. Any additional fields
/// ride along in `extra` and round-trip byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomObject {
    /// Client-assigned identifier, unique within a room.
    pub id: String,
    /// Open rendering-kind tag. Opaque to the sync core.
    #[serde(rename = "type")]
    pub kind: String,
    /// Horizontal position in world coordinates.
    pub x: f64,
    /// Vertical position in world coordinates.
    pub y: f64,
    /// Rendering-specific fields the core passes through uninterpreted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoomObject {
    /// Create an object with the core fields and no extra payload.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: id.into(), kind: kind.into(), x, y, extra: Map::new() }
    }
}

/// A position delta for a move update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Events sent client → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join (or switch to) a room. The server replies `room_state` to the
    /// sender only.
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String },
    /// Create an object. The payload is the object itself.
    CreateObject(RoomObject),
    /// Move an object. Broadcast to peers only if the object exists.
    #[serde(rename_all = "camelCase")]
    UpdateObject { object_id: String, position: Position },
    /// Delete an object. Broadcast to peers only if the object existed.
    #[serde(rename_all = "camelCase")]
    DeleteObject { object_id: String },
    /// Ephemeral cursor position. Relayed to peers, never stored.
    CursorMoved { x: f64, y: f64 },
}

impl ClientEvent {
    /// Wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join_room",
            Self::CreateObject(_) => "create_object",
            Self::UpdateObject { .. } => "update_object",
            Self::DeleteObject { .. } => "delete_object",
            Self::CursorMoved { .. } => "cursor_moved",
        }
    }
}

/// Events sent server → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full snapshot of a room, sent once per join to the joiner only.
    RoomState(Vec<RoomObject>),
    /// A peer created an object.
    ObjectCreated(RoomObject),
    /// A peer moved an object.
    #[serde(rename_all = "camelCase")]
    ObjectUpdated { object_id: String, position: Position },
    /// A peer deleted an object.
    #[serde(rename_all = "camelCase")]
    ObjectDeleted { object_id: String },
    /// A peer's cursor moved.
    #[serde(rename_all = "camelCase")]
    CursorMoved { client_id: String, x: f64, y: f64 },
    /// A peer's connection closed; clients drop its cursor.
    #[serde(rename_all = "camelCase")]
    PeerLeft { client_id: String },
}

impl ServerEvent {
    /// Wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomState(_) => "room_state",
            Self::ObjectCreated(_) => "object_created",
            Self::ObjectUpdated { .. } => "object_updated",
            Self::ObjectDeleted { .. } => "object_deleted",
            Self::CursorMoved { .. } => "cursor_moved",
            Self::PeerLeft { .. } => "peer_left",
        }
    }
}

/// Encode an event into a JSON text frame.
#[must_use]
pub fn encode_event<E: Serialize>(event: &E) -> String {
    // Serializing these enums into a String is infallible; the only failure
    // serde_json can report here is a non-string map key, which the types
    // rule out.
    serde_json::to_string(event).unwrap_or_default()
}

/// Decode a client → server text frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed JSON or unknown event names.
pub fn decode_client_event(text: &str) -> Result<ClientEvent, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a server → client text frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed JSON or unknown event names.
pub fn decode_server_event(text: &str) -> Result<ServerEvent, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
