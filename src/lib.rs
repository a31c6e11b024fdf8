//! Realtime room synchronization server.
//!
//! Clients connect over one WebSocket each, join a room, and exchange
//! object mutations. The server owns the authoritative per-room object
//! store and rebroadcasts every applied mutation to the sender's room
//! peers. The protocol is fire-and-forget: there is no ack channel, and
//! eventual convergence rides on the next successful update.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | Authoritative per-room object store |
//! | [`state`] | Shared [`state::AppState`]: injected store + live peer registry |
//! | [`routes`] | Router assembly and the WebSocket relay |
//! | [`services`] | Room membership, broadcast, and object mutations |

pub mod routes;
pub mod services;
pub mod state;
pub mod store;
