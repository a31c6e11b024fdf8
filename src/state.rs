//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the authoritative object store (constructed in `main` and
//! passed in — no process-wide singleton) and the live peer registry:
//! which connections are members of which room, each with its outbound
//! event channel. The two maps are guarded by separate locks and are
//! never held at the same time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use events::ServerEvent;

use crate::store::RoomStore;

/// Connected peers of one room: connection id → outbound event channel.
pub type RoomPeers = HashMap<Uuid, mpsc::Sender<ServerEvent>>;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    /// The authoritative object store.
    pub store: Arc<RwLock<RoomStore>>,
    /// Live room membership: room id → connected peers.
    pub peers: Arc<RwLock<HashMap<String, RoomPeers>>>,
}

impl AppState {
    /// Wrap an injected store with an empty peer registry.
    #[must_use]
    pub fn new(store: RoomStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            peers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
