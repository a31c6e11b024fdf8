//! Shared constants for the client sync core.

use std::time::Duration;

// ── Outbound throttling ─────────────────────────────────────────

/// Minimum interval between position emissions for one object. Caps a
/// continuous drag at roughly 60 updates/second per moving object while
/// leaving on-screen motion unthrottled.
pub const EMIT_INTERVAL: Duration = Duration::from_millis(16);

// ── History ─────────────────────────────────────────────────────

/// Maximum retained snapshots per undo/redo stack; the oldest entry is
/// evicted on overflow.
pub const HISTORY_CAPACITY: usize = 20;
