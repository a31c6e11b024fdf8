//! Client-side sync core for the collaborative canvas.
//!
//! This crate owns the client's local replica of one room: optimistic
//! application of the user's own edits, throttled outbound emission,
//! merging of peer updates, and the snapshot-based undo history. It
//! performs no I/O — mutators return the wire event the host should send
//! (or `None` when throttling or connectivity suppresses it), which is
//! what keeps every timing and gating decision unit-testable. The host
//! layer (a rendering shell or the headless `cli`) wires pointer
//! lifecycle callbacks in and puts the returned events on the socket.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Top-level [`session::CanvasSession`] composing replica + history |
//! | [`reconciler`] | Local object mirror, throttle, and peer-update merge |
//! | [`history`] | Bounded snapshot-based undo/redo stacks |
//! | [`consts`] | Shared constants (throttle interval, history capacity) |

pub mod consts;
pub mod history;
pub mod reconciler;
pub mod session;

pub use history::HistoryManager;
pub use reconciler::{ConnectionStatus, Reconciler};
pub use session::CanvasSession;
