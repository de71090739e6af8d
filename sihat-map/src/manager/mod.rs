//! The layer manager: lifecycle and the UI-facing operations.
//!
//! ```text
//!  Uninitialized ──begin_style_load──► Loading ──on_style_loaded──► Ready
//!                                                                   │  ▲
//!                                                   on_style_reload │  │
//!                                                                   ▼  │
//!                                                               Reloading
//!  Ready ──dispose──► Disposed
//! ```
//!
//! The manager wires the registry, the binder, the dataset fetcher and the
//! icon loader around one engine handle. Locks are always taken in the order
//! registry, binder, engine, and released before any await.

mod options;
mod service;
mod state;

pub use options::ManagerOptions;
pub use service::{LayerManager, LoadReport};
pub use state::ManagerState;
