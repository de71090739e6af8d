//! Lifecycle state of a layer manager.

use std::fmt;

/// Where a manager is in its engine's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManagerState {
    /// Constructed, style not requested yet
    #[default]
    Uninitialized,
    /// Style is loading; layers cannot be registered
    Loading,
    /// Icons loaded, layers ensured, interactions bound
    Ready,
    /// Style changed; re-ensuring and re-binding
    Reloading,
    /// Engine handle released
    Disposed,
}

impl ManagerState {
    /// Whether layer operations may touch the engine.
    pub fn accepts_layer_operations(self) -> bool {
        matches!(self, Self::Ready | Self::Reloading)
    }
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Reloading => "reloading",
            Self::Disposed => "disposed",
        })
    }
}
