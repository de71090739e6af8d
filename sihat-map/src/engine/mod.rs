//! Map engine boundary.
//!
//! The layer registry and the interaction binder are written against the
//! [`MapEngine`] capability set. Any renderer offering it is substitutable;
//! [`HeadlessEngine`] is the in-memory implementation used by the CLI and
//! the test suite.
//!
//! The engine is a single shared mutable resource. It is passed explicitly
//! as an [`EngineHandle`] and locked only for the duration of a synchronous
//! call, never across an await.

mod headless;
mod traits;
mod types;

pub use headless::{EngineCounters, HeadlessEngine, DEFAULT_HIT_TOLERANCE};
pub use traits::{EngineHandle, MapEngine};
pub use types::{
    EaseOptions, EngineError, FitOptions, FitRecord, HandlerId, LayerEventHandler, LayerSpec,
    PointerEvent, PointerEventKind, PopupCommand, PopupKind, PopupSpec, RenderMode,
    RenderedFeature, Visibility,
};
