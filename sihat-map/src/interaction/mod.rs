//! Hover and click popups.
//!
//! Each layer gets two independent bindings: a hover popup with the summary
//! field set (fine pointers only) and a pinned click popup with the full
//! field set. Popup HTML is built from feature properties by a per-layer
//! [`PopupTemplate`]; every dataset-sourced string is HTML-escaped.

mod binder;
pub mod format;
mod popup;

pub use binder::{BindError, InteractionBinder, PointerKind};
pub use popup::{ContentBuilder, FieldFormat, FieldSource, PopupDetail, PopupField, PopupTemplate};
