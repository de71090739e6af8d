//! Thematic layers: descriptors, the built-in catalog and the registry.
//!
//! A [`LayerDescriptor`] is static configuration validated at construction.
//! The [`LayerRegistry`] owns one [`LayerRuntimeState`] per layer and is the
//! only component that creates sources and layers or changes visibility on
//! the engine.

mod catalog;
mod descriptor;
mod expr;
mod registry;

pub use catalog::{Category, CategoryItem, LayerCatalog};
pub use descriptor::{
    CirclePaint, DescriptorError, FillPaint, HeatmapPaint, IconRef, LayerDescriptor, PaintRules,
    ZoomRange, MAX_ZOOM_LEVEL,
};
pub use expr::{ColorRamp, NumericExpr, Rgba};
pub use registry::{LayerRegistry, LayerRuntimeState, RegistryError};
