//! Icon/sprite loading.
//!
//! Raster icons are fetched once per name per engine lifetime, decoded to
//! straight-alpha RGBA and downsampled when larger than the requested
//! maximum. Two decode paths exist:
//!
//! - [`FastBitmapDecoder`] uses the `image` crate and resizes while decoding.
//! - [`CanvasBitmapDecoder`] decodes PNG into a `tiny-skia` pixmap, draws it
//!   scaled onto an offscreen pixmap and reads the pixels back.
//!
//! The loader tries the fast path first and falls back to the canvas path
//! when the fast path reports the format as unsupported.

mod decode;
mod loader;
mod types;

pub use decode::{BitmapDecoder, CanvasBitmapDecoder, FastBitmapDecoder};
pub use loader::IconLoader;
pub use types::{scaled_dimensions, DecodedImage, IconError};

#[cfg(test)]
pub(crate) use decode::tests::solid_png;
