//! Bitmap decoders.

use super::types::{scaled_dimensions, DecodedImage, IconError};
use image::imageops::FilterType;
use image::ImageError;
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

/// Decodes raw image bytes into an RGBA bitmap no larger than `max_dimension`.
pub trait BitmapDecoder: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    fn decode(&self, bytes: &[u8], max_dimension: u32) -> Result<DecodedImage, IconError>;
}

/// Decoder backed by the `image` crate. Sniffs the format from the bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FastBitmapDecoder;

impl BitmapDecoder for FastBitmapDecoder {
    fn name(&self) -> &'static str {
        "image"
    }

    fn decode(&self, bytes: &[u8], max_dimension: u32) -> Result<DecodedImage, IconError> {
        let img = image::load_from_memory(bytes).map_err(|e| match e {
            ImageError::Unsupported(u) => IconError::Unsupported(u.to_string()),
            other => IconError::Decode(other.to_string()),
        })?;

        let (w, h) = scaled_dimensions(img.width(), img.height(), max_dimension);
        let img = if (w, h) != (img.width(), img.height()) {
            img.resize(w, h, FilterType::Triangle)
        } else {
            img
        };

        let rgba = img.to_rgba8();
        Ok(DecodedImage::new(rgba.width(), rgba.height(), rgba.into_raw()))
    }
}

/// Decoder that draws into an offscreen `tiny-skia` canvas. PNG only.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanvasBitmapDecoder;

impl BitmapDecoder for CanvasBitmapDecoder {
    fn name(&self) -> &'static str {
        "canvas"
    }

    fn decode(&self, bytes: &[u8], max_dimension: u32) -> Result<DecodedImage, IconError> {
        let source = Pixmap::decode_png(bytes).map_err(|e| IconError::Decode(e.to_string()))?;
        let (w, h) = scaled_dimensions(source.width(), source.height(), max_dimension);

        let pixmap = if (w, h) == (source.width(), source.height()) {
            source
        } else {
            let mut canvas = Pixmap::new(w, h)
                .ok_or_else(|| IconError::Decode(format!("cannot allocate {}x{} canvas", w, h)))?;
            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            let transform = Transform::from_scale(
                w as f32 / source.width() as f32,
                h as f32 / source.height() as f32,
            );
            canvas.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
            canvas
        };

        // Pixmaps are premultiplied; the engine expects straight alpha.
        let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
        for pixel in pixmap.pixels() {
            let c = pixel.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(DecodedImage::new(pixmap.width(), pixmap.height(), rgba))
    }
}
