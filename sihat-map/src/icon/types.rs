//! Decoded icon bitmaps and icon errors.

use crate::engine::EngineError;
use thiserror::Error;

/// Errors from loading an icon.
///
/// Every variant means "skip this icon": the symbol layer still registers,
/// it just draws no marker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IconError {
    /// Asset fetch failed
    #[error("failed to fetch icon {url}: {message}")]
    Fetch { url: String, message: String },

    /// The decoder cannot handle this format
    #[error("unsupported image format: {0}")]
    Unsupported(String),

    /// The bytes could not be decoded
    #[error("failed to decode icon: {0}")]
    Decode(String),

    /// The engine refused the image
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A straight-alpha RGBA bitmap ready for upload to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Dimensions are non-zero and the buffer length matches them.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == self.width as usize * self.height as usize * 4
    }

    /// Largest side in pixels.
    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }

    /// RGBA of the pixel at `(x, y)`, if in range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.rgba.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Dimensions after fitting `(width, height)` within `max_dimension`,
/// preserving aspect ratio. Images already small enough are unchanged.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let largest = width.max(height);
    if max_dimension == 0 || largest <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / largest as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_dimensions_preserves_aspect() {
        assert_eq!(scaled_dimensions(512, 256, 64), (64, 32));
        assert_eq!(scaled_dimensions(256, 512, 64), (32, 64));
    }

    #[test]
    fn test_small_images_unchanged() {
        assert_eq!(scaled_dimensions(48, 48, 64), (48, 48));
        assert_eq!(scaled_dimensions(48, 48, 0), (48, 48));
    }

    #[test]
    fn test_extreme_aspect_keeps_one_pixel() {
        assert_eq!(scaled_dimensions(1000, 1, 10), (10, 1));
    }

    #[test]
    fn test_pixel_access() {
        let image = DecodedImage::new(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(image.is_valid());
        assert_eq!(image.pixel(1, 0), Some([5, 6, 7, 8]));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn test_buffer_length_mismatch_is_invalid() {
        assert!(!DecodedImage::new(2, 2, vec![0; 4]).is_valid());
        assert!(!DecodedImage::new(0, 0, vec![]).is_valid());
    }
}
