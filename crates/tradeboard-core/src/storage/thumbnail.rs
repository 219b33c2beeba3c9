//! Thumbnail capture from a rendered surface.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{RgbImage, RgbaImage};

/// JPEG quality used for thumbnails.
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 70;

/// A rendered RGBA8 image (straight alpha, row-major, no padding).
pub trait RenderSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn rgba(&self) -> &[u8];
}

/// Output size for a surface scaled uniformly by `min(max_w / w, max_h / h)`.
///
/// `None` for a zero-area surface or box.
pub fn thumbnail_size(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
) -> Option<(u32, u32, f64)> {
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return None;
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_width);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_height);
    Some((w, h, scale))
}

/// Capture a JPEG thumbnail as a `data:` URL at the default quality.
///
/// Returns an empty string when the surface cannot be captured.
pub fn capture_thumbnail(surface: &dyn RenderSurface, max_width: u32, max_height: u32) -> String {
    capture_thumbnail_with_quality(surface, max_width, max_height, DEFAULT_THUMBNAIL_QUALITY)
}

/// Capture a JPEG thumbnail as a `data:` URL.
pub fn capture_thumbnail_with_quality(
    surface: &dyn RenderSurface,
    max_width: u32,
    max_height: u32,
    quality: u8,
) -> String {
    let (width, height) = (surface.width(), surface.height());
    let Some((thumb_width, thumb_height, _)) =
        thumbnail_size(width, height, max_width, max_height)
    else {
        log::debug!("Skipping thumbnail of zero-area surface {}x{}", width, height);
        return String::new();
    };
    let Some(image) = RgbaImage::from_raw(width, height, surface.rgba().to_vec()) else {
        log::warn!("Render surface buffer does not match {}x{}", width, height);
        return String::new();
    };

    let resized = imageops::resize(&image, thumb_width, thumb_height, FilterType::Triangle);

    // JPEG has no alpha: composite onto white
    let mut opaque = RgbImage::new(thumb_width, thumb_height);
    for (src, dst) in resized.pixels().zip(opaque.pixels_mut()) {
        let alpha = src[3] as u32;
        for c in 0..3 {
            dst[c] = ((src[c] as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        }
    }

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    if let Err(e) = encoder.encode_image(&opaque) {
        log::warn!("Failed to encode thumbnail: {}", e);
        return String::new();
    }
    format!("data:image/jpeg;base64,{}", STANDARD.encode(&bytes))
}
