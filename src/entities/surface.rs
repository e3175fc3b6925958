//! Displayable match-frame image and the two ways of producing one.
//!
//! - Disk path: scratch PNG written by the engine, loaded and scaled to the
//!   match panel (`load_scaled`)
//! - Direct path: raw pixels from a bound decode handle, layout-corrected
//!   (`from_engine_pixels`)
//!
//! Surfaces are immutable once built. The cache swaps whole `Arc`s.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::trace;
use std::path::Path;

use super::panel::PanelSize;
use crate::error::{TrimError, TrimResult};

/// Decoded, display-sized match frame (RGBA8, opaque).
#[derive(Debug, Clone)]
pub struct MatchFrameSurface {
    image: RgbaImage,
    ticket: u64,
}

impl MatchFrameSurface {
    pub fn new(image: RgbaImage, ticket: u64) -> Self {
        Self { image, ticket }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> PanelSize {
        PanelSize::new(self.width(), self.height())
    }

    /// Job ticket that produced this surface.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Load the scratch asset and stretch it to exactly `target`.
///
/// Aspect ratio is not preserved: the match panel already has the project's
/// aspect, and the scratch frame is rendered at project size.
pub fn load_scaled(path: &Path, target: PanelSize) -> TrimResult<RgbaImage> {
    let source = image::open(path)?.to_rgba8();
    let width = target.width.max(1);
    let height = target.height.max(1);
    trace!(
        "Scaling match frame {}x{} -> {}x{}",
        source.width(),
        source.height(),
        width,
        height
    );
    if source.width() == width && source.height() == height {
        return Ok(source);
    }
    Ok(imageops::resize(&source, width, height, FilterType::Triangle))
}

/// Convert a decode engine frame to display RGBA.
///
/// The engine hands back frames in its native layout, which differs from
/// RGBA in two ways:
/// 1. Channel order is B, G, R, A (red and blue swapped)
/// 2. The buffer carries one extra row past `height`
///
/// Output is `width * height` RGBA pixels with red/blue swapped back, the
/// trailing row dropped, and alpha forced to 255 (the engine leaves it
/// undefined). Input shorter than `width * height * 4` bytes is rejected;
/// the padding row itself is optional.
///
/// This mirrors one engine's output quirk. If an engine version changes its
/// layout, this is the only function to touch.
pub fn from_engine_pixels(buffer: &[u8], width: u32, height: u32) -> TrimResult<RgbaImage> {
    let row_bytes = width as usize * 4;
    let expected = row_bytes * height as usize;
    if buffer.len() < expected {
        return Err(TrimError::PixelBuffer {
            expected,
            actual: buffer.len(),
        });
    }

    let mut out = Vec::with_capacity(expected);
    for px in buffer[..expected].chunks_exact(4) {
        out.extend_from_slice(&[px[2], px[1], px[0], 255]);
    }

    RgbaImage::from_raw(width, height, out).ok_or(TrimError::PixelBuffer {
        expected,
        actual: buffer.len(),
    })
}

/// Inverse of [`from_engine_pixels`]: pack RGBA into the engine layout
/// (BGRA plus one zeroed padding row). Used by engines that decode to RGBA.
pub fn to_engine_pixels(image: &RgbaImage) -> Vec<u8> {
    let row_bytes = image.width() as usize * 4;
    let mut out = Vec::with_capacity(image.as_raw().len() + row_bytes);
    for px in image.as_raw().chunks_exact(4) {
        out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
    }
    out.resize(out.len() + row_bytes, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_layout_pinned() {
        // 2x1 frame: BGRA pixels + one padding row of 2 pixels
        let buffer = [
            10, 20, 30, 0, // B G R A
            40, 50, 60, 7, //
            99, 99, 99, 99, // padding row
            99, 99, 99, 99,
        ];
        let img = from_engine_pixels(&buffer, 2, 1).unwrap();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.as_raw(), &vec![30, 20, 10, 255, 60, 50, 40, 255]);
    }

    #[test]
    fn test_engine_layout_row_order_kept() {
        // 1x2 frame: rows stay top-to-bottom, padding row is the last one
        let buffer = [1, 2, 3, 4, 5, 6, 7, 8, 0xAA, 0xBB, 0xCC, 0xDD];
        let img = from_engine_pixels(&buffer, 1, 2).unwrap();
        assert_eq!(img.as_raw(), &vec![3, 2, 1, 255, 7, 6, 5, 255]);
    }

    #[test]
    fn test_padding_row_optional() {
        let buffer = [1, 2, 3, 4];
        let img = from_engine_pixels(&buffer, 1, 1).unwrap();
        assert_eq!(img.as_raw(), &vec![3, 2, 1, 255]);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let buffer = [0u8; 7];
        match from_engine_pixels(&buffer, 1, 2) {
            Err(TrimError::PixelBuffer { expected, actual }) => {
                assert_eq!(expected, 8);
                assert_eq!(actual, 7);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_engine_packing_matches_adapter() {
        let mut img = RgbaImage::new(3, 2);
        for (i, px) in img.pixels_mut().enumerate() {
            *px = image::Rgba([i as u8, 100, 200 - i as u8, 255]);
        }
        let packed = to_engine_pixels(&img);
        assert_eq!(packed.len(), 3 * 3 * 4);
        assert_eq!(&packed[0..4], &[200, 100, 0, 255]);
        let back = from_engine_pixels(&packed, 3, 2).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_load_scaled_exact_size() {
        let dir = std::env::temp_dir().join(format!("trimview-surface-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.png");
        RgbaImage::from_pixel(64, 36, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        // Non-uniform stretch is accepted
        let img = load_scaled(&path, PanelSize::new(50, 40)).unwrap();
        assert_eq!(img.dimensions(), (50, 40));
        assert_eq!(img.get_pixel(10, 10).0, [255, 0, 0, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
