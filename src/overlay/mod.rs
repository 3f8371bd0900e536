/*
 *  overlay/mod.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Offscreen RGBA overlay canvas and screenshot plumbing
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! The surface plugins draw into between frames. The canvas tracks the
//! console's dock state: when the resolution changes, the surface is
//! recreated and prior contents are discarded. Presentation and frame
//! capture stay behind host-supplied callbacks; this module only owns
//! the pixels.

use std::io::Cursor;
use std::path::Path;

use image::imageops;
use log::{debug, warn};
use tiny_skia::{Color, ColorU8, IntSize, Pixmap, PixmapPaint, Transform};

use crate::constants::{DOCKED_HEIGHT, DOCKED_WIDTH, HANDHELD_HEIGHT, HANDHELD_WIDTH};

/// A captured frame as raw RGBA8.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Offscreen RGBA canvas, sized to the console's current output mode.
pub struct OverlayCanvas {
    pixmap: Pixmap,
    docked: bool,
}

fn blank_surface(docked: bool) -> Pixmap {
    let (width, height) = if docked {
        (DOCKED_WIDTH, DOCKED_HEIGHT)
    } else {
        (HANDHELD_WIDTH, HANDHELD_HEIGHT)
    };
    // Both resolutions are non-zero constants.
    Pixmap::new(width, height).expect("overlay dimensions are non-zero")
}

impl OverlayCanvas {
    pub fn new(docked: bool) -> Self {
        Self { pixmap: blank_surface(docked), docked }
    }

    /// Reconcile the canvas with the current dock state. On a change the
    /// surface is recreated at the new resolution; prior contents are
    /// gone. Call before every access.
    pub fn refresh(&mut self, docked_now: bool) {
        if self.docked != docked_now {
            debug!(
                "Dock state changed ({} -> {}), recreating overlay surface",
                self.docked, docked_now
            );
            self.docked = docked_now;
            self.pixmap = blank_surface(docked_now);
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    pub fn draw_pixel(&mut self, x: i32, y: i32, alpha: u8, red: u8, green: u8, blue: u8) {
        if x < 0 || y < 0 || x as u32 >= self.pixmap.width() || y as u32 >= self.pixmap.height() {
            return;
        }
        let index = y as usize * self.pixmap.width() as usize + x as usize;
        self.pixmap.pixels_mut()[index] = ColorU8::from_rgba(red, green, blue, alpha).premultiply();
    }

    /// Blit an image file onto the canvas at (`dx`, `dy`). A positive
    /// `sw`/`sh` selects a source sub-rectangle; otherwise the whole
    /// image is used. `alpha_mul` scales the source's opacity.
    pub fn draw_image_file(
        &mut self,
        dx: i32,
        dy: i32,
        path: &Path,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        alpha_mul: f32,
    ) -> Result<(), String> {
        let img = image::open(path)
            .map_err(|e| format!("Failed to open image {}: {}", path.display(), e))?
            .to_rgba8();
        let img = if sw > 0 && sh > 0 {
            imageops::crop_imm(&img, sx.max(0) as u32, sy.max(0) as u32, sw as u32, sh as u32)
                .to_image()
        } else {
            img
        };

        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        premultiply_rgba(&mut data);
        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| format!("Image {} has a zero dimension", path.display()))?;
        let source = Pixmap::from_vec(data, size)
            .ok_or_else(|| format!("Image {} could not back a pixmap", path.display()))?;

        let paint = PixmapPaint { opacity: alpha_mul.clamp(0.0, 1.0), ..PixmapPaint::default() };
        self.pixmap
            .draw_pixmap(dx, dy, source.as_ref(), &paint, Transform::identity(), None);
        Ok(())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

fn premultiply_rgba(data: &mut [u8]) {
    for pixel in data.chunks_exact_mut(4) {
        let alpha = pixel[3] as u16;
        pixel[0] = (pixel[0] as u16 * alpha / 255) as u8;
        pixel[1] = (pixel[1] as u16 * alpha / 255) as u8;
        pixel[2] = (pixel[2] as u16 * alpha / 255) as u8;
    }
}

/// Encode a captured frame with the named image format ("png", "jpg",
/// ...). Returns None when the format is unknown or encoding fails.
pub fn encode_frame(frame: &RawFrame, format: &str) -> Option<Vec<u8>> {
    let format = image::ImageFormat::from_extension(format)?;
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())?;
    let mut out = Cursor::new(Vec::new());
    let written = match format {
        // JPEG has no alpha channel.
        image::ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(img).to_rgb8().write_to(&mut out, format),
        _ => img.write_to(&mut out, format),
    };
    match written {
        Ok(()) => Some(out.into_inner()),
        Err(e) => {
            warn!("Screenshot encoding failed: {}", e);
            None
        }
    }
}

/// Encode a captured frame by the target path's extension (PNG when the
/// path has none) and write it out.
pub fn save_frame(frame: &RawFrame, path: &Path) -> bool {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png");
    let Some(encoded) = encode_frame(frame, format) else {
        return false;
    };
    match std::fs::write(path, encoded) {
        Ok(()) => true,
        Err(e) => {
            warn!("Writing screenshot to {} failed: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_sizes_follow_dock_state() {
        let canvas = OverlayCanvas::new(false);
        assert_eq!((canvas.width(), canvas.height()), (HANDHELD_WIDTH, HANDHELD_HEIGHT));

        let canvas = OverlayCanvas::new(true);
        assert_eq!((canvas.width(), canvas.height()), (DOCKED_WIDTH, DOCKED_HEIGHT));
    }

    #[test]
    fn test_dock_change_recreates_surface_and_discards_contents() {
        let mut canvas = OverlayCanvas::new(false);
        canvas.draw_pixel(10, 10, 255, 255, 0, 0);
        let index = 10 * canvas.width() as usize + 10;
        assert_ne!(canvas.pixmap().pixels()[index].alpha(), 0);

        canvas.refresh(true);
        assert_eq!((canvas.width(), canvas.height()), (DOCKED_WIDTH, DOCKED_HEIGHT));
        assert_eq!(canvas.pixmap().pixels()[index].alpha(), 0);

        // Unchanged dock state keeps the surface.
        canvas.draw_pixel(10, 10, 255, 0, 255, 0);
        canvas.refresh(true);
        assert_ne!(canvas.pixmap().pixels()[index].alpha(), 0);
    }

    #[test]
    fn test_draw_pixel_ignores_out_of_bounds() {
        let mut canvas = OverlayCanvas::new(false);
        canvas.draw_pixel(-1, 0, 255, 255, 255, 255);
        canvas.draw_pixel(0, HANDHELD_HEIGHT as i32, 255, 255, 255, 255);
        assert!(canvas.pixmap().pixels().iter().all(|px| px.alpha() == 0));
    }

    #[test]
    fn test_encode_frame_png_and_unknown_format() {
        let frame = RawFrame { width: 2, height: 2, data: vec![255; 16] };

        let png = encode_frame(&frame, "png").expect("png encodes");
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

        assert!(encode_frame(&frame, "not-a-format").is_none());
    }

    #[test]
    fn test_encode_frame_jpeg_drops_alpha() {
        let frame = RawFrame { width: 4, height: 4, data: vec![128; 64] };
        assert!(encode_frame(&frame, "jpg").is_some());
    }
}
