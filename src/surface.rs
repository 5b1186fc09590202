//! Render destination abstraction and cover-fit compositing.
//!
//! The engine renders into a caller-supplied 2D surface; it does not own
//! surface creation. Every frame paint fills the full surface with the page
//! background first, then draws the frame scaled to cover the destination
//! (uniform scale, centered, overflow cropped), so transparent or
//! letterboxed sources never reveal stale pixels from a prior stage.
//!
//! Rendering against an unattached or zero-sized surface is a no-op, never
//! an error.

use image::RgbaImage;

use crate::config::BACKGROUND;
use crate::frame::Frame;

/// Destination rectangle in surface pixels. May extend beyond the surface on
/// either axis (that is the cropped overflow).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Cover-fit placement: uniform scale chosen as the larger of the
/// width-fit/height-fit ratios, centered on the destination.
pub fn fit_cover(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> FitRect {
    let (src_w, src_h) = (src_w as f32, src_h as f32);
    let (dst_w, dst_h) = (dst_w as f32, dst_h as f32);

    let dst_ratio = dst_w / dst_h;
    let src_ratio = src_w / src_h;

    if dst_ratio > src_ratio {
        // Destination is wider: fill width, crop top/bottom.
        let w = dst_w;
        let h = dst_w / src_ratio;
        FitRect { x: 0.0, y: (dst_h - h) / 2.0, w, h }
    } else {
        // Destination is taller: fill height, crop left/right.
        let h = dst_h;
        let w = dst_h * src_ratio;
        FitRect { x: (dst_w - w) / 2.0, y: 0.0, w, h }
    }
}

/// Caller-supplied 2D drawable.
pub trait DrawSurface {
    /// Physical pixel size. (0, 0) means "not attached yet".
    fn size(&self) -> (u32, u32);
    /// Full-surface fill.
    fn clear(&mut self, rgba: [u8; 4]);
    /// Draw `src` into `dst`, clipped to the surface.
    fn blit(&mut self, src: &RgbaImage, dst: FitRect);
}

/// Paint one frame: background fill, then cover-fit blit.
/// No-op while the surface has no area.
pub fn render_frame(surface: &mut dyn DrawSurface, frame: &Frame) {
    let (w, h) = surface.size();
    if w == 0 || h == 0 {
        return;
    }
    surface.clear(BACKGROUND);
    let rect = fit_cover(frame.width(), frame.height(), w, h);
    surface.blit(frame.pixels(), rect);
}

/// CPU pixel surface. The egui shell uploads it as a texture each repaint;
/// tests read it back directly.
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixel_ratio: f32,
    pixels: Vec<u8>, // RGBA, row-major
}

impl PixelSurface {
    pub fn new() -> Self {
        Self { width: 0, height: 0, pixel_ratio: 1.0, pixels: Vec::new() }
    }

    /// Resolution-aware reallocation: physical size = logical size x device
    /// pixel ratio. Returns true when the backing store actually changed
    /// (the caller then repaints the visible frame).
    pub fn resize(&mut self, logical_w: f32, logical_h: f32, pixel_ratio: f32) -> bool {
        let w = (logical_w * pixel_ratio).round().max(0.0) as u32;
        let h = (logical_h * pixel_ratio).round().max(0.0) as u32;
        if w == self.width && h == self.height && pixel_ratio == self.pixel_ratio {
            return false;
        }
        self.width = w;
        self.height = h;
        self.pixel_ratio = pixel_ratio;
        self.pixels = vec![0; (w as usize) * (h as usize) * 4];
        true
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) as usize) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }
}

impl Default for PixelSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawSurface for PixelSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, rgba: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    fn blit(&mut self, src: &RgbaImage, dst: FitRect) {
        if dst.w <= 0.0 || dst.h <= 0.0 || src.width() == 0 || src.height() == 0 {
            return;
        }

        // Clip the destination rect to the surface.
        let x0 = dst.x.max(0.0).floor() as u32;
        let y0 = dst.y.max(0.0).floor() as u32;
        let x1 = (dst.x + dst.w).min(self.width as f32).ceil() as u32;
        let y1 = (dst.y + dst.h).min(self.height as f32).ceil() as u32;

        for py in y0..y1 {
            for px in x0..x1 {
                // Inverse-map the pixel center into source space (nearest).
                let u = (px as f32 + 0.5 - dst.x) / dst.w;
                let v = (py as f32 + 0.5 - dst.y) / dst.h;
                let sx = ((u * src.width() as f32) as u32).min(src.width() - 1);
                let sy = ((v * src.height() as f32) as u32).min(src.height() - 1);
                let s = src.get_pixel(sx, sy).0;

                let i = ((py * self.width + px) as usize) * 4;
                // Source-over with the already painted background.
                let a = s[3] as u32;
                let inv = 255 - a;
                for c in 0..3 {
                    let d = self.pixels[i + c] as u32;
                    self.pixels[i + c] = ((s[c] as u32 * a + d * inv) / 255) as u8;
                }
                self.pixels[i + 3] = 255;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn cover_fit_wide_destination_crops_vertically() {
        let r = fit_cover(100, 100, 200, 100);
        assert_eq!(r, FitRect { x: 0.0, y: -50.0, w: 200.0, h: 200.0 });
    }

    #[test]
    fn cover_fit_tall_destination_crops_horizontally() {
        let r = fit_cover(100, 50, 100, 200);
        assert_eq!(r, FitRect { x: -150.0, y: 0.0, w: 400.0, h: 200.0 });
    }

    #[test]
    fn cover_fit_exact_match_is_identity() {
        let r = fit_cover(64, 64, 64, 64);
        assert_eq!(r, FitRect { x: 0.0, y: 0.0, w: 64.0, h: 64.0 });
    }

    #[test]
    fn render_paints_background_under_frame() {
        let mut surface = PixelSurface::new();
        surface.resize(4.0, 4.0, 1.0);

        // 1x1 placeholder covers everything with the background color.
        render_frame(&mut surface, &Frame::placeholder());
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(surface.pixel(x, y), BACKGROUND);
            }
        }
    }

    #[test]
    fn render_on_zero_sized_surface_is_noop() {
        let mut surface = PixelSurface::new();
        assert_eq!(surface.size(), (0, 0));
        render_frame(&mut surface, &Frame::placeholder()); // must not panic
        assert!(surface.data().is_empty());
    }

    #[test]
    fn blit_centers_and_crops_overflow() {
        // 2x1 source: left red, right blue, onto a 2x2 surface.
        // Cover scale doubles it to 4x2 at x=-1: the left column samples the
        // red texel, the right column the blue one.
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let mut surface = PixelSurface::new();
        surface.resize(2.0, 2.0, 1.0);
        surface.clear(BACKGROUND);
        surface.blit(&src, fit_cover(2, 1, 2, 2));

        for y in 0..2 {
            assert_eq!(surface.pixel(0, y), [255, 0, 0, 255]);
            assert_eq!(surface.pixel(1, y), [0, 0, 255, 255]);
        }
    }

    #[test]
    fn resize_is_pixel_ratio_aware_and_idempotent() {
        let mut surface = PixelSurface::new();
        assert!(surface.resize(100.0, 50.0, 2.0));
        assert_eq!(surface.size(), (200, 100));
        assert_eq!(surface.data().len(), 200 * 100 * 4);

        // Same geometry: no reallocation.
        assert!(!surface.resize(100.0, 50.0, 2.0));

        // Density change alone reallocates.
        assert!(surface.resize(100.0, 50.0, 1.0));
        assert_eq!(surface.size(), (100, 50));
    }

    #[test]
    fn resize_repaint_preserves_frame_choice() {
        // Repainting after resize is the caller's job and must not depend on
        // playback state: render the same frame at two sizes.
        let frame = Frame::new(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255])));
        let mut surface = PixelSurface::new();

        surface.resize(2.0, 2.0, 1.0);
        render_frame(&mut surface, &frame);
        assert_eq!(surface.pixel(0, 0), [10, 20, 30, 255]);

        surface.resize(2.0, 2.0, 2.0);
        render_frame(&mut surface, &frame);
        assert_eq!(surface.size(), (4, 4));
        assert_eq!(surface.pixel(3, 3), [10, 20, 30, 255]);
    }
}
