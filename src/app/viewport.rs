//! Frame viewport: CPU surface composited and uploaded as an egui texture.
//!
//! The surface is resized to the container's physical pixel size (device
//! pixel ratio included) and re-composited only when the visible frame or the
//! geometry changed; resize therefore repaints the current frame without
//! touching playback state.

use eframe::egui;

use crate::config::BACKGROUND;
use crate::frame::Frame;
use crate::surface::{DrawSurface, PixelSurface, render_frame};

pub struct Viewport {
    surface: PixelSurface,
    texture: Option<egui::TextureHandle>,
    /// Identity of the last composited frame (pixel buffer address).
    last_key: Option<usize>,
}

impl Viewport {
    pub fn new() -> Self {
        Self { surface: PixelSurface::new(), texture: None, last_key: None }
    }

    pub fn paint(&mut self, ui: &mut egui::Ui, rect: egui::Rect, frame: Option<&Frame>) {
        let bg = egui::Color32::from_rgb(BACKGROUND[0], BACKGROUND[1], BACKGROUND[2]);
        ui.painter().rect_filled(ui.max_rect(), 0.0, bg);

        let Some(frame) = frame else {
            self.last_key = None;
            return;
        };

        let ppp = ui.ctx().pixels_per_point();
        let resized = self.surface.resize(rect.width(), rect.height(), ppp);
        let (w, h) = self.surface.size();
        if w == 0 || h == 0 {
            return;
        }

        let key = frame.pixels() as *const _ as usize;
        if resized || self.last_key != Some(key) || self.texture.is_none() {
            render_frame(&mut self.surface, frame);
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [w as usize, h as usize],
                self.surface.data(),
            );
            match &mut self.texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.texture =
                        Some(ui.ctx().load_texture("viewport", image, egui::TextureOptions::LINEAR));
                }
            }
            self.last_key = Some(key);
        }

        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}
