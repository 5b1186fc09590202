//! egui application shell.
//!
//! Everything with behavior lives in `shell::Shell`; this module owns the
//! window, paints the visible frame through the CPU surface, and draws the
//! presentational overlay (labels, swipe slider, loading screen, CTA).

mod overlay;
mod run;
mod viewport;

use std::sync::Arc;
use std::time::Instant;

use eframe::egui;

use crate::cli::Args;
use crate::content::Content;
use crate::frame::{DiskFetcher, FrameFetcher};
use crate::shell::Shell;
use crate::sound::create_bank;

pub use overlay::SliderState;
pub use viewport::Viewport;

/// Main application state.
pub struct PeakApp {
    shell: Shell,
    content: Content,
    viewport: Viewport,
    slider: SliderState,
    loading_started: Instant,
    loading_done: bool,
    cta_shown_at: Option<Instant>,
}

impl PeakApp {
    pub fn new(cc: &eframe::CreationContext<'_>, args: &Args, content: Content) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let fetcher: Arc<dyn FrameFetcher> = Arc::new(DiskFetcher);
        let bank = create_bank(&args.sounds_root);
        let mut shell =
            Shell::new(args.frames_root.clone(), &args.format, fetcher, bank, args.workers);

        shell.session.set_recipient_name(args.name.clone());
        if args.sound {
            shell.session.toggle_sound();
            shell.sounds.set_enabled(true);
        }
        shell.begin();

        Self {
            shell,
            content,
            viewport: Viewport::new(),
            slider: SliderState::default(),
            loading_started: Instant::now(),
            loading_done: false,
            cta_shown_at: None,
        }
    }
}

/// Largest 9:16 rect centered in `avail` - the mobile-locked container. On a
/// portrait window this is the full window; wider windows letterbox.
pub fn stage_rect(avail: egui::Rect) -> egui::Rect {
    let target_ratio = 9.0 / 16.0;
    let avail_ratio = avail.width() / avail.height();
    if avail_ratio <= target_ratio {
        return avail;
    }
    let w = avail.height() * target_ratio;
    egui::Rect::from_center_size(avail.center(), egui::vec2(w, avail.height()))
}
