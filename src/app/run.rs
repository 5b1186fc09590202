//! Main application loop - eframe::App implementation.
//!
//! Flow per frame:
//! 1. Pump the shell (cache events, player tick, event queue drain)
//! 2. Loading screen until the critical stages are in and the minimum
//!    display time elapsed
//! 3. Viewport paint + stage overlay (label, slider, CTA, sound toggle)
//! 4. Continuous repaint while anything can still move

use std::time::{Duration, Instant};

use eframe::egui;
use log::info;

use crate::app::{PeakApp, overlay, stage_rect};
use crate::config::{BACKGROUND, MIN_LOADING_MS};
use crate::events::AdvanceRequested;
use crate::stage::Stage;

impl eframe::App for PeakApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.shell.pump(Instant::now());

        if !self.loading_done
            && self.shell.session.is_loaded()
            && self.loading_started.elapsed() >= Duration::from_millis(MIN_LOADING_MS)
        {
            self.loading_done = true;
            info!("Loading screen dismissed");
        }

        let bg = egui::Color32::from_rgb(BACKGROUND[0], BACKGROUND[1], BACKGROUND[2]);
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(bg))
            .show(ctx, |ui| {
                let rect = stage_rect(ui.max_rect());

                if !self.loading_done {
                    overlay::loading_screen(ui, rect, self.shell.session.loading_progress());
                    return;
                }

                self.viewport.paint(ui, rect, self.shell.visible_frame());

                let stage = self.shell.session.stage();
                if stage == Stage::Cta {
                    let shown_at = *self.cta_shown_at.get_or_insert_with(Instant::now);
                    overlay::cta_screen(
                        ui,
                        rect,
                        &self.content,
                        self.shell.session.recipient_name(),
                        shown_at,
                    );
                } else {
                    overlay::stage_label(ui, rect, &self.content, stage);
                    if stage.accepts_gesture() {
                        let hint = self.content.slide_hint(stage);
                        if overlay::swipe_slider(ui, rect, &mut self.slider, stage, hint) {
                            self.shell.bus.emitter().emit(AdvanceRequested);
                        }
                    }
                }

                if overlay::sound_toggle(ui, rect, self.shell.session.sound_enabled()) {
                    let enabled = self.shell.session.toggle_sound();
                    self.shell.sounds.set_enabled(enabled);
                }
            });

        // The experience animates continuously (playback, pulsing hint,
        // fades); keep the repaint loop running.
        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.shell.shutdown();
    }
}
