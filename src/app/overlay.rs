//! Presentational overlay: loading screen, stage labels, swipe slider,
//! sound toggle and the call-to-action screen.
//!
//! Nothing here mutates the session directly; a completed swipe only reports
//! back so the app can emit `AdvanceRequested`.

use std::time::Instant;

use eframe::egui::{self, Align2, Color32, FontId, Rect, pos2, vec2};

use crate::config::{CTA_FADE_MS, GOLD};
use crate::content::Content;
use crate::stage::Stage;

const TRACK_WIDTH: f32 = 240.0;
const TRACK_HEIGHT: f32 = 56.0;
const THUMB_SIZE: f32 = 48.0;
/// Fraction of full travel that counts as a completed swipe.
const COMPLETE_AT: f32 = 0.85;

fn gold() -> Color32 {
    Color32::from_rgb(GOLD[0], GOLD[1], GOLD[2])
}

fn faded(color: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), (color.a() as f32 * t) as u8)
}

fn text_line(
    painter: &egui::Painter,
    x: f32,
    y: &mut f32,
    text: &str,
    size: f32,
    color: Color32,
    dy: f32,
) {
    painter.text(pos2(x, *y), Align2::LEFT_TOP, text, FontId::proportional(size), color);
    *y += dy;
}

/// Loading screen with fractional progress readout.
pub fn loading_screen(ui: &mut egui::Ui, rect: Rect, progress: f32) {
    let painter = ui.painter();
    let center = rect.center();

    painter.text(
        pos2(center.x, center.y - 40.0),
        Align2::CENTER_CENTER,
        "FLUX REAL",
        FontId::proportional(24.0),
        Color32::from_gray(240),
    );

    // Thin progress track with a gold fill.
    let bar_w = 200.0;
    let bar = Rect::from_center_size(pos2(center.x, center.y + 10.0), vec2(bar_w, 3.0));
    painter.rect_filled(bar, 1.5, Color32::from_gray(50));
    let fill = Rect::from_min_size(bar.min, vec2(bar_w * progress.clamp(0.0, 1.0), 3.0));
    painter.rect_filled(fill, 1.5, gold());

    painter.text(
        pos2(center.x, center.y + 34.0),
        Align2::CENTER_CENTER,
        format!("{}%", (progress.clamp(0.0, 1.0) * 100.0).round() as u32),
        FontId::proportional(12.0),
        Color32::from_gray(150),
    );
}

/// Stage label: stacked words, upper third, left-aligned, gold accent line.
pub fn stage_label(ui: &mut egui::Ui, rect: Rect, content: &Content, stage: Stage) {
    let Some(label) = content.label_for(stage) else {
        return;
    };
    let painter = ui.painter();
    let left = rect.left() + 32.0;
    let mut y = rect.top() + rect.height() / 3.0;

    for word in label.split_whitespace() {
        painter.text(
            pos2(left, y),
            Align2::LEFT_TOP,
            word,
            FontId::proportional(34.0),
            Color32::from_gray(250),
        );
        y += 42.0;
    }

    painter.line_segment([pos2(left, y + 10.0), pos2(left + 64.0, y + 10.0)], (2.0, gold()));
}

/// Swipe slider state, reset whenever the stage changes.
#[derive(Default)]
pub struct SliderState {
    offset: f32,
    stage: Option<Stage>,
}

/// Draw the swipe-to-advance control. Returns true when a swipe completed
/// this frame (thumb released at >= 85% travel).
pub fn swipe_slider(
    ui: &mut egui::Ui,
    rect: Rect,
    state: &mut SliderState,
    stage: Stage,
    hint: &str,
) -> bool {
    if state.stage != Some(stage) {
        state.stage = Some(stage);
        state.offset = 0.0;
    }

    let track = Rect::from_min_size(
        pos2(rect.left() + 32.0, rect.bottom() - 64.0 - TRACK_HEIGHT),
        vec2(TRACK_WIDTH.min(rect.width() - 64.0), TRACK_HEIGHT),
    );
    let max_drag = track.width() - THUMB_SIZE - 8.0;

    let thumb = Rect::from_min_size(
        pos2(track.left() + 4.0 + state.offset, track.center().y - THUMB_SIZE / 2.0),
        vec2(THUMB_SIZE, THUMB_SIZE),
    );
    let response = ui.allocate_rect(thumb, egui::Sense::drag());

    let mut completed = false;
    if response.dragged() {
        state.offset = (state.offset + response.drag_delta().x).clamp(0.0, max_drag);
    } else if response.drag_stopped() && state.offset >= max_drag * COMPLETE_AT {
        completed = true;
        state.offset = 0.0;
    } else if state.offset > 0.0 {
        // Snap back when released short of the threshold.
        let dt = ui.input(|i| i.stable_dt).min(0.1);
        state.offset = (state.offset - max_drag * 6.0 * dt).max(0.0);
    }

    let painter = ui.painter();

    // Pulsing hint above the track.
    let time = ui.input(|i| i.time);
    let pulse = 0.7 + 0.3 * ((time * std::f64::consts::TAU / 2.0).sin() as f32);
    painter.text(
        pos2(track.left(), track.top() - 18.0),
        Align2::LEFT_BOTTOM,
        hint,
        FontId::proportional(11.0),
        faded(Color32::from_gray(230), pulse),
    );

    // Track, progress fill, thumb.
    painter.rect_filled(track, TRACK_HEIGHT / 2.0, Color32::from_black_alpha(140));
    if state.offset > 0.0 {
        let fill = Rect::from_min_size(
            track.min,
            vec2(state.offset + THUMB_SIZE / 2.0 + 4.0, track.height()),
        );
        let strength = state.offset / max_drag;
        painter.rect_filled(fill, TRACK_HEIGHT / 2.0, faded(gold(), 0.25 + 0.5 * strength));
    }
    let thumb = Rect::from_min_size(
        pos2(track.left() + 4.0 + state.offset, track.center().y - THUMB_SIZE / 2.0),
        vec2(THUMB_SIZE, THUMB_SIZE),
    );
    painter.rect_filled(thumb, THUMB_SIZE / 2.0, Color32::from_gray(245));
    painter.text(
        thumb.center(),
        Align2::CENTER_CENTER,
        ">",
        FontId::proportional(20.0),
        Color32::from_gray(20),
    );

    completed
}

/// Mute/unmute button, top-right. Returns true when clicked.
pub fn sound_toggle(ui: &mut egui::Ui, rect: Rect, enabled: bool) -> bool {
    let button = Rect::from_min_size(pos2(rect.right() - 104.0, rect.top() + 16.0), vec2(88.0, 24.0));
    let label = if enabled { "SOUND ON" } else { "SOUND OFF" };
    ui.put(button, egui::Button::new(egui::RichText::new(label).size(10.0)))
        .clicked()
}

/// Terminal call-to-action screen, fading in over the held finale frame.
pub fn cta_screen(
    ui: &mut egui::Ui,
    rect: Rect,
    content: &Content,
    recipient: Option<&str>,
    shown_at: Instant,
) {
    let t = (shown_at.elapsed().as_millis() as f32 / CTA_FADE_MS as f32).clamp(0.0, 1.0);
    let cta = &content.cta;

    let painter = ui.painter();
    painter.rect_filled(rect, 0.0, faded(Color32::from_black_alpha(200), t));

    let left = rect.left() + 32.0;
    let mut y = rect.top() + 56.0;

    text_line(painter, left, &mut y, &cta.header, 12.0, faded(gold(), t), 28.0);

    if let Some(name) = recipient {
        let greeting = format!("FOR {}", name.to_uppercase());
        text_line(painter, left, &mut y, &greeting, 12.0, faded(Color32::from_gray(200), t), 24.0);
    }

    text_line(painter, left, &mut y, &cta.title, 26.0, faded(Color32::from_gray(250), t), 32.0);
    let powered = format!("{} {}", cta.title_sub, cta.title_highlight);
    text_line(painter, left, &mut y, &powered, 20.0, faded(gold(), t), 36.0);
    let subtitle = format!("{} · {}", cta.subtitle, cta.subtitle_highlight);
    text_line(painter, left, &mut y, &subtitle, 13.0, faded(Color32::from_gray(170), t), 36.0);

    for event in &cta.events {
        let row = if event.location.is_empty() {
            format!("{}  -  {}", event.name, event.dates)
        } else {
            format!("{}, {}  -  {}", event.name, event.location, event.dates)
        };
        text_line(painter, left, &mut y, &row, 12.0, faded(Color32::from_gray(210), t), 22.0);
    }
    y += 14.0;

    let tagline = format!("{} {}", cta.tagline, cta.tagline_highlight);
    text_line(painter, left, &mut y, &tagline, 15.0, faded(Color32::from_gray(220), t), 26.0);
    text_line(painter, left, &mut y, &cta.closing, 15.0, faded(gold(), t), 46.0);

    let button = Rect::from_min_size(pos2(left, y), vec2(rect.width() - 64.0, 40.0));
    let clicked = ui
        .put(button, egui::Button::new(egui::RichText::new(&cta.button_text).size(13.0).strong()))
        .clicked();
    if clicked {
        ui.ctx().open_url(egui::OpenUrl::new_tab(&cta.button_url));
    }
}
