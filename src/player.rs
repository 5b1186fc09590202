//! Playback engine with frame-accurate pacing.
//!
//! # Timing Model
//!
//! The host ticks as fast as its refresh source allows; `tick()` advances at
//! most one frame per call and rate-limits advancement to `1000/fps` ms of
//! accumulated elapsed time. Drift is corrected on every advance by moving
//! the reference clock to `now - (elapsed % interval)` instead of `now`, so
//! the remainder carries over and no cumulative error builds up when the
//! tick cadence varies.
//!
//! # Boundaries
//!
//! Looping sequences wrap from the last frame to 0 and never stop on their
//! own. Non-looping sequences clamp to the final frame (it stays on screen
//! indefinitely) and report completion exactly once per play cycle.
//!
//! Rendering is not done here: the engine owns `{current_frame, is_playing}`
//! and the host paints whatever `current_frame()` says, which also makes
//! resize repaints free of playback side effects.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use crate::config::StageConfig;
use crate::sequence::Sequence;

/// What one `tick()` did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// The visible frame index changed.
    pub advanced: bool,
    /// A non-looping sequence just reached its end. Reported once per play
    /// cycle; the host maps it to a `PlaybackFinished` event.
    pub finished: bool,
}

/// Playback state for the active sequence. Exclusively owned by the host;
/// reset whenever the active sequence changes.
pub struct Player {
    sequence: Option<Arc<Sequence>>,
    config: Option<StageConfig>,
    current_frame: usize,
    is_playing: bool,
    last_frame_time: Option<Instant>,
    finished: bool,
}

impl Player {
    pub fn new() -> Self {
        Self {
            sequence: None,
            config: None,
            current_frame: 0,
            is_playing: false,
            last_frame_time: None,
            finished: false,
        }
    }

    /// Attach a sequence. Stops playback and resets position to frame 0.
    pub fn set_sequence(&mut self, sequence: Arc<Sequence>, config: StageConfig) {
        debug!(
            "Player: sequence for stage {} attached ({} frames @ {} fps)",
            sequence.stage().index(),
            sequence.len(),
            config.fps
        );
        self.sequence = Some(sequence);
        self.config = Some(config);
        self.current_frame = 0;
        self.is_playing = false;
        self.last_frame_time = None;
        self.finished = false;
    }

    /// Detach the sequence entirely (terminal stage has none).
    pub fn clear(&mut self) {
        self.sequence = None;
        self.config = None;
        self.current_frame = 0;
        self.is_playing = false;
        self.last_frame_time = None;
        self.finished = false;
    }

    /// Reset to frame 0 and start advancing.
    pub fn play(&mut self) {
        self.current_frame = 0;
        self.is_playing = true;
        self.finished = false;
        self.last_frame_time = None;
        debug!("Playback started");
    }

    /// Halt advancement, keeping the current position.
    pub fn pause(&mut self) {
        self.is_playing = false;
        self.last_frame_time = None;
    }

    /// Continue from the current position without resetting.
    pub fn resume(&mut self) {
        if !self.is_playing && self.sequence.is_some() {
            self.is_playing = true;
            self.last_frame_time = None;
        }
    }

    /// Halt advancement and hand position control back to the caller.
    /// Also clears the pacing clock, so no stale reference time can advance
    /// a torn-down sequence if the host reuses this player.
    pub fn stop(&mut self) {
        if self.is_playing {
            debug!("Playback stopped at frame {}", self.current_frame);
        }
        self.is_playing = false;
        self.last_frame_time = None;
    }

    /// Move to a specific frame without changing play/pause state (initial
    /// paint, resize repaint, scrubbing).
    pub fn set_frame(&mut self, index: usize) {
        if let Some(seq) = &self.sequence {
            if !seq.is_empty() {
                self.current_frame = index.min(seq.len() - 1);
            }
        }
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn sequence(&self) -> Option<&Arc<Sequence>> {
        self.sequence.as_ref()
    }

    /// Advance playback against the caller-supplied clock.
    pub fn tick(&mut self, now: Instant) -> Tick {
        let mut out = Tick::default();
        if !self.is_playing {
            return out;
        }
        let (Some(seq), Some(cfg)) = (&self.sequence, &self.config) else {
            return out;
        };
        if seq.is_empty() {
            return out;
        }

        let Some(last) = self.last_frame_time else {
            // First tick of this play cycle establishes the reference clock.
            self.last_frame_time = Some(now);
            return out;
        };

        let elapsed = now.saturating_duration_since(last);
        let interval = Duration::from_secs_f64(cfg.frame_interval_ms() / 1000.0);
        if elapsed < interval {
            return out;
        }

        // Drift correction: carry the sub-interval remainder instead of
        // resetting the reference to `now`.
        let remainder = Duration::from_nanos((elapsed.as_nanos() % interval.as_nanos()) as u64);
        self.last_frame_time = Some(now - remainder);

        let next = self.current_frame + 1;
        if next >= seq.len() {
            if cfg.looped {
                self.current_frame = 0;
                out.advanced = true;
            } else {
                // Hold the final frame on screen and latch completion.
                self.current_frame = seq.len() - 1;
                self.is_playing = false;
                self.last_frame_time = None;
                if !self.finished {
                    self.finished = true;
                    out.finished = true;
                }
                debug!("Sequence complete, holding frame {}", self.current_frame);
            }
        } else {
            self.current_frame = next;
            out.advanced = true;
        }
        out
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::stage::Stage;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn player(frame_count: usize, looped: bool, fps: f32) -> Player {
        let cfg = StageConfig { folder: "stage-0", frame_count, looped, fps };
        let frames = (0..frame_count).map(|_| Frame::placeholder()).collect();
        let seq = Arc::new(Sequence::new(Stage::Begin, frames));
        let mut p = Player::new();
        p.set_sequence(seq, cfg);
        p
    }

    #[test]
    fn advances_one_frame_per_interval() {
        let mut p = player(30, false, 18.0); // interval ~55.56ms
        p.play();
        let t0 = Instant::now();
        p.tick(t0); // establishes reference

        // Below the interval: no advance, frame stays at 0.
        assert_eq!(p.tick(t0 + ms(30)), Tick::default());
        assert_eq!(p.current_frame(), 0);

        // One interval elapsed: exactly one step.
        let tick = p.tick(t0 + ms(56));
        assert!(tick.advanced);
        assert_eq!(p.current_frame(), 1);
    }

    #[test]
    fn runs_to_last_frame_then_completes_once() {
        let mut p = player(30, false, 18.0);
        p.play();
        let t0 = Instant::now();
        p.tick(t0);

        let mut finishes = 0;
        for i in 1..=40 {
            let tick = p.tick(t0 + ms(56 * i));
            if tick.finished {
                finishes += 1;
            }
        }

        // Final frame index 29 remains on screen; completion fired once.
        assert_eq!(p.current_frame(), 29);
        assert!(!p.is_playing());
        assert_eq!(finishes, 1);

        // Further ticks never fire completion again or move the frame.
        let tick = p.tick(t0 + ms(56 * 100));
        assert_eq!(tick, Tick::default());
        assert_eq!(p.current_frame(), 29);
    }

    #[test]
    fn looping_sequence_wraps_and_never_stops() {
        let mut p = player(3, true, 18.0);
        p.play();
        let t0 = Instant::now();
        p.tick(t0);

        let mut seen = Vec::new();
        for i in 1..=7 {
            p.tick(t0 + ms(56 * i));
            seen.push(p.current_frame());
        }
        assert_eq!(seen, vec![1, 2, 0, 1, 2, 0, 1]);
        assert!(p.is_playing());
    }

    #[test]
    fn drift_is_corrected_not_reset() {
        let mut p = player(30, false, 18.0); // interval 55.56ms
        p.play();
        let t0 = Instant::now();
        p.tick(t0);

        // Jittery ticks. First advance at +60ms leaves a 4.4ms remainder in
        // the reference clock.
        p.tick(t0 + ms(20));
        p.tick(t0 + ms(40));
        p.tick(t0 + ms(60));
        assert_eq!(p.current_frame(), 1);

        // Two intervals are ~111.1ms of playback; with a naive reset to
        // "now" the second advance would not land until ~115.6ms.
        p.tick(t0 + ms(80));
        p.tick(t0 + ms(112));
        assert_eq!(p.current_frame(), 2);
    }

    #[test]
    fn pause_keeps_position_play_resets_it() {
        let mut p = player(10, false, 20.0); // 50ms interval
        p.play();
        let t0 = Instant::now();
        p.tick(t0);
        p.tick(t0 + ms(50));
        p.tick(t0 + ms(100));
        assert_eq!(p.current_frame(), 2);

        p.pause();
        assert!(!p.is_playing());
        p.tick(t0 + ms(400));
        assert_eq!(p.current_frame(), 2);

        p.resume();
        assert!(p.is_playing());
        assert_eq!(p.current_frame(), 2);

        p.play();
        assert_eq!(p.current_frame(), 0);
    }

    #[test]
    fn completion_latch_resets_per_play_cycle() {
        let mut p = player(2, false, 20.0);
        let t0 = Instant::now();

        p.play();
        p.tick(t0);
        p.tick(t0 + ms(50));
        let end = p.tick(t0 + ms(100));
        assert!(end.finished);

        // A fresh play cycle may finish again.
        p.play();
        p.tick(t0 + ms(200));
        p.tick(t0 + ms(250));
        let end = p.tick(t0 + ms(300));
        assert!(end.finished);
    }

    #[test]
    fn set_frame_does_not_disturb_play_state() {
        let mut p = player(10, false, 20.0);
        p.set_frame(7);
        assert_eq!(p.current_frame(), 7);
        assert!(!p.is_playing());

        p.set_frame(99);
        assert_eq!(p.current_frame(), 9); // clamped

        p.play();
        p.set_frame(3);
        assert!(p.is_playing());
    }

    #[test]
    fn tick_without_sequence_is_a_noop() {
        let mut p = Player::new();
        p.play();
        assert_eq!(p.tick(Instant::now()), Tick::default());
    }
}
