//! Stage progression state machine and session context.
//!
//! The experience is a fixed script of six stages. Progression is monotonic:
//! `advance()` moves exactly one step forward and is a no-op on the terminal
//! stage. There are no jump or backward transitions.
//!
//! `Session` is the explicit context object that replaces ambient global
//! state: it has a single owner (the app) and a narrow mutation API. Anything
//! else observes changes through the events it emits.

use log::{debug, info};

use crate::config::{STAGE_CONFIGS, StageConfig};
use crate::events::{EventEmitter, HapticPulse, StageChanged};

/// One discrete step of the scripted experience.
///
/// `Begin`..`Fireworks` carry a frame sequence; `Cta` is the terminal
/// call-to-action screen with no sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Begin,
    Vision,
    Growth,
    Launch,
    Fireworks,
    Cta,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Begin,
        Stage::Vision,
        Stage::Growth,
        Stage::Launch,
        Stage::Fireworks,
        Stage::Cta,
    ];

    /// Stages that own a frame sequence, in playback order.
    pub const SEQUENCED: [Stage; 5] = [
        Stage::Begin,
        Stage::Vision,
        Stage::Growth,
        Stage::Launch,
        Stage::Fireworks,
    ];

    /// Stable 0..5 index.
    pub fn index(self) -> usize {
        match self {
            Stage::Begin => 0,
            Stage::Vision => 1,
            Stage::Growth => 2,
            Stage::Launch => 3,
            Stage::Fireworks => 4,
            Stage::Cta => 5,
        }
    }

    pub fn from_index(i: usize) -> Option<Stage> {
        Stage::ALL.get(i).copied()
    }

    /// The following stage, or `None` from the terminal stage.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Begin => Some(Stage::Vision),
            Stage::Vision => Some(Stage::Growth),
            Stage::Growth => Some(Stage::Launch),
            Stage::Launch => Some(Stage::Fireworks),
            Stage::Fireworks => Some(Stage::Cta),
            Stage::Cta => None,
        }
    }

    /// Playback descriptor, exhaustively keyed on the enum. `Cta` has none.
    pub fn config(self) -> Option<&'static StageConfig> {
        match self {
            Stage::Begin => Some(&STAGE_CONFIGS[0]),
            Stage::Vision => Some(&STAGE_CONFIGS[1]),
            Stage::Growth => Some(&STAGE_CONFIGS[2]),
            Stage::Launch => Some(&STAGE_CONFIGS[3]),
            Stage::Fireworks => Some(&STAGE_CONFIGS[4]),
            Stage::Cta => None,
        }
    }

    /// Stages 0-3 advance on a completed swipe; 4 auto-advances, 5 is final.
    pub fn accepts_gesture(self) -> bool {
        matches!(self, Stage::Begin | Stage::Vision | Stage::Growth | Stage::Launch)
    }
}

/// Session context: current stage plus the handful of UI flags the overlay
/// reads. Owned by the app; mutations go through this API only.
pub struct Session {
    stage: Stage,
    sound_enabled: bool,
    recipient_name: Option<String>,
    loaded: bool,
    loading_progress: f32,
    emitter: EventEmitter,
}

impl Session {
    pub fn new(emitter: EventEmitter) -> Self {
        Self {
            stage: Stage::Begin,
            sound_enabled: false,
            recipient_name: None,
            loaded: false,
            loading_progress: 0.0,
            emitter,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Step to the next stage. Returns false (and does nothing) from the
    /// terminal stage. Emits `StageChanged` and a haptic pulse on success.
    ///
    /// Requires `&mut self`, so calls are serialized by ownership; rapid
    /// duplicate requests are coalesced upstream by the app, which applies at
    /// most one advance per UI tick when draining the event queue.
    pub fn advance(&mut self) -> bool {
        let Some(next) = self.stage.next() else {
            debug!("advance() at terminal stage, ignoring");
            return false;
        };
        let from = self.stage;
        self.stage = next;
        info!("Stage {} -> {}", from.index(), next.index());
        self.emitter.emit(StageChanged { from, to: next });
        self.emitter.emit(HapticPulse);
        true
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        debug!("Sound {}", if self.sound_enabled { "on" } else { "off" });
        self.sound_enabled
    }

    pub fn recipient_name(&self) -> Option<&str> {
        self.recipient_name.as_deref()
    }

    pub fn set_recipient_name(&mut self, name: Option<String>) {
        self.recipient_name = name;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub fn loading_progress(&self) -> f32 {
        self.loading_progress
    }

    pub fn set_loading_progress(&mut self, progress: f32) {
        self.loading_progress = progress.clamp(0.0, 1.0);
    }
}
