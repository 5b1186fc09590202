//! Headless core shell: session, cache, player and event wiring without any
//! UI attached.
//!
//! The egui app owns a `Shell` and calls `pump()` once per repaint; tests
//! drive the same shell with simulated timestamps to walk the whole script
//! end to end. All stage logic lives here so the overlay stays purely
//! presentational.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use log::{debug, trace};

use crate::cache::{CacheEvent, FrameCache, LoadState};
use crate::config::{CRITICAL_STAGES, SETTLE_DELAY_MS};
use crate::events::{
    AdvanceRequested, EventBus, HapticPulse, PlaybackFinished, StageChanged, downcast_event,
};
use crate::frame::{Frame, FrameFetcher};
use crate::player::Player;
use crate::sound::{SoundBank, SoundTrigger};
use crate::stage::{Session, Stage};
use crate::workers::Workers;

/// Core state shared by the GUI shell and headless embedders.
pub struct Shell {
    pub session: Session,
    pub bus: EventBus,
    pub cache: Arc<FrameCache>,
    pub cache_rx: Receiver<CacheEvent>,
    pub player: Player,
    pub sounds: SoundTrigger,
    workers: Arc<Workers>,
    active_stage: Stage,
    auto_advance_at: Option<Instant>,
    preload: Option<thread::JoinHandle<()>>,
}

impl Shell {
    pub fn new(
        frames_root: PathBuf,
        ext: &str,
        fetcher: Arc<dyn FrameFetcher>,
        bank: Box<dyn SoundBank>,
        workers_override: Option<usize>,
    ) -> Self {
        let num_workers = workers_override.unwrap_or_else(|| (num_cpus::get() * 3 / 4).max(1));
        let workers = Arc::new(Workers::new(num_workers));
        let (cache, cache_rx) = FrameCache::new(frames_root, ext, fetcher, Arc::clone(&workers));

        let bus = EventBus::new();
        let session = Session::new(bus.emitter());

        Self {
            session,
            bus,
            cache,
            cache_rx,
            player: Player::new(),
            sounds: SoundTrigger::new(bank),
            workers,
            active_stage: Stage::Begin,
            auto_advance_at: None,
            preload: None,
        }
    }

    /// Kick off loading: the opening stage in the foreground, everything else
    /// chained in the background in stage order.
    pub fn begin(&mut self) {
        self.activate_stage(Stage::Begin);
        let rest: Vec<Stage> =
            Stage::SEQUENCED.iter().copied().filter(|s| *s != Stage::Begin).collect();
        self.preload = Some(self.cache.preload_all(rest));
    }

    /// One frame of core logic against the caller's clock. The GUI calls this
    /// per repaint with `Instant::now()`; tests pass simulated time.
    pub fn pump(&mut self, now: Instant) {
        self.drain_cache_events();

        let tick = self.player.tick(now);
        if tick.finished {
            if let Some(seq) = self.player.sequence() {
                self.bus.emitter().emit(PlaybackFinished { stage: seq.stage() });
            }
        }

        if let Some(deadline) = self.auto_advance_at {
            if now >= deadline {
                self.auto_advance_at = None;
                debug!("Auto-advance settle elapsed");
                self.bus.emitter().emit(AdvanceRequested);
            }
        }

        self.drain_bus_events(now);
    }

    /// Frame the render destination should show right now.
    pub fn visible_frame(&self) -> Option<&Frame> {
        let seq = self.player.sequence()?;
        seq.get(self.player.current_frame())
    }

    pub fn active_stage(&self) -> Stage {
        self.active_stage
    }

    pub fn worker_count(&self) -> usize {
        self.workers.thread_count()
    }

    /// Stop playback and detach the preload thread handle (it finishes on its
    /// own; the worker pool joins in `Workers::drop`).
    pub fn shutdown(&mut self) {
        self.player.stop();
        if let Some(handle) = self.preload.take() {
            drop(handle);
        }
    }

    fn drain_cache_events(&mut self) {
        let mut saw_event = false;
        let mut ready: Vec<Stage> = Vec::new();
        for event in self.cache_rx.try_iter() {
            saw_event = true;
            if let CacheEvent::StageReady { stage } = event {
                ready.push(stage);
            }
        }
        if !saw_event {
            return;
        }

        // Loading screen gates on the critical stages only.
        let progress = CRITICAL_STAGES
            .iter()
            .map(|s| self.cache.progress(*s))
            .sum::<f32>()
            / CRITICAL_STAGES.len() as f32;
        self.session.set_loading_progress(progress);
        if progress >= 1.0 && !self.session.is_loaded() {
            self.session.set_loaded(true);
            debug!("Critical stages loaded");
        }

        // The active stage finished loading while we were waiting on it.
        for stage in ready {
            if stage == self.active_stage && !self.active_sequence_attached() {
                self.attach_and_play(stage);
            }
        }
    }

    fn drain_bus_events(&mut self, now: Instant) {
        let events = self.bus.poll();
        let mut advance_requests = 0usize;

        for event in &events {
            if downcast_event::<AdvanceRequested>(event).is_some() {
                advance_requests += 1;
            } else if let Some(finished) = downcast_event::<PlaybackFinished>(event) {
                if finished.stage == Stage::Fireworks && self.session.stage() == Stage::Fireworks {
                    self.auto_advance_at =
                        Some(now + Duration::from_millis(SETTLE_DELAY_MS));
                    debug!("Finale complete, settling before call-to-action");
                }
            } else if let Some(changed) = downcast_event::<StageChanged>(event) {
                self.sounds.on_stage_changed(changed.from, changed.to);
                self.activate_stage(changed.to);
            } else if downcast_event::<HapticPulse>(event).is_some() {
                // No actuator on desktop; the pulse is cosmetic anyway.
                trace!("Haptic pulse");
            }
        }

        // Coalesce: at most one advance per drained queue, so rapid duplicate
        // gestures within a tick step a single stage.
        if advance_requests > 0 {
            if advance_requests > 1 {
                debug!("Coalesced {} advance requests into one", advance_requests);
            }
            self.session.advance();
        }
    }

    fn active_sequence_attached(&self) -> bool {
        self.player.sequence().map(|s| s.stage()) == Some(self.active_stage)
    }

    fn activate_stage(&mut self, stage: Stage) {
        if stage.config().is_none() {
            // Terminal stage: leave the finale's last frame on screen beneath
            // the call-to-action overlay.
            self.active_stage = stage;
            return;
        }

        // The old sequence's loop is fully stopped before the new stage's
        // load is touched.
        self.player.stop();
        self.auto_advance_at = None;
        self.active_stage = stage;

        match self.cache.request(stage) {
            Some(LoadState::Ready(_)) => self.attach_and_play(stage),
            _ => {
                // Attached later from the StageReady notification.
                self.player.clear();
            }
        }
    }

    fn attach_and_play(&mut self, stage: Stage) {
        let (Some(seq), Some(cfg)) = (self.cache.get(stage), stage.config()) else {
            return;
        };
        self.player.set_sequence(seq, *cfg);
        self.player.play();
    }
}

/// Initialize logging. Default level is warn; each `-v` raises it.
pub fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}
