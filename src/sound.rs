//! Stage-transition sound cues.
//!
//! The core only exposes the current stage; this layer observes transitions
//! and maps them to cue names. Playback backends sit behind `SoundBank`: the
//! default build ships a logging null bank, the `audio` feature adds a
//! kira-backed one. Any backend or playback failure leaves audio silent -
//! audio is never a correctness dependency.

use log::debug;

use crate::stage::Stage;

/// Named audio assets (`<sounds>/<stem>.mp3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Looping bed, runs while sound is enabled.
    Ambient,
    Lock,
    Whoosh,
    Fireworks,
}

impl Cue {
    pub fn file_stem(self) -> &'static str {
        match self {
            Cue::Ambient => "ambient",
            Cue::Lock => "lock",
            Cue::Whoosh => "whoosh",
            Cue::Fireworks => "fireworks",
        }
    }
}

/// Cue for a committed stage transition, if that transition has one.
pub fn cue_for_transition(from: Stage, to: Stage) -> Option<Cue> {
    let cue = match to {
        Stage::Vision => Some(Cue::Lock),
        Stage::Growth => Some(Cue::Whoosh),
        Stage::Fireworks => Some(Cue::Fireworks),
        Stage::Begin | Stage::Launch | Stage::Cta => None,
    };
    debug!("Transition {} -> {}: cue {:?}", from.index(), to.index(), cue);
    cue
}

/// Audio backend seam.
pub trait SoundBank: Send {
    fn play(&mut self, cue: Cue);
    fn stop_ambient(&mut self);
}

/// Silent backend: logs what it would have played.
#[derive(Debug, Default)]
pub struct NullBank;

impl SoundBank for NullBank {
    fn play(&mut self, cue: Cue) {
        debug!("Sound (muted backend): {:?}", cue);
    }

    fn stop_ambient(&mut self) {}
}

/// Maps committed transitions to cue playback, honoring the sound toggle.
pub struct SoundTrigger {
    bank: Box<dyn SoundBank>,
    enabled: bool,
}

impl SoundTrigger {
    pub fn new(bank: Box<dyn SoundBank>) -> Self {
        Self { bank, enabled: false }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.bank.play(Cue::Ambient);
        } else {
            self.bank.stop_ambient();
        }
    }

    pub fn on_stage_changed(&mut self, from: Stage, to: Stage) {
        let Some(cue) = cue_for_transition(from, to) else {
            return;
        };
        if self.enabled {
            self.bank.play(cue);
        }
    }
}

/// Best available backend for the build. Backend init failure (no device,
/// denied output) degrades to the null bank rather than erroring.
pub fn create_bank(sound_dir: &std::path::Path) -> Box<dyn SoundBank> {
    #[cfg(feature = "audio")]
    {
        match kira_bank::KiraBank::new(sound_dir) {
            Some(bank) => return Box::new(bank),
            None => log::warn!("Audio backend unavailable, staying silent"),
        }
    }
    let _ = sound_dir;
    Box::new(NullBank)
}

#[cfg(feature = "audio")]
mod kira_bank {
    //! Kira-backed playback of the four static cues.

    use std::collections::HashMap;
    use std::path::Path;

    use kira::manager::backend::DefaultBackend;
    use kira::manager::{AudioManager, AudioManagerSettings};
    use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
    use kira::tween::Tween;
    use log::warn;

    use super::{Cue, SoundBank};
    use crate::config::sound_path;

    pub struct KiraBank {
        manager: AudioManager<DefaultBackend>,
        sounds: HashMap<Cue, StaticSoundData>,
        ambient: Option<StaticSoundHandle>,
    }

    impl KiraBank {
        /// None when the audio device cannot be opened; cues that fail to
        /// decode are simply absent from the bank.
        pub fn new(sound_dir: &Path) -> Option<Self> {
            let manager = match AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            {
                Ok(m) => m,
                Err(e) => {
                    warn!("Audio manager init failed: {}", e);
                    return None;
                }
            };

            let mut sounds = HashMap::new();
            for cue in [Cue::Ambient, Cue::Lock, Cue::Whoosh, Cue::Fireworks] {
                let path = sound_path(sound_dir, cue.file_stem());
                match StaticSoundData::from_file(&path) {
                    Ok(data) => {
                        sounds.insert(cue, data);
                    }
                    Err(e) => warn!("Sound {} unavailable: {}", path.display(), e),
                }
            }

            Some(Self { manager, sounds, ambient: None })
        }
    }

    impl SoundBank for KiraBank {
        fn play(&mut self, cue: Cue) {
            let Some(data) = self.sounds.get(&cue) else {
                return;
            };
            let data = if cue == Cue::Ambient {
                data.clone().loop_region(0.0..)
            } else {
                data.clone()
            };
            match self.manager.play(data) {
                Ok(handle) => {
                    if cue == Cue::Ambient {
                        // Restarting the bed replaces the old handle.
                        if let Some(mut old) = self.ambient.take() {
                            old.stop(Tween::default());
                        }
                        self.ambient = Some(handle);
                    }
                }
                Err(e) => warn!("Cue {:?} failed to play: {}", cue, e),
            }
        }

        fn stop_ambient(&mut self) {
            if let Some(mut handle) = self.ambient.take() {
                handle.stop(Tween::default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingBank {
        played: Arc<Mutex<Vec<Cue>>>,
        ambient_stops: Arc<Mutex<usize>>,
    }

    impl SoundBank for RecordingBank {
        fn play(&mut self, cue: Cue) {
            self.played.lock().unwrap().push(cue);
        }

        fn stop_ambient(&mut self) {
            *self.ambient_stops.lock().unwrap() += 1;
        }
    }

    #[test]
    fn transition_cue_map_matches_script() {
        assert_eq!(cue_for_transition(Stage::Begin, Stage::Vision), Some(Cue::Lock));
        assert_eq!(cue_for_transition(Stage::Vision, Stage::Growth), Some(Cue::Whoosh));
        assert_eq!(cue_for_transition(Stage::Growth, Stage::Launch), None);
        assert_eq!(cue_for_transition(Stage::Launch, Stage::Fireworks), Some(Cue::Fireworks));
        assert_eq!(cue_for_transition(Stage::Fireworks, Stage::Cta), None);
    }

    #[test]
    fn trigger_honors_sound_toggle() {
        let bank = RecordingBank::default();
        let played = Arc::clone(&bank.played);
        let mut trigger = SoundTrigger::new(Box::new(bank));

        // Disabled: transitions stay silent.
        trigger.on_stage_changed(Stage::Begin, Stage::Vision);
        assert!(played.lock().unwrap().is_empty());

        // Enabling starts the ambient bed; transitions now cue.
        trigger.set_enabled(true);
        trigger.on_stage_changed(Stage::Vision, Stage::Growth);
        assert_eq!(*played.lock().unwrap(), vec![Cue::Ambient, Cue::Whoosh]);
    }

    #[test]
    fn disabling_stops_the_ambient_bed() {
        let bank = RecordingBank::default();
        let stops = Arc::clone(&bank.ambient_stops);
        let mut trigger = SoundTrigger::new(Box::new(bank));

        trigger.set_enabled(true);
        trigger.set_enabled(false);
        assert_eq!(*stops.lock().unwrap(), 1);
    }

    #[test]
    fn cueless_transition_plays_nothing_even_when_enabled() {
        let bank = RecordingBank::default();
        let played = Arc::clone(&bank.played);
        let mut trigger = SoundTrigger::new(Box::new(bank));
        trigger.set_enabled(true);
        played.lock().unwrap().clear(); // drop the ambient start

        trigger.on_stage_changed(Stage::Growth, Stage::Launch);
        assert!(played.lock().unwrap().is_empty());
    }
}
