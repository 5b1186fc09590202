//! PEAK - staged promo sequence player library
//!
//! Core: frame cache/loader, playback engine, stage state machine.
//! The egui shell in `app` is a thin overlay around `shell::Shell`.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod content;
pub mod events;
pub mod frame;
pub mod player;
pub mod sequence;
pub mod shell;
pub mod sound;
pub mod stage;
pub mod surface;
pub mod ticker;
pub mod workers;

// Re-export commonly used types
pub use cache::{CacheEvent, FrameCache, LoadState};
pub use events::{AdvanceRequested, EventBus, PlaybackFinished, StageChanged, downcast_event};
pub use frame::{DiskFetcher, Frame, FrameFetcher};
pub use player::Player;
pub use sequence::Sequence;
pub use shell::Shell;
pub use stage::{Session, Stage};
pub use surface::{DrawSurface, PixelSurface, fit_cover, render_frame};
pub use ticker::{IntervalTicker, ManualTicker, Ticker};
