use clap::Parser;
use std::path::PathBuf;

// Audio backend info (compile-time)
#[cfg(feature = "audio")]
const AUDIO_BACKEND: &str = "kira 0.9 (cpal)";
#[cfg(not(feature = "audio"))]
const AUDIO_BACKEND: &str = "muted (build with --features audio)";

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Audio:  ", AUDIO_BACKEND, "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Staged promo sequence player
#[derive(Parser, Debug)]
#[command(version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Directory containing the stage-N frame folders
    #[arg(long = "frames", value_name = "DIR", default_value = "frames")]
    pub frames_root: PathBuf,

    /// Frame image format extension (webp, png, jpg)
    #[arg(long = "format", value_name = "EXT", default_value = "webp")]
    pub format: String,

    /// Directory containing the sound assets
    #[arg(long = "sounds", value_name = "DIR", default_value = "sounds")]
    pub sounds_root: PathBuf,

    /// Personalized greeting name for the call-to-action screen
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Content deck override (JSON)
    #[arg(long = "content", value_name = "FILE")]
    pub content: Option<PathBuf>,

    /// Start with sound enabled
    #[arg(short = 's', long = "sound")]
    pub sound: bool,

    /// Start in fullscreen mode
    #[arg(short = 'F', long = "fullscreen")]
    pub fullscreen: bool,

    /// Decode worker threads override
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
