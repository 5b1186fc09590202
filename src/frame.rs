//! Frame decode with placeholder fallback.
//!
//! A frame that fails to decode never fails the batch: the loader substitutes
//! a background-colored placeholder so the sequence stays fully populated and
//! playback never stalls on a single missing asset. Fetching goes through the
//! `FrameFetcher` seam so tests can count calls and inject failures without
//! touching disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use log::warn;

use crate::config::BACKGROUND;

/// Frame decode errors.
#[derive(Debug)]
pub enum FrameError {
    Io(String),
    Decode(String),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Io(e) => write!(f, "I/O error: {}", e),
            FrameError::Decode(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl std::error::Error for FrameError {}

/// One decoded frame, or a placeholder standing in for a failed fetch.
///
/// Pixel data is behind an `Arc`: frames are cloned into sequences and read
/// concurrently by the render path, never mutated after creation.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: Arc<RgbaImage>,
    placeholder: bool,
}

impl Frame {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels: Arc::new(pixels), placeholder: false }
    }

    /// 1x1 background-colored stand-in for a frame that failed to load.
    /// Cover-fit stretches it over the surface, so the failure degrades to a
    /// solid background rather than a stall or a stale frame.
    pub fn placeholder() -> Self {
        let mut img = RgbaImage::new(1, 1);
        img.put_pixel(0, 0, Rgba(BACKGROUND));
        Self { pixels: Arc::new(img), placeholder: true }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// Source of decoded frame images. Production reads from disk; tests inject
/// counting or failing implementations.
pub trait FrameFetcher: Send + Sync {
    fn fetch(&self, path: &Path) -> Result<RgbaImage, FrameError>;
}

/// Disk-backed fetcher decoding through the `image` crate (webp/png/jpeg).
#[derive(Debug, Default)]
pub struct DiskFetcher;

impl FrameFetcher for DiskFetcher {
    fn fetch(&self, path: &Path) -> Result<RgbaImage, FrameError> {
        let img = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(io) => FrameError::Io(format!("{}: {}", path.display(), io)),
            other => FrameError::Decode(format!("{}: {}", path.display(), other)),
        })?;
        Ok(img.to_rgba8())
    }
}

/// Fetch one frame, substituting a placeholder on failure.
pub fn fetch_or_placeholder(fetcher: &dyn FrameFetcher, path: &PathBuf) -> Frame {
    match fetcher.fetch(path) {
        Ok(pixels) => Frame::new(pixels),
        Err(e) => {
            warn!("Failed to load frame {}: {}", path.display(), e);
            Frame::placeholder()
        }
    }
}
