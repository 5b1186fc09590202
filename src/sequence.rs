//! Ordered frame sequences.
//!
//! A sequence is the fully loaded, immutable frame list for one stage. It is
//! built once by the cache and shared read-only (`Arc<Sequence>`) with the
//! playback engine.

use crate::frame::Frame;
use crate::stage::Stage;

/// The ordered set of frames belonging to one stage.
#[derive(Debug, Clone)]
pub struct Sequence {
    stage: Stage,
    frames: Vec<Frame>,
}

impl Sequence {
    pub fn new(stage: Stage, frames: Vec<Frame>) -> Self {
        Self { stage, frames }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at exact index.
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Frame with index wrapping (looping sequences) or clamping.
    pub fn idx(&self, i: isize, looping: bool) -> Option<&Frame> {
        if self.frames.is_empty() {
            return None;
        }
        let len = self.frames.len() as isize;
        let index = if looping {
            ((i % len) + len) % len
        } else {
            i.clamp(0, len - 1)
        };
        self.frames.get(index as usize)
    }

    /// Count of frames that loaded for real (not placeholders).
    pub fn loaded_count(&self) -> usize {
        self.frames.iter().filter(|f| !f.is_placeholder()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(n: usize) -> Sequence {
        Sequence::new(Stage::Begin, (0..n).map(|_| Frame::placeholder()).collect())
    }

    #[test]
    fn idx_wraps_when_looping() {
        let s = seq(3);
        assert!(s.idx(-1, true).is_some());
        assert!(s.idx(3, true).is_some());
        assert!(s.idx(10, true).is_some());
    }

    #[test]
    fn idx_clamps_when_not_looping() {
        let s = seq(3);
        // Same frame object as the boundary indices.
        assert!(std::ptr::eq(
            s.idx(5, false).unwrap().pixels(),
            s.get(2).unwrap().pixels()
        ));
        assert!(std::ptr::eq(
            s.idx(-2, false).unwrap().pixels(),
            s.get(0).unwrap().pixels()
        ));
    }

    #[test]
    fn empty_sequence_yields_nothing() {
        let s = Sequence::new(Stage::Begin, Vec::new());
        assert!(s.is_empty());
        assert!(s.idx(0, true).is_none());
    }
}
