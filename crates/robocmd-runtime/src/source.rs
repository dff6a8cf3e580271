//! [`InputSource`] – where remote snapshots come from.
//!
//! On hardware this is the serial receiver; in simulation it is a scripted
//! scenario.  `poll` is called once per tick and must not block.

use std::collections::VecDeque;

use robocmd_types::RemoteState;

pub trait InputSource {
    /// Frame received since the last poll, or `None` if the link was silent
    /// this tick.
    fn poll(&mut self) -> Option<RemoteState>;

    /// Whether the source will never produce another frame.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// A fixed queue of frames, one per tick; silent once drained.
#[derive(Debug, Default, Clone)]
pub struct QueuedInput {
    frames: VecDeque<Option<RemoteState>>,
}

impl QueuedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `frame` for `ticks` consecutive polls.
    pub fn push(&mut self, frame: RemoteState, ticks: u32) {
        for _ in 0..ticks {
            self.frames.push_back(Some(frame.clone()));
        }
    }

    /// Queue `ticks` polls with no frame (link silence).
    pub fn push_silence(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.frames.push_back(None);
        }
    }
}

impl InputSource for QueuedInput {
    fn poll(&mut self) -> Option<RemoteState> {
        self.frames.pop_front().flatten()
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}
