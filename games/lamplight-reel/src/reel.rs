use flicker_engine::{MediaDecoder, MediaError, MediaFrame};

/// A film reel the host has already decoded into an atlas of frames.
///
/// There is no real codec here: the interesting part of the contract is
/// pacing (the engine ticks once per frame at the reel's rate), end of
/// stream, and rewinding for a replay, and this covers all three.
pub struct ScriptedReel {
    frames: u32,
    rate: f32,
    cursor: u32,
}

impl ScriptedReel {
    pub fn new(frames: u32, rate: f32) -> Self {
        Self {
            frames,
            rate,
            cursor: 0,
        }
    }
}

impl MediaDecoder for ScriptedReel {
    fn frame_rate(&self) -> f32 {
        self.rate
    }

    fn next_frame(&mut self) -> Result<Option<MediaFrame>, MediaError> {
        if self.cursor >= self.frames {
            return Ok(None);
        }
        let frame = MediaFrame(self.cursor);
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn start(&mut self) {
        self.cursor = 0;
    }
}
