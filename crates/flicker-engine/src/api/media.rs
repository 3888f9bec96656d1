use crate::api::types::MediaFrame;
use crate::error::MediaError;

/// Contract for cutscene media playback, implemented by the host.
///
/// The engine never decodes video. It polls the decoder once per tick while
/// a cutscene is active and tracks the returned frame handle. `Ok(None)`
/// means end of stream; a decode error is treated the same way.
pub trait MediaDecoder {
    /// Native frame rate of the media, in frames per second.
    fn frame_rate(&self) -> f32;

    /// Produce the next frame handle, or `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<MediaFrame>, MediaError>;

    /// Called once when playback begins.
    fn start(&mut self) {}

    /// Called once when playback ends, is skipped, or fails.
    fn stop(&mut self) {}
}
