use thiserror::Error;

/// Errors surfaced while loading story data or persisting progress.
#[derive(Error, Debug)]
pub enum StoryError {
    /// The manifest JSON could not be parsed.
    #[error("manifest parse error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// The manifest parsed but describes an unusable story.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Reading or writing the progress file failed.
    #[error("progress file error: {0}")]
    Progress(#[from] std::io::Error),
}

/// Errors reported by a media decoder during cutscene playback.
#[derive(Error, Debug)]
pub enum MediaError {
    /// The decoder could not produce the next frame.
    #[error("media decode failed: {0}")]
    Decode(String),

    /// The underlying media source disappeared mid-playback.
    #[error("media source unavailable: {0}")]
    SourceLost(String),
}
