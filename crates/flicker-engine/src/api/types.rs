/// Unique identifier for an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

/// A sound cue emitted by the game logic.
/// The numeric value maps to a game-defined sound in the host's audio player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct SoundEvent(pub u32);

/// Handle to a decoded media frame, assigned by the host's decoder.
/// The engine never inspects frame contents; it only tracks which frame
/// should currently be on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct MediaFrame(pub u32);

/// Fire-and-forget playback command for the host's audio player.
/// Nothing is ever read back from the audio side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCommand {
    /// Play the cue once.
    PlayOnce(SoundEvent),
    /// Start the cue looping until stopped.
    PlayLoop(SoundEvent),
    /// Stop a looping cue.
    Stop(SoundEvent),
}
