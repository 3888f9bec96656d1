/// Render layer — controls draw order for entities.
///
/// Layers are drawn back-to-front: Backdrop first, Curtain last.
/// The fade curtain sits above everything so blackouts cover text too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum RenderLayer {
    /// Full-screen background image or media frame.
    Backdrop = 0,
    /// Mid-scene decoration.
    Scenery = 1,
    /// Interactive markers (lit letters, probes).
    #[default]
    Objects = 2,
    /// Captions, prompts, and the typed-input echo.
    Text = 3,
    /// Fade curtain.
    Curtain = 4,
}

impl RenderLayer {
    /// Total number of render layers.
    pub const COUNT: usize = 5;

    /// Convert from a u8 value to a RenderLayer.
    /// Returns None if the value is out of range.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Backdrop),
            1 => Some(Self::Scenery),
            2 => Some(Self::Objects),
            3 => Some(Self::Text),
            4 => Some(Self::Curtain),
            _ => None,
        }
    }

    /// Convert to u8 for host-side sorting.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
