/// Identifies which texture atlas a sprite belongs to.
///
/// Convention: atlas 0 is the caption font; story backgrounds follow in
/// manifest order. Games may reserve further slots (e.g. media frames).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AtlasId(pub u32);

impl AtlasId {
    /// Sentinel atlas the host renders as a flat placeholder surface.
    /// Substituted when a named background cannot be resolved.
    pub const PLACEHOLDER: AtlasId = AtlasId(u32::MAX);
}

/// Blend mode for sprite rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha blending (src-alpha, one-minus-src-alpha).
    #[default]
    Alpha,
    /// Additive blending, used for the lit-letter glow.
    Additive,
}

/// Sprite component — defines how an entity appears visually.
#[derive(Debug, Clone)]
pub struct SpriteComponent {
    /// Which atlas this sprite belongs to.
    pub atlas: AtlasId,
    /// Column in the atlas grid.
    pub col: f32,
    /// Row in the atlas grid.
    pub row: f32,
    /// Number of cells this sprite spans (1.0 = single cell).
    pub cell_span: f32,
    /// Opacity (0.0 = invisible, 1.0 = opaque).
    pub alpha: f32,
    /// Blend mode for rendering.
    pub blend: BlendMode,
}

impl Default for SpriteComponent {
    fn default() -> Self {
        Self {
            atlas: AtlasId(0),
            col: 0.0,
            row: 0.0,
            cell_span: 1.0,
            alpha: 1.0,
            blend: BlendMode::Alpha,
        }
    }
}

impl SpriteComponent {
    /// Sprite covering a whole single-image atlas (backgrounds, overlays).
    pub fn full_image(atlas: AtlasId) -> Self {
        Self {
            atlas,
            ..Default::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }
}
