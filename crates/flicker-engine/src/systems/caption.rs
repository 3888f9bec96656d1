//! Bitmap font caption rendering.
//!
//! Captions ride the sprite pipeline: each character becomes an Entity with
//! a SpriteComponent pointing at a glyph in the font atlas. The atlas is a
//! grid of glyphs in ASCII order, 16 columns by 6 rows for printable ASCII.

use crate::api::types::EntityId;
use crate::components::entity::Entity;
use crate::components::layer::RenderLayer;
use crate::components::sprite::{AtlasId, BlendMode, SpriteComponent};
use crate::core::scene::Scene;
use crate::flow::slides::CaptionLayout;
use glam::Vec2;

/// Configuration for a bitmap font atlas.
#[derive(Debug, Clone)]
pub struct FontConfig {
    /// Which atlas contains the font glyphs.
    pub atlas: AtlasId,
    /// Number of columns in the font atlas grid.
    pub cols: u32,
    /// Number of rows in the font atlas grid.
    pub rows: u32,
    /// First ASCII code in the atlas (typically 32 = space).
    pub start_char: u8,
    /// Horizontal advance as a fraction of character size.
    pub spacing: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            atlas: AtlasId(0), // Convention: atlas 0 = font, backgrounds follow
            cols: 16,
            rows: 6,
            start_char: 32, // space
            spacing: 0.55,
        }
    }
}

impl FontConfig {
    pub fn new(atlas: AtlasId) -> Self {
        Self {
            atlas,
            ..Default::default()
        }
    }

    /// Set the grid dimensions.
    pub fn with_grid(mut self, cols: u32, rows: u32) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    /// Set the starting character (ASCII code).
    pub fn with_start_char(mut self, start_char: u8) -> Self {
        self.start_char = start_char;
        self
    }

    /// Set the character spacing.
    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }
}

/// Convert a character to grid coordinates (col, row) in the font atlas.
/// Returns `None` for characters outside the atlas range.
pub fn char_to_grid(c: char, font: &FontConfig) -> Option<(f32, f32)> {
    let ascii = c as u32;
    let start = font.start_char as u32;

    if ascii < start {
        return None;
    }

    let index = ascii - start;
    if index >= font.cols * font.rows {
        return None;
    }

    Some(((index % font.cols) as f32, (index / font.cols) as f32))
}

/// Advance-based width of a line at the given character size.
pub fn line_width(text: &str, size: f32, font: &FontConfig) -> f32 {
    text.chars().count() as f32 * size * font.spacing
}

/// Build character entities for one line of text.
///
/// `pos` is the top-left corner of the first character. Characters outside
/// the font range are skipped but still advance the cursor, so spacing is
/// preserved.
pub fn build_text_entities<F>(
    text: &str,
    pos: Vec2,
    size: f32,
    font: &FontConfig,
    tag: &str,
    id_gen: &mut F,
) -> Vec<Entity>
where
    F: FnMut() -> EntityId,
{
    let mut entities = Vec::new();
    let mut cursor_x = pos.x;

    for c in text.chars() {
        if let Some((col, row)) = char_to_grid(c, font) {
            let id = id_gen();
            let entity = Entity::new(id)
                .with_tag(tag)
                .with_pos(Vec2::new(cursor_x + size / 2.0, pos.y + size / 2.0))
                .with_scale(Vec2::splat(size))
                .with_layer(RenderLayer::Text)
                .with_sprite(SpriteComponent {
                    atlas: font.atlas,
                    col,
                    row,
                    cell_span: 1.0,
                    alpha: 1.0,
                    blend: BlendMode::Alpha,
                });
            entities.push(entity);
        }
        cursor_x += size * font.spacing;
    }

    entities
}

/// Build a multi-line caption block, each line centered horizontally,
/// the block placed per `layout` within a `world`-sized screen.
pub fn build_caption_block<F>(
    lines: &[String],
    layout: CaptionLayout,
    world: Vec2,
    size: f32,
    font: &FontConfig,
    tag: &str,
    id_gen: &mut F,
) -> Vec<Entity>
where
    F: FnMut() -> EntityId,
{
    let line_height = size * 1.5;
    let block_height = lines.len() as f32 * line_height;
    let margin = world.y * 0.08;

    let top = match layout {
        CaptionLayout::Top => margin,
        CaptionLayout::Center => (world.y - block_height) / 2.0,
        CaptionLayout::Bottom => world.y - margin - block_height,
    };

    let mut entities = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let x = (world.x - line_width(line, size, font)) / 2.0;
        let y = top + i as f32 * line_height;
        entities.extend(build_text_entities(
            line,
            Vec2::new(x, y),
            size,
            font,
            tag,
            id_gen,
        ));
    }
    entities
}

/// Despawn every entity carrying the given tag.
pub fn despawn_tagged(scene: &mut Scene, tag: &str) {
    let ids: Vec<EntityId> = scene
        .iter()
        .filter(|e| e.tag == tag)
        .map(|e| e.id)
        .collect();

    for id in ids {
        scene.despawn(id);
    }
}
