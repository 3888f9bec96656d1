use glam::Vec2;

/// Axis-aligned rectangle. `pos` is the top-left corner in screen units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.pos.x
            && point.x <= self.pos.x + self.size.x
            && point.y >= self.pos.y
            && point.y <= self.pos.y + self.size.y
    }
}

/// Destination rectangle for drawing an image inside a viewport:
/// aspect-preserving scale, centered, letterboxed on the shorter axis.
pub fn fit_rect(image_size: Vec2, viewport: Vec2) -> Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        // Degenerate image; cover the viewport rather than divide by zero
        return Rect::new(Vec2::ZERO, viewport);
    }
    let scale = (viewport.x / image_size.x).min(viewport.y / image_size.y);
    let size = image_size * scale;
    Rect::new((viewport - size) * 0.5, size)
}

/// Map a point in image pixels onto its fitted on-screen rectangle.
pub fn image_to_screen(point: Vec2, image_size: Vec2, dest: Rect) -> Vec2 {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return dest.center();
    }
    dest.pos + point / image_size * dest.size
}

/// Map an on-screen point back into image pixels. Inverse of
/// [`image_to_screen`] for points inside the rectangle.
pub fn screen_to_image(point: Vec2, image_size: Vec2, dest: Rect) -> Vec2 {
    if dest.size.x <= 0.0 || dest.size.y <= 0.0 {
        return Vec2::ZERO;
    }
    (point - dest.pos) / dest.size * image_size
}
