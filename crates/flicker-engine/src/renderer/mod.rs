pub mod viewport;

pub use viewport::{fit_rect, image_to_screen, screen_to_image, Rect};
