pub mod clock;
pub mod fade;
pub mod scene;
pub mod time;
