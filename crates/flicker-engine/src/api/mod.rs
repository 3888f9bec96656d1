pub mod game;
pub mod media;
pub mod types;
