mod game;

pub use game::Lamplight;
