mod game;
mod reel;

pub use game::LamplightReel;
pub use reel::ScriptedReel;
