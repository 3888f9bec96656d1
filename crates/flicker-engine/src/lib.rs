pub mod api;
pub mod assets;
pub mod components;
pub mod core;
pub mod error;
pub mod flow;
pub mod input;
pub mod renderer;
pub mod runner;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::game::{EngineContext, Game, GameConfig};
pub use api::media::MediaDecoder;
pub use api::types::{AudioCommand, EntityId, MediaFrame, SoundEvent};
pub use assets::manifest::StoryManifest;
pub use assets::registry::{BackgroundInfo, BackgroundRegistry};
pub use assets::score::ScoreStore;
pub use components::entity::Entity;
pub use components::layer::RenderLayer;
pub use components::sprite::{AtlasId, BlendMode, SpriteComponent};
pub use core::clock::GameClock;
pub use core::fade::{FadeController, FadeMode, FadeSignal};
pub use core::scene::Scene;
pub use core::time::FixedTimestep;
pub use error::{MediaError, StoryError};
pub use flow::blink::{BlinkPhase, BlinkSequencer, BlinkSignal, BlinkTiming};
pub use flow::challenge::{ChallengeSession, InputValidator, Submission};
pub use flow::config::{FinaleMode, FlowConfig, RetryPolicy, SoundBank};
pub use flow::letters::LetterMap;
pub use flow::machine::{FlowEvent, FlowMachine, FlowState, LevelProgress, CUSTOM_DEBUG_PROBE};
pub use flow::slides::{CaptionLayout, Slide, SlideSequencer, SlideSignal};
pub use input::queue::{InputEvent, InputQueue, KEY_BACKSPACE, KEY_ENTER};
pub use renderer::viewport::{fit_rect, image_to_screen, screen_to_image, Rect};
pub use runner::GameRunner;
pub use systems::caption::FontConfig;
