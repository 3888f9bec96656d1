use crate::api::types::{AudioCommand, EntityId};
use crate::core::scene::Scene;
use crate::flow::machine::FlowEvent;
use crate::input::queue::InputQueue;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// World width in game units.
    pub world_width: f32,
    /// World height in game units.
    pub world_height: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            world_width: 800.0,
            world_height: 600.0,
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Setup initial state, spawn entities, configure the scene.
    fn init(&mut self, ctx: &mut EngineContext);

    /// The game loop tick. Process input, advance flow timers, sync entities.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);
}

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    pub scene: Scene,
    pub audio: Vec<AudioCommand>,
    pub events: Vec<FlowEvent>,
    next_id: u32,
    tick_dt: Option<f32>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            audio: Vec::new(),
            events: Vec::new(),
            next_id: 1,
            tick_dt: None,
        }
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Emit an audio command to be forwarded to the host's audio player.
    pub fn emit_audio(&mut self, command: AudioCommand) {
        self.audio.push(command);
    }

    /// Emit a flow event to be forwarded to the host.
    pub fn emit_event(&mut self, event: FlowEvent) {
        self.events.push(event);
    }

    /// Ask the host to run the game loop at a different tick length,
    /// in seconds per tick. Consumed by the runner at the end of the frame.
    pub fn request_tick_dt(&mut self, dt: f32) {
        self.tick_dt = Some(dt);
    }

    /// Take the pending tick-length request, if any.
    pub fn take_tick_dt_request(&mut self) -> Option<f32> {
        self.tick_dt.take()
    }

    /// Clear per-frame transient data (audio commands, flow events).
    pub fn clear_frame_data(&mut self) {
        self.audio.clear();
        self.events.clear();
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}
