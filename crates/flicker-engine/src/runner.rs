use crate::api::game::{EngineContext, Game, GameConfig};
use crate::core::time::FixedTimestep;
use crate::input::queue::{InputEvent, InputQueue};

/// Generic game loop driver.
///
/// The host pushes input events as they arrive and calls `tick` once per
/// display frame with the elapsed wall time; the runner turns that into
/// zero or more fixed steps and applies any tick-length change the game
/// requested for the following frames.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    timestep: FixedTimestep,
    config: GameConfig,
    initialized: bool,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        let timestep = FixedTimestep::new(config.fixed_dt);
        Self {
            game,
            ctx: EngineContext::new(),
            input: InputQueue::new(),
            timestep,
            config,
            initialized: false,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.config = self.game.config();
        self.timestep = FixedTimestep::new(self.config.fixed_dt);
        self.game.init(&mut self.ctx);
        self.initialized = true;
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame: zero or more fixed steps, then any tick-length change.
    ///
    /// Pending input is visible to the first step only and is drained
    /// before further steps run, so input handling completes before timers
    /// advance and nothing is handled twice. A frame too short to produce
    /// a step keeps the queue for the next frame.
    pub fn tick(&mut self, frame_dt: f32) {
        if !self.initialized {
            return;
        }

        self.ctx.clear_frame_data();

        let steps = self.timestep.accumulate(frame_dt);
        for step in 0..steps {
            self.game.update(&mut self.ctx, &self.input);
            if step == 0 {
                self.input.drain();
            }
        }

        if let Some(dt) = self.ctx.take_tick_dt_request() {
            if dt > 0.0 {
                self.timestep.set_dt(dt);
                log::debug!("tick length now {dt} s ({} Hz)", 1.0 / dt);
            } else {
                log::warn!("ignoring tick length request of {dt} s");
            }
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Tick length currently in effect.
    pub fn tick_dt(&self) -> f32 {
        self.timestep.dt()
    }
}
