use flicker_engine::systems::caption::{
    build_caption_block, build_text_entities, char_to_grid, line_width,
};
use flicker_engine::*;
use glam::Vec2;

// ---- presentation tuning ----

const WORLD_WIDTH: f32 = 800.0;
const WORLD_HEIGHT: f32 = 600.0;
const FIXED_DT: f32 = 1.0 / 60.0;

/// Caption glyph size in world units.
const CAPTION_SIZE: f32 = 18.0;
/// Typed-answer echo glyph size.
const ECHO_SIZE: f32 = 24.0;
/// Small HUD text (level counter, best level).
const HUD_SIZE: f32 = 12.0;
/// Size of the glow drawn over the lit wall letter.
const MARKER_SIZE: f32 = 56.0;
/// The menu prompt and the answer cursor flash on a one second cycle.
const FLASH_PERIOD: f64 = 1.0;

const PROMPT: &str = "CLICK TO BEGIN";

/// Where the best-level record lives, relative to the working directory.
const PROGRESS_FILE: &str = "lamplight.best";

/// The story rides inside the binary; art and audio stay host-side.
const STORY: &str = include_str!("story.json");

/// A haunted-house story told in slides, with a letter-blink challenge
/// in the cellar. The flow machine owns the story; this struct only
/// turns its state into entities each tick.
pub struct Lamplight {
    machine: FlowMachine,
    font: FontConfig,
    curtain: BackgroundInfo,
    world: Vec2,
}

impl Lamplight {
    /// The shipping game: embedded story, on-disk best-level record.
    pub fn new() -> Result<Self, StoryError> {
        Self::build(STORY, Some(ScoreStore::open(PROGRESS_FILE)))
    }

    /// Build from a caller-supplied manifest without touching the disk.
    pub fn from_manifest(json: &str) -> Result<Self, StoryError> {
        Self::build(json, None)
    }

    fn build(json: &str, score: Option<ScoreStore>) -> Result<Self, StoryError> {
        let manifest = StoryManifest::from_json(json)?;
        let config = FlowConfig::from_manifest(&manifest)?;
        let registry = BackgroundRegistry::from_manifest(&manifest);
        let curtain = registry.resolve("black");

        let world = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT);
        let mut machine = FlowMachine::new(config, world, FIXED_DT);
        if let Some(score) = score {
            machine = machine.with_score_store(score);
        }

        Ok(Self {
            machine,
            font: FontConfig::default(),
            curtain,
            world,
        })
    }

    pub fn machine(&self) -> &FlowMachine {
        &self.machine
    }

    /// Rebuild the scene from the flow state. Runs every tick; the scene
    /// is cheap enough to throw away and redraw whole.
    fn sync_scene(&self, ctx: &mut EngineContext) {
        ctx.scene.clear();
        let now = self.machine.now();

        if let Some(background) = self.machine.current_background() {
            let dest = fit_rect(background.size, self.world);
            let id = ctx.next_id();
            ctx.scene.spawn(
                Entity::new(id)
                    .with_tag("backdrop")
                    .with_pos(dest.center())
                    .with_scale(dest.size)
                    .with_layer(RenderLayer::Backdrop)
                    .with_sprite(SpriteComponent::full_image(background.atlas)),
            );
        }

        if let Some(slide) = self.machine.current_slide() {
            let entities = build_caption_block(
                &slide.lines,
                slide.layout,
                self.world,
                CAPTION_SIZE,
                &self.font,
                "caption",
                &mut || ctx.next_id(),
            );
            spawn_all(ctx, entities);
        }

        match self.machine.state() {
            FlowState::Menu if self.machine.fade().is_idle() => self.sync_menu(ctx, now),
            FlowState::Challenge => self.sync_challenge(ctx, now),
            _ => {}
        }

        // The curtain sits above everything; skip it when fully clear.
        let alpha = self.machine.fade().alpha();
        if alpha > 0.0 {
            let id = ctx.next_id();
            ctx.scene.spawn(
                Entity::new(id)
                    .with_tag("curtain")
                    .with_pos(self.world * 0.5)
                    .with_scale(self.world)
                    .with_layer(RenderLayer::Curtain)
                    .with_sprite(SpriteComponent::full_image(self.curtain.atlas).with_alpha(alpha)),
            );
        }
    }

    fn sync_menu(&self, ctx: &mut EngineContext, now: f64) {
        if now % FLASH_PERIOD < FLASH_PERIOD / 2.0 {
            let prompt = [PROMPT.to_string()];
            let entities = build_caption_block(
                &prompt,
                CaptionLayout::Bottom,
                self.world,
                CAPTION_SIZE,
                &self.font,
                "prompt",
                &mut || ctx.next_id(),
            );
            spawn_all(ctx, entities);
        }

        let best = self.machine.best_level();
        if best > 0 {
            let text = format!("FARTHEST LAMP {best}");
            let pos = Vec2::new(
                self.world.x - line_width(&text, HUD_SIZE, &self.font) - 16.0,
                14.0,
            );
            let entities = build_text_entities(
                &text,
                pos,
                HUD_SIZE,
                &self.font,
                "best",
                &mut || ctx.next_id(),
            );
            spawn_all(ctx, entities);
        }
    }

    fn sync_challenge(&self, ctx: &mut EngineContext, now: f64) {
        let session = match self.machine.challenge() {
            Some(session) => session,
            None => return,
        };
        let wall = self.machine.config().wall;
        let dest = fit_rect(wall.size, self.world);

        // Glow over the wall letter while it is lit. Letters without a
        // calibrated position simply get no glow.
        if session.blink.is_lit(now) {
            if let Some(letter) = session.blink.current_letter() {
                if let Some(wall_pos) = self.machine.config().letters.get(letter) {
                    if let Some((col, row)) = char_to_grid(letter, &self.font) {
                        let id = ctx.next_id();
                        ctx.scene.spawn(
                            Entity::new(id)
                                .with_tag("marker")
                                .with_pos(image_to_screen(wall_pos, wall.size, dest))
                                .with_scale(Vec2::splat(MARKER_SIZE))
                                .with_layer(RenderLayer::Objects)
                                .with_sprite(SpriteComponent {
                                    atlas: self.font.atlas,
                                    col,
                                    row,
                                    cell_span: 1.0,
                                    alpha: 1.0,
                                    blend: BlendMode::Additive,
                                }),
                        );
                    }
                }
            }
        }

        // The typed answer, echoed at the bottom once input opens.
        if session.blink.phase() == BlinkPhase::AwaitingInput {
            let mut line = String::from("> ");
            line.push_str(session.answer.text());
            if now % FLASH_PERIOD < FLASH_PERIOD / 2.0 {
                line.push('_');
            }
            let lines = [line];
            let entities = build_caption_block(
                &lines,
                CaptionLayout::Bottom,
                self.world,
                ECHO_SIZE,
                &self.font,
                "echo",
                &mut || ctx.next_id(),
            );
            spawn_all(ctx, entities);
        }

        let text = format!("LEVEL {}", self.machine.level());
        let entities = build_text_entities(
            &text,
            Vec2::new(16.0, 14.0),
            HUD_SIZE,
            &self.font,
            "hud",
            &mut || ctx.next_id(),
        );
        spawn_all(ctx, entities);
    }
}

impl Game for Lamplight {
    fn config(&self) -> GameConfig {
        GameConfig {
            fixed_dt: FIXED_DT,
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        log::info!(
            "lamplight: {} levels, best so far {}",
            self.machine.config().phrases.len(),
            self.machine.best_level()
        );
        self.sync_scene(ctx);
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        self.machine.update(ctx, input);
        self.sync_scene(ctx);
    }
}

fn spawn_all(ctx: &mut EngineContext, entities: Vec<Entity>) {
    for entity in entities {
        ctx.scene.spawn(entity);
    }
}
