use crate::reel::ScriptedReel;
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
/// Small HUD text (reel counter, longest run).
const HUD_SIZE: f32 = 12.0;
/// Size of the glow drawn over the lit board letter.
const MARKER_SIZE: f32 = 48.0;
/// The menu prompt and the answer cursor flash on a one second cycle.
const FLASH_PERIOD: f64 = 1.0;

const PROMPT: &str = "NOW SHOWING - CLICK TO BEGIN";

// ---- the finale reel ----

/// Frames in the pre-rendered finale reel and its native rate.
const REEL_FRAME_COUNT: u32 = 96;
const REEL_FPS: f32 = 24.0;
/// The reel atlas is a grid of frames, this many per row.
const REEL_COLS: u32 = 8;
/// Pixel size of one reel frame.
const REEL_FRAME_SIZE: Vec2 = Vec2::new(640.0, 480.0);

/// Where the longest-run record lives, relative to the working directory.
const PROGRESS_FILE: &str = "lamplight-reel.best";

const STORY: &str = include_str!("story.json");

/// The extended cut of the lamplight story: a longer intro, an epilogue
/// deck, and a film-reel finale instead of a plain success screen.
pub struct LamplightReel {
    machine: FlowMachine,
    font: FontConfig,
    curtain: BackgroundInfo,
    /// Atlas slot the host loads the reel frames into, one past the
    /// last background.
    media_atlas: AtlasId,
    world: Vec2,
}

impl LamplightReel {
    /// The shipping game: embedded story, on-disk record, finale reel.
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
        let media_atlas = AtlasId(1 + registry.background_count());

        let world = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT);
        let mut machine = FlowMachine::new(config, world, FIXED_DT)
            .with_decoder(Box::new(ScriptedReel::new(REEL_FRAME_COUNT, REEL_FPS)));
        if let Some(score) = score {
            machine = machine.with_score_store(score);
        }

        Ok(Self {
            machine,
            font: FontConfig::default(),
            curtain,
            media_atlas,
            world,
        })
    }

    pub fn machine(&self) -> &FlowMachine {
        &self.machine
    }

    /// Rebuild the scene from the flow state. Runs every tick.
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
            FlowState::Cutscene => self.sync_reel(ctx),
            _ => {}
        }

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
            let text = format!("LONGEST RUN {best}");
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
        let board = self.machine.config().wall;
        let dest = fit_rect(board.size, self.world);

        if session.blink.is_lit(now) {
            if let Some(letter) = session.blink.current_letter() {
                if let Some(board_pos) = self.machine.config().letters.get(letter) {
                    if let Some((col, row)) = char_to_grid(letter, &self.font) {
                        let id = ctx.next_id();
                        ctx.scene.spawn(
                            Entity::new(id)
                                .with_tag("marker")
                                .with_pos(image_to_screen(board_pos, board.size, dest))
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

        let text = format!("REEL {}", self.machine.level());
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

    /// One reel frame fills the screen while the finale plays. Which cell
    /// of the reel atlas to show follows from the frame handle.
    fn sync_reel(&self, ctx: &mut EngineContext) {
        if let Some(frame) = self.machine.current_frame() {
            let dest = fit_rect(REEL_FRAME_SIZE, self.world);
            let id = ctx.next_id();
            ctx.scene.spawn(
                Entity::new(id)
                    .with_tag("reel")
                    .with_pos(dest.center())
                    .with_scale(dest.size)
                    .with_layer(RenderLayer::Backdrop)
                    .with_sprite(SpriteComponent {
                        atlas: self.media_atlas,
                        col: (frame.0 % REEL_COLS) as f32,
                        row: (frame.0 / REEL_COLS) as f32,
                        cell_span: 1.0,
                        alpha: 1.0,
                        blend: BlendMode::Alpha,
                    }),
            );
        }
    }
}

impl Game for LamplightReel {
    fn config(&self) -> GameConfig {
        GameConfig {
            fixed_dt: FIXED_DT,
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        log::info!(
            "lamplight-reel: {} levels, reel of {} frames at {} fps",
            self.machine.config().phrases.len(),
            REEL_FRAME_COUNT,
            REEL_FPS
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
