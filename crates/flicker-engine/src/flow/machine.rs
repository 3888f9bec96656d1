use glam::Vec2;

use crate::api::game::EngineContext;
use crate::api::media::MediaDecoder;
use crate::api::types::{AudioCommand, MediaFrame, SoundEvent};
use crate::assets::registry::BackgroundInfo;
use crate::assets::score::ScoreStore;
use crate::core::clock::GameClock;
use crate::core::fade::{FadeController, FadeSignal};
use crate::flow::blink::{BlinkPhase, BlinkSignal};
use crate::flow::challenge::{ChallengeSession, Submission};
use crate::flow::config::{FinaleMode, FlowConfig, RetryPolicy};
use crate::flow::slides::{Slide, SlideSignal, SlideSequencer};
use crate::input::queue::{InputEvent, InputQueue, KEY_BACKSPACE, KEY_ENTER};
use crate::renderer::viewport::{fit_rect, screen_to_image};

/// Custom input `kind` that toggles the calibration probe.
pub const CUSTOM_DEBUG_PROBE: u32 = 1;

/// The screen the story is currently on. Exactly one is active;
/// transitions happen only inside [`FlowMachine::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Title card: fade in, hold, fade out, then the menu.
    Intro,
    /// Waiting for a click to start a run. Menu music loops here.
    Menu,
    /// The intro deck, one fade-gated slide at a time.
    Slideshow,
    /// Pre-challenge screen; a click begins the first level.
    Dialogue,
    /// Blink-and-type level. Input is live once the blinking ends.
    Challenge,
    /// Wrong answer screen; a click applies the retry policy.
    Failure,
    /// All levels cleared (success-screen finales).
    Success,
    /// Post-finale deck, then back to the menu.
    EndingSlideshow,
    /// Media playback finale; the loop runs at the media frame rate.
    Cutscene,
}

/// Notification pushed into the engine context for the host to observe.
/// The machine never reads these back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowEvent {
    StateChanged { from: FlowState, to: FlowState },
    ChallengeStarted { level: u32 },
    ChallengeResolved { level: u32, matched: bool },
    /// Calibration probe: a click mapped into background image pixels.
    DebugProbe { x: f32, y: f32 },
}

/// Which level the current run is on. Levels count from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    current: u32,
}

impl LevelProgress {
    pub fn new() -> Self {
        Self { current: 1 }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Index into the phrase list for the current level.
    pub fn index(&self) -> usize {
        (self.current - 1) as usize
    }

    pub fn advance(&mut self) {
        self.current += 1;
    }

    pub fn reset(&mut self) {
        self.current = 1;
    }

    /// Whether the current level is the last one.
    pub fn is_final(&self, total_levels: usize) -> bool {
        self.current as usize >= total_levels
    }
}

impl Default for LevelProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// The story driver: one state machine owning the fade curtain, the slide
/// decks, the challenge session, level progress, and the optional media
/// decoder. Games feed it input events and ticks; it answers with the
/// current screen, audio commands, and flow events.
///
/// Everything here is private to the machine and mutated only inside
/// `update`, which handles the frame's input first and advances timers
/// second. Events with no meaning in the current state are ignored.
pub struct FlowMachine {
    config: FlowConfig,
    state: FlowState,
    clock: GameClock,
    fade: FadeController,
    slides: SlideSequencer,
    challenge: Option<ChallengeSession>,
    progress: LevelProgress,
    decoder: Option<Box<dyn MediaDecoder>>,
    current_frame: Option<MediaFrame>,
    score: Option<ScoreStore>,
    /// Tick length the loop normally runs at.
    nominal_dt: f32,
    /// Tick length currently in effect (media rate during a cutscene).
    tick_dt: f32,
    debug_probe: bool,
    /// Screen size, for mapping probe clicks through the fitted rectangle.
    world: Vec2,
}

impl FlowMachine {
    pub fn new(config: FlowConfig, world: Vec2, fixed_dt: f32) -> Self {
        log::info!(
            "story ready: {} levels, {} intro slides, finale {:?}",
            config.phrases.len(),
            config.intro_deck.len(),
            config.finale
        );
        let mut fade = FadeController::new().with_hold_duration(config.hold_seconds);
        fade.begin_rise();
        Self {
            config,
            state: FlowState::Intro,
            clock: GameClock::new(),
            fade,
            slides: SlideSequencer::new(),
            challenge: None,
            progress: LevelProgress::new(),
            decoder: None,
            current_frame: None,
            score: None,
            nominal_dt: fixed_dt,
            tick_dt: fixed_dt,
            debug_probe: false,
            world,
        }
    }

    /// Install a progress store. Best completed level is persisted through it.
    pub fn with_score_store(mut self, score: ScoreStore) -> Self {
        self.score = Some(score);
        self
    }

    /// Install a media decoder for cutscene finales.
    pub fn with_decoder(mut self, decoder: Box<dyn MediaDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// One tick: advance the clock, handle this frame's input, then run
    /// whatever timers the current state owns. Input strictly precedes
    /// timers so a click and a timer expiry in the same frame resolve in
    /// a defined order.
    pub fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        self.clock.advance(self.tick_dt);
        let now = self.clock.now();

        for &event in input.iter() {
            self.handle_input(ctx, event, now);
        }
        self.advance_timers(ctx, now);
    }

    fn handle_input(&mut self, ctx: &mut EngineContext, event: InputEvent, now: f64) {
        if let InputEvent::Custom { kind, .. } = event {
            if kind == CUSTOM_DEBUG_PROBE {
                self.debug_probe = !self.debug_probe;
                log::debug!(
                    "calibration probe {}",
                    if self.debug_probe { "on" } else { "off" }
                );
                return;
            }
        }

        // The probe observes clicks, it does not consume them.
        if self.debug_probe {
            if let InputEvent::PointerDown { x, y } = event {
                self.report_probe(ctx, x, y);
            }
        }

        match self.state {
            FlowState::Intro => {
                log::trace!("ignored {event:?} during intro");
            }
            FlowState::Menu => match event {
                InputEvent::PointerDown { .. } if self.fade.is_idle() => self.start_run(ctx),
                _ => log::trace!("ignored {event:?} in menu"),
            },
            FlowState::Slideshow | FlowState::EndingSlideshow => match event {
                InputEvent::PointerDown { .. } => {
                    if self.slides.request_advance(&mut self.fade) {
                        self.play_once(ctx, self.config.sounds.blip);
                    }
                }
                _ => log::trace!("ignored {event:?} in slideshow"),
            },
            FlowState::Dialogue => match event {
                InputEvent::PointerDown { .. } if self.fade.is_idle() => {
                    self.begin_challenge(ctx, now)
                }
                _ => log::trace!("ignored {event:?} in dialogue"),
            },
            FlowState::Challenge => self.handle_challenge_input(ctx, event, now),
            FlowState::Failure => match event {
                InputEvent::PointerDown { .. } => self.retry(ctx, now),
                _ => log::trace!("ignored {event:?} on failure screen"),
            },
            FlowState::Success => match event {
                InputEvent::PointerDown { .. } => self.after_finale(ctx),
                _ => log::trace!("ignored {event:?} on success screen"),
            },
            FlowState::Cutscene => match event {
                // A click skips the remaining frames
                InputEvent::PointerDown { .. } => self.finish_cutscene(ctx),
                _ => log::trace!("ignored {event:?} during cutscene"),
            },
        }
    }

    /// Typing is live only once the blink sequence has finished; stray
    /// keys during the presentation must not leak into the answer.
    fn handle_challenge_input(&mut self, ctx: &mut EngineContext, event: InputEvent, now: f64) {
        let awaiting = self
            .challenge
            .as_ref()
            .map(|s| s.blink.phase() == BlinkPhase::AwaitingInput)
            .unwrap_or(false);

        match event {
            InputEvent::CharTyped { ch } if awaiting => {
                if let Some(session) = self.challenge.as_mut() {
                    session.answer.append_char(ch);
                }
            }
            InputEvent::KeyDown {
                key_code: KEY_BACKSPACE,
            } if awaiting => {
                if let Some(session) = self.challenge.as_mut() {
                    session.answer.backspace();
                }
            }
            InputEvent::KeyDown {
                key_code: KEY_ENTER,
            } if awaiting => self.submit_answer(ctx, now),
            _ => log::trace!("ignored {event:?} in challenge"),
        }
    }

    fn advance_timers(&mut self, ctx: &mut EngineContext, now: f64) {
        let step = self.config.fade_step;
        match self.state {
            FlowState::Intro => {
                if let Some(signal) = self.fade.advance(step, now) {
                    match signal {
                        FadeSignal::Cleared => self.fade.begin_hold(now),
                        FadeSignal::HoldExpired => self.fade.begin_fall(),
                        FadeSignal::Darkened => self.enter_menu(ctx),
                    }
                }
            }
            FlowState::Menu | FlowState::Dialogue => {
                if let Some(FadeSignal::Cleared) = self.fade.advance(step, now) {
                    self.fade.set_idle();
                }
            }
            FlowState::Slideshow => {
                if let Some(signal) = self.fade.advance(step, now) {
                    if let Some(SlideSignal::Exhausted) =
                        self.slides.on_fade(signal, &mut self.fade)
                    {
                        self.set_state(ctx, FlowState::Dialogue);
                        self.fade.begin_rise();
                    }
                }
            }
            FlowState::EndingSlideshow => {
                if let Some(signal) = self.fade.advance(step, now) {
                    if let Some(SlideSignal::Exhausted) =
                        self.slides.on_fade(signal, &mut self.fade)
                    {
                        self.enter_menu(ctx);
                    }
                }
            }
            FlowState::Challenge => {
                let signal = self.challenge.as_mut().and_then(|s| s.blink.tick(now));
                match signal {
                    Some(BlinkSignal::LetterLit(letter)) => {
                        log::trace!("letter {letter} lit");
                        self.play_once(ctx, self.config.sounds.blip);
                    }
                    Some(BlinkSignal::SequenceComplete) => {
                        log::debug!("blink sequence complete, awaiting answer");
                    }
                    None => {}
                }
            }
            FlowState::Cutscene => self.poll_media(ctx),
            FlowState::Failure | FlowState::Success => {}
        }
    }

    /// Menu entry point shared by every path that lands there.
    fn enter_menu(&mut self, ctx: &mut EngineContext) {
        self.set_state(ctx, FlowState::Menu);
        self.fade.begin_rise();
        if let Some(theme) = self.config.sounds.theme {
            ctx.emit_audio(AudioCommand::PlayLoop(theme));
        }
    }

    fn start_run(&mut self, ctx: &mut EngineContext) {
        if let Some(theme) = self.config.sounds.theme {
            ctx.emit_audio(AudioCommand::Stop(theme));
        }
        self.play_once(ctx, self.config.sounds.select);
        self.progress.reset();
        let deck = self.config.intro_deck.clone();
        if deck.is_empty() {
            log::warn!("intro deck is empty, going straight to dialogue");
            self.set_state(ctx, FlowState::Dialogue);
            self.fade.begin_rise();
            return;
        }
        self.set_state(ctx, FlowState::Slideshow);
        self.slides.start(deck, &mut self.fade);
    }

    /// Enter (or re-enter) Challenge with a fresh session for the current
    /// level. Nothing survives from a previous attempt.
    fn begin_challenge(&mut self, ctx: &mut EngineContext, now: f64) {
        let level = self.progress.current();
        let phrase = match self.config.phrases.get(self.progress.index()) {
            Some(p) => p.clone(),
            None => {
                log::warn!("no phrase configured for level {level}");
                return;
            }
        };
        self.challenge = Some(ChallengeSession::new(&phrase, self.config.blink, now));
        self.set_state(ctx, FlowState::Challenge);
        ctx.emit_event(FlowEvent::ChallengeStarted { level });
        log::debug!("level {level} challenge started");
    }

    fn submit_answer(&mut self, ctx: &mut EngineContext, now: f64) {
        let verdict = match &self.challenge {
            Some(session) if session.blink.phase() == BlinkPhase::AwaitingInput => {
                session.submit()
            }
            _ => return,
        };
        let level = self.progress.current();
        ctx.emit_event(FlowEvent::ChallengeResolved {
            level,
            matched: verdict == Submission::Match,
        });

        match verdict {
            Submission::Match => {
                self.play_once(ctx, self.config.sounds.success);
                self.persist_best(level);
                if self.progress.is_final(self.config.phrases.len()) {
                    self.challenge = None;
                    match self.config.finale {
                        FinaleMode::SuccessScreen => self.set_state(ctx, FlowState::Success),
                        FinaleMode::Cutscene => self.enter_cutscene(ctx),
                    }
                } else {
                    self.progress.advance();
                    self.begin_challenge(ctx, now);
                }
            }
            Submission::Mismatch => {
                self.play_once(ctx, self.config.sounds.failure);
                self.challenge = None;
                self.set_state(ctx, FlowState::Failure);
            }
        }
    }

    fn retry(&mut self, ctx: &mut EngineContext, now: f64) {
        match self.config.retry {
            RetryPolicy::ReturnToMenu => self.enter_menu(ctx),
            RetryPolicy::RestartChallenge { keep_progress } => {
                if !keep_progress {
                    self.progress.reset();
                }
                self.begin_challenge(ctx, now);
            }
        }
    }

    /// After Success or Cutscene: the ending deck if the variant has one,
    /// otherwise back to the menu.
    fn after_finale(&mut self, ctx: &mut EngineContext) {
        match self.config.ending_deck.clone() {
            Some(deck) if !deck.is_empty() => {
                self.set_state(ctx, FlowState::EndingSlideshow);
                self.slides.start(deck, &mut self.fade);
            }
            Some(_) => {
                log::warn!("ending deck is empty, returning to menu");
                self.enter_menu(ctx);
            }
            None => self.enter_menu(ctx),
        }
    }

    fn enter_cutscene(&mut self, ctx: &mut EngineContext) {
        if self.decoder.is_none() {
            log::warn!("cutscene finale with no media decoder installed, skipping");
            self.after_finale(ctx);
            return;
        }
        self.set_state(ctx, FlowState::Cutscene);
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.start();
            let rate = decoder.frame_rate();
            if rate > 0.0 {
                self.tick_dt = 1.0 / rate;
                ctx.request_tick_dt(self.tick_dt);
                log::debug!("cutscene running at {rate} fps");
            } else {
                log::warn!("media decoder reports frame rate {rate}, keeping nominal rate");
            }
        }
    }

    /// One frame of media per tick. End of stream and decode failure take
    /// the same exit; a failure is only louder in the log.
    fn poll_media(&mut self, ctx: &mut EngineContext) {
        let result = match self.decoder.as_mut() {
            Some(decoder) => decoder.next_frame(),
            None => return,
        };
        match result {
            Ok(Some(frame)) => self.current_frame = Some(frame),
            Ok(None) => {
                log::info!("media stream finished");
                self.finish_cutscene(ctx);
            }
            Err(err) => {
                log::warn!("media decode failed: {err}, treating as end of stream");
                self.finish_cutscene(ctx);
            }
        }
    }

    /// Every cutscene exit funnels through here. The tick rate is restored
    /// first; no exit path may leave the loop at the media rate.
    fn finish_cutscene(&mut self, ctx: &mut EngineContext) {
        self.tick_dt = self.nominal_dt;
        ctx.request_tick_dt(self.nominal_dt);
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.stop();
        }
        self.current_frame = None;
        self.after_finale(ctx);
    }

    fn persist_best(&mut self, level: u32) {
        if let Some(store) = self.score.as_mut() {
            if let Err(err) = store.record(level) {
                log::warn!("could not persist progress: {err}");
            }
        }
    }

    fn set_state(&mut self, ctx: &mut EngineContext, to: FlowState) {
        if self.state == to {
            return;
        }
        log::debug!("flow: {:?} -> {to:?}", self.state);
        ctx.emit_event(FlowEvent::StateChanged {
            from: self.state,
            to,
        });
        self.state = to;
    }

    fn report_probe(&self, ctx: &mut EngineContext, x: f32, y: f32) {
        if let Some(background) = self.current_background() {
            let dest = fit_rect(background.size, self.world);
            let image = screen_to_image(Vec2::new(x, y), background.size, dest);
            log::debug!(
                "probe: screen ({x:.0}, {y:.0}) -> image ({:.0}, {:.0})",
                image.x,
                image.y
            );
            ctx.emit_event(FlowEvent::DebugProbe {
                x: image.x,
                y: image.y,
            });
        }
    }

    fn play_once(&self, ctx: &mut EngineContext, cue: Option<SoundEvent>) {
        if let Some(sound) = cue {
            ctx.emit_audio(AudioCommand::PlayOnce(sound));
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn fade(&self) -> &FadeController {
        &self.fade
    }

    /// Monotonic story time in seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// The slide describing the current screen, if the state shows one.
    pub fn current_slide(&self) -> Option<&Slide> {
        match self.state {
            FlowState::Intro => Some(&self.config.title),
            FlowState::Menu => Some(&self.config.menu),
            FlowState::Dialogue => Some(&self.config.dialogue),
            FlowState::Success => Some(&self.config.success),
            FlowState::Failure => Some(&self.config.failure),
            FlowState::Slideshow | FlowState::EndingSlideshow => self.slides.current(),
            FlowState::Challenge | FlowState::Cutscene => None,
        }
    }

    /// The background to draw this tick. None during a cutscene, where the
    /// host draws the decoded frame instead.
    pub fn current_background(&self) -> Option<BackgroundInfo> {
        match self.state {
            FlowState::Challenge => Some(self.config.wall),
            FlowState::Cutscene => None,
            _ => self.current_slide().map(|slide| slide.background),
        }
    }

    pub fn challenge(&self) -> Option<&ChallengeSession> {
        self.challenge.as_ref()
    }

    /// The media frame currently on screen, if a cutscene is playing.
    pub fn current_frame(&self) -> Option<MediaFrame> {
        self.current_frame
    }

    pub fn level(&self) -> u32 {
        self.progress.current()
    }

    /// Best level ever completed, from the progress store. 0 without one.
    pub fn best_level(&self) -> u32 {
        self.score.as_ref().map(|s| s.best()).unwrap_or(0)
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Tick length currently in effect. Differs from the nominal length
    /// only while a cutscene is playing.
    pub fn tick_dt(&self) -> f32 {
        self.tick_dt
    }

    pub fn probe_active(&self) -> bool {
        self.debug_probe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::sprite::AtlasId;
    use crate::error::MediaError;
    use crate::flow::blink::BlinkTiming;
    use crate::flow::config::SoundBank;
    use crate::flow::letters::LetterMap;
    use std::cell::Cell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    fn slide(line: &str) -> Slide {
        Slide::new(BackgroundInfo {
            atlas: AtlasId(1),
            size: Vec2::new(800.0, 600.0),
        })
        .with_lines(vec![line.to_string()])
    }

    /// One-tick fades, zero hold, blink faster than the tick so the
    /// sequence finishes in a handful of updates.
    fn test_config() -> FlowConfig {
        FlowConfig {
            title: slide("TITLE"),
            menu: slide("MENU"),
            dialogue: slide("WATCH THE WALL"),
            success: slide("YOU WIN"),
            failure: slide("TRY AGAIN"),
            intro_deck: vec![slide("ONE"), slide("TWO")],
            ending_deck: None,
            wall: BackgroundInfo {
                atlas: AtlasId(2),
                size: Vec2::new(1600.0, 600.0),
            },
            letters: LetterMap::new(),
            phrases: vec!["go up".to_string(), "turn back".to_string()],
            blink: BlinkTiming {
                cycle: 0.01,
                lit: 0.005,
            },
            fade_step: 255,
            hold_seconds: 0.0,
            retry: RetryPolicy::ReturnToMenu,
            finale: FinaleMode::SuccessScreen,
            sounds: SoundBank::default(),
        }
    }

    fn machine_with(config: FlowConfig) -> (FlowMachine, EngineContext) {
        let machine = FlowMachine::new(config, Vec2::new(800.0, 600.0), DT);
        (machine, EngineContext::new())
    }

    fn tick(m: &mut FlowMachine, ctx: &mut EngineContext) {
        m.update(ctx, &InputQueue::new());
    }

    fn tick_n(m: &mut FlowMachine, ctx: &mut EngineContext, n: usize) {
        for _ in 0..n {
            tick(m, ctx);
        }
    }

    fn click(m: &mut FlowMachine, ctx: &mut EngineContext) {
        click_at(m, ctx, 400.0, 300.0);
    }

    fn click_at(m: &mut FlowMachine, ctx: &mut EngineContext, x: f32, y: f32) {
        let mut input = InputQueue::new();
        input.push(InputEvent::PointerDown { x, y });
        m.update(ctx, &input);
    }

    fn press(m: &mut FlowMachine, ctx: &mut EngineContext, key_code: u32) {
        let mut input = InputQueue::new();
        input.push(InputEvent::KeyDown { key_code });
        m.update(ctx, &input);
    }

    fn type_text(m: &mut FlowMachine, ctx: &mut EngineContext, text: &str) {
        let mut input = InputQueue::new();
        for ch in text.chars() {
            input.push(InputEvent::CharTyped { ch });
        }
        m.update(ctx, &input);
    }

    /// Intro is rise + hold + fall (one tick each at step 255), then the
    /// menu fade-in parks idle on the fourth tick.
    fn to_menu_idle(m: &mut FlowMachine, ctx: &mut EngineContext) {
        tick_n(m, ctx, 4);
        assert_eq!(m.state(), FlowState::Menu);
        assert!(m.fade().is_idle());
    }

    fn to_dialogue_idle(m: &mut FlowMachine, ctx: &mut EngineContext) {
        to_menu_idle(m, ctx);
        click(m, ctx); // slideshow, slide 0 idle
        assert_eq!(m.state(), FlowState::Slideshow);
        click(m, ctx); // fall + advance to slide 1
        tick(m, ctx); // slide 1 idle
        click(m, ctx); // fall + deck exhausted, dialogue fade-in begins
        assert_eq!(m.state(), FlowState::Dialogue);
        tick(m, ctx); // dialogue idle
        assert!(m.fade().is_idle());
    }

    fn to_challenge(m: &mut FlowMachine, ctx: &mut EngineContext) {
        to_dialogue_idle(m, ctx);
        click(m, ctx);
        assert_eq!(m.state(), FlowState::Challenge);
    }

    /// Blink through the presentation until typing goes live.
    fn finish_blinking(m: &mut FlowMachine, ctx: &mut EngineContext) {
        tick_n(m, ctx, 15);
        let session = m.challenge().expect("challenge session");
        assert_eq!(session.blink.phase(), BlinkPhase::AwaitingInput);
    }

    fn submit(m: &mut FlowMachine, ctx: &mut EngineContext, answer: &str) {
        finish_blinking(m, ctx);
        type_text(m, ctx, answer);
        press(m, ctx, KEY_ENTER);
    }

    #[test]
    fn intro_fades_through_hold_into_menu() {
        let (mut m, mut ctx) = machine_with(test_config());
        assert_eq!(m.state(), FlowState::Intro);
        assert_eq!(m.current_slide().unwrap().lines, vec!["TITLE"]);

        tick(&mut m, &mut ctx); // rise completes, hold starts
        assert_eq!(m.state(), FlowState::Intro);
        tick(&mut m, &mut ctx); // hold expires, fall starts
        tick(&mut m, &mut ctx); // fall completes, menu entered
        assert_eq!(m.state(), FlowState::Menu);
        assert!(ctx.events.contains(&FlowEvent::StateChanged {
            from: FlowState::Intro,
            to: FlowState::Menu,
        }));

        tick(&mut m, &mut ctx);
        assert!(m.fade().is_idle());
        assert_eq!(m.current_slide().unwrap().lines, vec!["MENU"]);
    }

    #[test]
    fn menu_click_is_gated_until_the_fade_parks() {
        let (mut m, mut ctx) = machine_with(test_config());
        tick_n(&mut m, &mut ctx, 3); // menu entered, still rising

        // This click lands before the fade is idle; handled first, so it
        // bounces even though the same update parks the fade.
        click(&mut m, &mut ctx);
        assert_eq!(m.state(), FlowState::Menu);

        click(&mut m, &mut ctx);
        assert_eq!(m.state(), FlowState::Slideshow);
    }

    #[test]
    fn slideshow_walks_the_deck_into_dialogue() {
        let (mut m, mut ctx) = machine_with(test_config());
        to_menu_idle(&mut m, &mut ctx);

        click(&mut m, &mut ctx);
        assert_eq!(m.state(), FlowState::Slideshow);
        assert_eq!(m.current_slide().unwrap().lines, vec!["ONE"]);

        click(&mut m, &mut ctx);
        tick(&mut m, &mut ctx);
        assert_eq!(m.current_slide().unwrap().lines, vec!["TWO"]);

        click(&mut m, &mut ctx);
        assert_eq!(m.state(), FlowState::Dialogue);
    }

    #[test]
    fn advance_requests_mid_fade_do_not_double_step() {
        let mut config = test_config();
        config.fade_step = 5; // real-speed fades for the gating check
        let (mut m, mut ctx) = machine_with(config);
        tick_n(&mut m, &mut ctx, 200);
        assert_eq!(m.state(), FlowState::Menu);
        assert!(m.fade().is_idle());

        click(&mut m, &mut ctx); // start run; slide 0 was already clear
        tick_n(&mut m, &mut ctx, 2);
        assert!(m.fade().is_idle());

        click(&mut m, &mut ctx); // accepted, fade-out begins
        click(&mut m, &mut ctx); // mid-fade, must bounce
        tick_n(&mut m, &mut ctx, 120); // fade out + fade in complete

        assert_eq!(m.state(), FlowState::Slideshow);
        assert_eq!(
            m.current_slide().unwrap().lines,
            vec!["TWO"],
            "one advance, not two"
        );
    }

    #[test]
    fn dialogue_click_starts_a_level_one_session() {
        let (mut m, mut ctx) = machine_with(test_config());
        to_challenge(&mut m, &mut ctx);

        assert_eq!(m.level(), 1);
        let session = m.challenge().expect("session");
        assert_eq!(session.target(), "go up");
        assert_eq!(session.answer.text(), "");
        assert_eq!(session.blink.letters(), &['G', 'O', 'U', 'P']);
        assert!(ctx
            .events
            .contains(&FlowEvent::ChallengeStarted { level: 1 }));
        assert_eq!(
            m.current_background().unwrap().atlas,
            AtlasId(2),
            "challenge shows the wall"
        );
    }

    #[test]
    fn typing_during_the_presentation_is_ignored() {
        let (mut m, mut ctx) = machine_with(test_config());
        to_challenge(&mut m, &mut ctx);

        type_text(&mut m, &mut ctx, "go up");
        press(&mut m, &mut ctx, KEY_BACKSPACE);
        let session = m.challenge().expect("session");
        assert_eq!(session.blink.phase(), BlinkPhase::Blinking);
        assert_eq!(session.answer.text(), "");

        // Enter during blinking must not resolve anything
        press(&mut m, &mut ctx, KEY_ENTER);
        assert_eq!(m.state(), FlowState::Challenge);
        assert!(!ctx
            .events
            .iter()
            .any(|e| matches!(e, FlowEvent::ChallengeResolved { .. })));
    }

    #[test]
    fn correct_answer_advances_to_a_fresh_session() {
        let (mut m, mut ctx) = machine_with(test_config());
        to_challenge(&mut m, &mut ctx);
        submit(&mut m, &mut ctx, "go up");

        assert_eq!(m.state(), FlowState::Challenge);
        assert_eq!(m.level(), 2);
        let session = m.challenge().expect("level 2 session");
        assert_eq!(session.target(), "turn back");
        assert_eq!(session.answer.text(), "", "typed input reset");
        assert_eq!(session.blink.phase(), BlinkPhase::Blinking);
        assert!(ctx.events.contains(&FlowEvent::ChallengeResolved {
            level: 1,
            matched: true,
        }));
        assert!(ctx
            .events
            .contains(&FlowEvent::ChallengeStarted { level: 2 }));
    }

    #[test]
    fn final_match_reaches_the_success_screen() {
        let (mut m, mut ctx) = machine_with(test_config());
        to_challenge(&mut m, &mut ctx);
        submit(&mut m, &mut ctx, "goup");
        submit(&mut m, &mut ctx, "TURN   BACK");

        assert_eq!(m.state(), FlowState::Success);
        assert!(m.challenge().is_none(), "session destroyed on exit");
        assert_eq!(m.current_slide().unwrap().lines, vec!["YOU WIN"]);
    }

    #[test]
    fn mismatch_lands_on_failure_then_the_menu() {
        let (mut m, mut ctx) = machine_with(test_config());
        to_challenge(&mut m, &mut ctx);
        submit(&mut m, &mut ctx, "go down");

        assert_eq!(m.state(), FlowState::Failure);
        assert!(m.challenge().is_none());
        assert!(ctx.events.contains(&FlowEvent::ChallengeResolved {
            level: 1,
            matched: false,
        }));

        click(&mut m, &mut ctx);
        assert_eq!(m.state(), FlowState::Menu);
    }

    #[test]
    fn restart_policy_can_reset_progress() {
        let mut config = test_config();
        config.retry = RetryPolicy::RestartChallenge {
            keep_progress: false,
        };
        let (mut m, mut ctx) = machine_with(config);
        to_challenge(&mut m, &mut ctx);
        submit(&mut m, &mut ctx, "go up"); // now level 2
        submit(&mut m, &mut ctx, "wrong"); // fail at level 2
        assert_eq!(m.state(), FlowState::Failure);

        click(&mut m, &mut ctx);
        assert_eq!(m.state(), FlowState::Challenge);
        assert_eq!(m.level(), 1);
        assert_eq!(m.challenge().unwrap().target(), "go up");
    }

    #[test]
    fn restart_policy_can_keep_progress() {
        let mut config = test_config();
        config.retry = RetryPolicy::RestartChallenge {
            keep_progress: true,
        };
        let (mut m, mut ctx) = machine_with(config);
        to_challenge(&mut m, &mut ctx);
        submit(&mut m, &mut ctx, "go up");
        submit(&mut m, &mut ctx, "wrong");

        click(&mut m, &mut ctx);
        assert_eq!(m.level(), 2);
        assert_eq!(m.challenge().unwrap().target(), "turn back");
    }

    #[test]
    fn success_click_plays_the_ending_deck_when_present() {
        let mut config = test_config();
        config.ending_deck = Some(vec![slide("EPILOGUE")]);
        let (mut m, mut ctx) = machine_with(config);
        to_challenge(&mut m, &mut ctx);
        submit(&mut m, &mut ctx, "go up");
        submit(&mut m, &mut ctx, "turn back");
        assert_eq!(m.state(), FlowState::Success);

        click(&mut m, &mut ctx);
        assert_eq!(m.state(), FlowState::EndingSlideshow);
        tick(&mut m, &mut ctx);
        assert_eq!(m.current_slide().unwrap().lines, vec!["EPILOGUE"]);

        click(&mut m, &mut ctx); // exhausts the single slide
        assert_eq!(m.state(), FlowState::Menu);
    }

    struct StubDecoder {
        rate: f32,
        frames_left: u32,
        next: u32,
        fail: bool,
        stopped: Rc<Cell<bool>>,
    }

    impl StubDecoder {
        fn new(rate: f32, frames: u32) -> (Self, Rc<Cell<bool>>) {
            let stopped = Rc::new(Cell::new(false));
            (
                Self {
                    rate,
                    frames_left: frames,
                    next: 0,
                    fail: false,
                    stopped: stopped.clone(),
                },
                stopped,
            )
        }
    }

    impl MediaDecoder for StubDecoder {
        fn frame_rate(&self) -> f32 {
            self.rate
        }

        fn next_frame(&mut self) -> Result<Option<MediaFrame>, MediaError> {
            if self.fail {
                return Err(MediaError::Decode("stub failure".to_string()));
            }
            if self.frames_left == 0 {
                return Ok(None);
            }
            self.frames_left -= 1;
            let frame = MediaFrame(self.next);
            self.next += 1;
            Ok(Some(frame))
        }

        fn stop(&mut self) {
            self.stopped.set(true);
        }
    }

    fn win_into_cutscene(m: &mut FlowMachine, ctx: &mut EngineContext) {
        to_challenge(m, ctx);
        submit(m, ctx, "go up");
        submit(m, ctx, "turn back");
        assert_eq!(m.state(), FlowState::Cutscene);
    }

    #[test]
    fn cutscene_switches_the_tick_length_and_skip_restores_it() {
        let mut config = test_config();
        config.finale = FinaleMode::Cutscene;
        let (decoder, stopped) = StubDecoder::new(24.0, 100);
        let (m, mut ctx) = machine_with(config);
        let mut m = m.with_decoder(Box::new(decoder));

        win_into_cutscene(&mut m, &mut ctx);
        assert_eq!(m.tick_dt(), 1.0 / 24.0);
        assert_eq!(ctx.take_tick_dt_request(), Some(1.0 / 24.0));
        // The entry tick already polled the first frame
        assert_eq!(m.current_frame(), Some(MediaFrame(0)));

        tick(&mut m, &mut ctx);
        assert_eq!(m.current_frame(), Some(MediaFrame(1)));

        click(&mut m, &mut ctx); // skip
        assert_eq!(m.state(), FlowState::Menu);
        assert_eq!(m.tick_dt(), DT);
        assert_eq!(ctx.take_tick_dt_request(), Some(DT));
        assert!(m.current_frame().is_none());
        assert!(stopped.get(), "decoder released on skip");
    }

    #[test]
    fn cutscene_ends_at_end_of_stream() {
        let mut config = test_config();
        config.finale = FinaleMode::Cutscene;
        let (decoder, stopped) = StubDecoder::new(30.0, 2);
        let (m, mut ctx) = machine_with(config);
        let mut m = m.with_decoder(Box::new(decoder));

        win_into_cutscene(&mut m, &mut ctx); // frame 0 pulled on entry
        tick(&mut m, &mut ctx); // frame 1
        assert_eq!(m.state(), FlowState::Cutscene);
        tick(&mut m, &mut ctx); // end of stream
        assert_eq!(m.state(), FlowState::Menu);
        assert_eq!(m.tick_dt(), DT);
        assert!(stopped.get());
    }

    #[test]
    fn decode_failure_exits_like_end_of_stream() {
        let mut config = test_config();
        config.finale = FinaleMode::Cutscene;
        let (mut decoder, _stopped) = StubDecoder::new(30.0, 10);
        decoder.fail = true;
        let (m, mut ctx) = machine_with(config);
        let mut m = m.with_decoder(Box::new(decoder));

        to_challenge(&mut m, &mut ctx);
        submit(&mut m, &mut ctx, "go up");
        // The entry tick's poll fails, so the cutscene exits immediately
        submit(&mut m, &mut ctx, "turn back");
        assert_eq!(m.state(), FlowState::Menu);
        assert_eq!(m.tick_dt(), DT, "tick length restored");
        assert_eq!(ctx.take_tick_dt_request(), Some(DT));
    }

    #[test]
    fn cutscene_without_a_decoder_is_skipped() {
        let mut config = test_config();
        config.finale = FinaleMode::Cutscene;
        let (mut m, mut ctx) = machine_with(config);
        to_challenge(&mut m, &mut ctx);
        submit(&mut m, &mut ctx, "go up");
        submit(&mut m, &mut ctx, "turn back");
        assert_eq!(m.state(), FlowState::Menu);
    }

    #[test]
    fn probe_maps_clicks_into_wall_pixels() {
        let (mut m, mut ctx) = machine_with(test_config());
        to_challenge(&mut m, &mut ctx);

        let mut input = InputQueue::new();
        input.push(InputEvent::Custom {
            kind: CUSTOM_DEBUG_PROBE,
            a: 0.0,
            b: 0.0,
            c: 0.0,
        });
        m.update(&mut ctx, &input);
        assert!(m.probe_active());

        // The 1600x600 wall fits 800x300 centered: screen (400, 300) is
        // image (800, 300).
        click_at(&mut m, &mut ctx, 400.0, 300.0);
        assert!(ctx
            .events
            .iter()
            .any(|e| matches!(e, FlowEvent::DebugProbe { x, y }
                if (*x - 800.0).abs() < 1e-3 && (*y - 300.0).abs() < 1e-3)));
    }

    #[test]
    fn sound_cues_follow_the_flow() {
        let mut config = test_config();
        config.sounds = SoundBank {
            theme: Some(SoundEvent(1)),
            select: Some(SoundEvent(2)),
            blip: Some(SoundEvent(3)),
            success: Some(SoundEvent(4)),
            failure: Some(SoundEvent(5)),
        };
        let (mut m, mut ctx) = machine_with(config);

        to_menu_idle(&mut m, &mut ctx);
        assert!(ctx.audio.contains(&AudioCommand::PlayLoop(SoundEvent(1))));

        ctx.audio.clear();
        click(&mut m, &mut ctx); // start run
        assert!(ctx.audio.contains(&AudioCommand::Stop(SoundEvent(1))));
        assert!(ctx.audio.contains(&AudioCommand::PlayOnce(SoundEvent(2))));

        ctx.audio.clear();
        click(&mut m, &mut ctx); // slide advance
        assert!(ctx.audio.contains(&AudioCommand::PlayOnce(SoundEvent(3))));

        tick(&mut m, &mut ctx);
        click(&mut m, &mut ctx); // exhaust deck
        tick(&mut m, &mut ctx);
        click(&mut m, &mut ctx); // into challenge
        ctx.audio.clear();
        submit(&mut m, &mut ctx, "nope");
        assert!(ctx.audio.contains(&AudioCommand::PlayOnce(SoundEvent(5))));
    }

    #[test]
    fn completed_levels_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress");

        let config = test_config();
        let (m, mut ctx) = machine_with(config);
        let mut m = m.with_score_store(ScoreStore::open(&path));

        to_challenge(&mut m, &mut ctx);
        submit(&mut m, &mut ctx, "go up");
        assert_eq!(m.best_level(), 1);
        submit(&mut m, &mut ctx, "turn back");
        assert_eq!(m.best_level(), 2);

        let reopened = ScoreStore::open(&path);
        assert_eq!(reopened.best(), 2);
    }

    #[test]
    fn empty_intro_deck_skips_to_dialogue() {
        let mut config = test_config();
        config.intro_deck.clear();
        let (mut m, mut ctx) = machine_with(config);
        to_menu_idle(&mut m, &mut ctx);

        click(&mut m, &mut ctx);
        assert_eq!(m.state(), FlowState::Dialogue);
    }

    #[test]
    fn unmapped_events_change_nothing() {
        let (mut m, mut ctx) = machine_with(test_config());
        to_menu_idle(&mut m, &mut ctx);

        let mut input = InputQueue::new();
        input.push(InputEvent::PointerMove { x: 1.0, y: 2.0 });
        input.push(InputEvent::PointerUp { x: 1.0, y: 2.0 });
        input.push(InputEvent::KeyUp { key_code: KEY_ENTER });
        input.push(InputEvent::CharTyped { ch: 'x' });
        m.update(&mut ctx, &input);

        assert_eq!(m.state(), FlowState::Menu);
    }
}
