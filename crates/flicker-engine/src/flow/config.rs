use crate::api::types::SoundEvent;
use crate::assets::manifest::{SlideDescriptor, StoryManifest};
use crate::assets::registry::{BackgroundInfo, BackgroundRegistry};
use crate::error::StoryError;
use crate::flow::blink::BlinkTiming;
use crate::flow::letters::LetterMap;
use crate::flow::slides::Slide;
use glam::Vec2;
use serde::Deserialize;

/// What a click on the Failure screen leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Back to the menu; a new run starts from level 1.
    #[default]
    ReturnToMenu,
    /// Straight into a fresh challenge session. `keep_progress` decides
    /// whether the run resumes at the failed level or resets to level 1.
    RestartChallenge { keep_progress: bool },
}

/// What the final successful submission leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinaleMode {
    /// Show the success screen.
    #[default]
    SuccessScreen,
    /// Play a cutscene through the installed media decoder.
    Cutscene,
}

/// Sound cues by role. Any cue may be absent; absent cues are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoundBank {
    /// Menu music, looped.
    pub theme: Option<SoundEvent>,
    /// Menu click / run start.
    pub select: Option<SoundEvent>,
    /// Slide advance and letter blink.
    pub blip: Option<SoundEvent>,
    /// Correct submission.
    pub success: Option<SoundEvent>,
    /// Wrong submission.
    pub failure: Option<SoundEvent>,
}

/// Everything that differs between game variants. The flow machine itself
/// is shared; a variant is nothing more than one of these.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub title: Slide,
    pub menu: Slide,
    pub dialogue: Slide,
    pub success: Slide,
    pub failure: Slide,
    pub intro_deck: Vec<Slide>,
    pub ending_deck: Option<Vec<Slide>>,
    /// The challenge letter wall.
    pub wall: BackgroundInfo,
    /// Letter positions in wall-image pixels.
    pub letters: LetterMap,
    /// One phrase per level, level order.
    pub phrases: Vec<String>,
    pub blink: BlinkTiming,
    /// Fade level change per tick.
    pub fade_step: i32,
    /// How long the intro holds at clear before fading to the menu.
    pub hold_seconds: f32,
    pub retry: RetryPolicy,
    pub finale: FinaleMode,
    pub sounds: SoundBank,
}

impl FlowConfig {
    /// Resolve a parsed manifest into a runnable config.
    ///
    /// Background names that resolve to nothing get placeholders (the
    /// story must survive missing art); structural problems like an empty
    /// phrase list are hard errors.
    pub fn from_manifest(manifest: &StoryManifest) -> Result<Self, StoryError> {
        if manifest.challenge.phrases.is_empty() {
            return Err(StoryError::InvalidManifest(
                "challenge has no phrases".into(),
            ));
        }
        if manifest.flow.fade_step < 1 {
            return Err(StoryError::InvalidManifest(format!(
                "fade_step must be at least 1, got {}",
                manifest.flow.fade_step
            )));
        }

        let registry = BackgroundRegistry::from_manifest(manifest);
        let slide = |desc: &SlideDescriptor| Slide {
            background: registry.resolve(&desc.background),
            lines: desc.lines.clone(),
            layout: desc.layout,
        };

        let mut letters = LetterMap::new();
        for (key, pos) in &manifest.challenge.letters {
            match key.chars().next() {
                Some(c) => letters.insert(c, Vec2::new(pos[0], pos[1])),
                None => log::warn!("empty letter key in manifest, skipping"),
            }
        }

        let blink = manifest
            .challenge
            .blink
            .map(|b| BlinkTiming {
                cycle: b.cycle,
                lit: b.lit,
            })
            .unwrap_or_default();

        let cue = |role: &str| {
            manifest
                .sounds
                .get(role)
                .map(|desc| SoundEvent(desc.event_id))
        };

        Ok(Self {
            title: slide(&manifest.screens.title),
            menu: slide(&manifest.screens.menu),
            dialogue: slide(&manifest.screens.dialogue),
            success: slide(&manifest.screens.success),
            failure: slide(&manifest.screens.failure),
            intro_deck: manifest.intro_deck.iter().map(&slide).collect(),
            ending_deck: manifest
                .ending_deck
                .as_ref()
                .map(|deck| deck.iter().map(&slide).collect()),
            wall: registry.resolve(&manifest.challenge.wall),
            letters,
            phrases: manifest.challenge.phrases.clone(),
            blink,
            fade_step: manifest.flow.fade_step,
            hold_seconds: manifest.flow.hold_seconds,
            retry: manifest.flow.retry,
            finale: manifest.flow.finale,
            sounds: SoundBank {
                theme: cue("theme"),
                select: cue("select"),
                blip: cue("blip"),
                success: cue("success"),
                failure: cue("failure"),
            },
        })
    }
}
