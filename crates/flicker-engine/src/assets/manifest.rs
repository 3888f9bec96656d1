use crate::error::StoryError;
use crate::flow::config::{FinaleMode, RetryPolicy};
use crate::flow::slides::CaptionLayout;
use serde::Deserialize;
use std::collections::HashMap;

/// Story manifest describing one game variant: backgrounds, screens,
/// decks, the challenge block, sound cues, and flow policy.
/// Loaded from a JSON document; all divergence between variants lives here.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryManifest {
    /// Background images available to slides and screens.
    pub backgrounds: Vec<BackgroundDescriptor>,
    /// The fixed screens every variant has.
    pub screens: ScreenSet,
    /// Slides shown between Menu and Dialogue.
    #[serde(default)]
    pub intro_deck: Vec<SlideDescriptor>,
    /// Optional slides shown after the finale.
    #[serde(default)]
    pub ending_deck: Option<Vec<SlideDescriptor>>,
    /// The blink-and-type challenge.
    pub challenge: ChallengeDescriptor,
    /// Sound cues by role ("theme", "select", "blip", "success", "failure").
    #[serde(default)]
    pub sounds: HashMap<String, SoundDescriptor>,
    /// Flow policy knobs.
    #[serde(default)]
    pub flow: FlowDescriptor,
}

/// Describes a single background image.
#[derive(Debug, Clone, Deserialize)]
pub struct BackgroundDescriptor {
    /// Name slides refer to (e.g. "cellar").
    pub name: String,
    /// Relative path to the image file.
    pub path: String,
    /// Image width in pixels.
    pub width: f32,
    /// Image height in pixels.
    pub height: f32,
}

/// The screens shared by every variant.
#[derive(Debug, Clone, Deserialize)]
pub struct ScreenSet {
    pub title: SlideDescriptor,
    pub menu: SlideDescriptor,
    pub dialogue: SlideDescriptor,
    pub success: SlideDescriptor,
    pub failure: SlideDescriptor,
}

/// One slide: a background name plus caption lines.
#[derive(Debug, Clone, Deserialize)]
pub struct SlideDescriptor {
    pub background: String,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub layout: CaptionLayout,
}

/// The challenge block: wall art, level phrases, letter calibration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeDescriptor {
    /// Background name of the letter wall.
    pub wall: String,
    /// One phrase per level, in level order.
    pub phrases: Vec<String>,
    /// Letter → (x, y) in wall-image pixels.
    #[serde(default)]
    pub letters: HashMap<String, [f32; 2]>,
    /// Blink cadence override; defaults to 1.2 s cycle / 0.8 s lit.
    #[serde(default)]
    pub blink: Option<BlinkDescriptor>,
}

/// Blink cadence as stored in the manifest.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BlinkDescriptor {
    pub cycle: f32,
    pub lit: f32,
}

/// Describes an audio cue.
#[derive(Debug, Clone, Deserialize)]
pub struct SoundDescriptor {
    /// Relative path to the audio file.
    pub path: String,
    /// Numeric event ID the host's audio player listens for.
    pub event_id: u32,
}

/// Flow policy: retry behavior, finale mode, fade speed, intro hold.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowDescriptor {
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub finale: FinaleMode,
    #[serde(default = "default_fade_step")]
    pub fade_step: i32,
    #[serde(default = "default_hold_seconds")]
    pub hold_seconds: f32,
}

impl Default for FlowDescriptor {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            finale: FinaleMode::default(),
            fade_step: default_fade_step(),
            hold_seconds: default_hold_seconds(),
        }
    }
}

fn default_fade_step() -> i32 {
    5
}

fn default_hold_seconds() -> f32 {
    2.0
}

impl StoryManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, StoryError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_manifest() {
        let json = r#"{
            "backgrounds": [
                { "name": "hall", "path": "hall.png", "width": 800, "height": 600 }
            ],
            "screens": {
                "title":    { "background": "hall", "lines": ["THE LAMPLIGHT HOUSE"], "layout": "center" },
                "menu":     { "background": "hall" },
                "dialogue": { "background": "hall", "lines": ["Watch the wall."] },
                "success":  { "background": "hall", "lines": ["YOU GOT OUT"] },
                "failure":  { "background": "hall", "lines": ["TRY AGAIN"] }
            },
            "challenge": {
                "wall": "hall",
                "phrases": ["go up"]
            }
        }"#;
        let manifest = StoryManifest::from_json(json).unwrap();
        assert_eq!(manifest.backgrounds.len(), 1);
        assert_eq!(manifest.challenge.phrases, vec!["go up"]);
        assert_eq!(manifest.screens.title.layout, CaptionLayout::Center);
        assert_eq!(manifest.screens.menu.layout, CaptionLayout::Bottom);
        assert!(manifest.intro_deck.is_empty());
        assert!(manifest.ending_deck.is_none());
        assert_eq!(manifest.flow.fade_step, 5);
        assert_eq!(manifest.flow.hold_seconds, 2.0);
    }

    #[test]
    fn parse_flow_and_sounds() {
        let json = r#"{
            "backgrounds": [
                { "name": "wall", "path": "wall.png", "width": 1024, "height": 768 }
            ],
            "screens": {
                "title":    { "background": "wall" },
                "menu":     { "background": "wall" },
                "dialogue": { "background": "wall" },
                "success":  { "background": "wall" },
                "failure":  { "background": "wall" }
            },
            "challenge": {
                "wall": "wall",
                "phrases": ["go up", "turn back"],
                "letters": { "G": [120.0, 300.0], "O": [180.0, 295.0] },
                "blink": { "cycle": 1.0, "lit": 0.6 }
            },
            "sounds": {
                "theme": { "path": "theme.ogg", "event_id": 1 },
                "blip":  { "path": "blip.wav", "event_id": 2 }
            },
            "flow": {
                "retry": { "restart_challenge": { "keep_progress": false } },
                "finale": "cutscene",
                "fade_step": 8,
                "hold_seconds": 1.5
            }
        }"#;
        let manifest = StoryManifest::from_json(json).unwrap();
        assert_eq!(manifest.sounds["theme"].event_id, 1);
        assert_eq!(manifest.challenge.letters.len(), 2);
        assert_eq!(manifest.challenge.blink.unwrap().lit, 0.6);
        assert_eq!(
            manifest.flow.retry,
            RetryPolicy::RestartChallenge { keep_progress: false }
        );
        assert_eq!(manifest.flow.finale, FinaleMode::Cutscene);
        assert_eq!(manifest.flow.fade_step, 8);
    }

    #[test]
    fn reject_malformed_json() {
        assert!(StoryManifest::from_json("{ not json").is_err());
    }
}
