use crate::assets::registry::BackgroundInfo;
use crate::core::fade::{FadeController, FadeSignal};
use serde::Deserialize;

/// Where a slide's caption block sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionLayout {
    Top,
    #[default]
    Bottom,
    Center,
}

/// One static screen: a background plus zero or more caption lines.
#[derive(Debug, Clone)]
pub struct Slide {
    pub background: BackgroundInfo,
    pub lines: Vec<String>,
    pub layout: CaptionLayout,
}

impl Slide {
    pub fn new(background: BackgroundInfo) -> Self {
        Self {
            background,
            lines: Vec::new(),
            layout: CaptionLayout::default(),
        }
    }

    pub fn with_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_layout(mut self, layout: CaptionLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Signal from [`SlideSequencer::on_fade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideSignal {
    /// Moved on to the next slide; its fade-in has begun.
    Advanced,
    /// The deck ran out.
    Exhausted,
}

/// Walks a deck of slides through the fade curtain.
///
/// Contract per slide: fade in, sit idle until an advance is requested,
/// fade out, then move on. Advance requests are accepted only while the
/// fade is idle, so clicks during a transition do nothing.
#[derive(Debug, Clone, Default)]
pub struct SlideSequencer {
    deck: Vec<Slide>,
    index: usize,
}

impl SlideSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a deck, reset to its first slide, and begin the fade-in.
    pub fn start(&mut self, deck: Vec<Slide>, fade: &mut FadeController) {
        if deck.is_empty() {
            log::warn!("slide deck is empty; it will exhaust immediately");
        }
        self.deck = deck;
        self.index = 0;
        fade.begin_rise();
    }

    /// Ask to move past the current slide. Ignored unless the fade is idle.
    /// Returns whether the request was accepted.
    pub fn request_advance(&self, fade: &mut FadeController) -> bool {
        if fade.is_idle() {
            fade.begin_fall();
            true
        } else {
            false
        }
    }

    /// Feed a fade completion through the walk. A finished fade-in parks
    /// the curtain; a finished fade-out steps the deck.
    pub fn on_fade(&mut self, signal: FadeSignal, fade: &mut FadeController) -> Option<SlideSignal> {
        match signal {
            FadeSignal::Cleared => {
                fade.set_idle();
                None
            }
            FadeSignal::Darkened => {
                self.index += 1;
                if self.index >= self.deck.len() {
                    Some(SlideSignal::Exhausted)
                } else {
                    fade.begin_rise();
                    Some(SlideSignal::Advanced)
                }
            }
            FadeSignal::HoldExpired => None,
        }
    }

    /// The slide currently on screen.
    pub fn current(&self) -> Option<&Slide> {
        self.deck.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deck.is_empty()
    }
}
