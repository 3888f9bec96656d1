use glam::Vec2;
use std::collections::HashMap;

/// Canonical form of a phrase: spaces stripped, uppercased.
/// Both the blink sequence and submission matching use this form, so
/// "right   here" and "RIGHT HERE" are the same phrase.
pub fn normalize(phrase: &str) -> String {
    phrase
        .chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_uppercase)
        .collect()
}

/// The letters of a phrase in blink order (normalized, original order kept).
pub fn blink_letters(phrase: &str) -> Vec<char> {
    normalize(phrase).chars().collect()
}

/// Where each letter sits inside the challenge wall image, in image pixels.
///
/// Calibrated offline against the wall art (the debug probe exists to read
/// these off by clicking). Lookup is case-insensitive; a letter without an
/// entry simply gets no on-screen marker.
#[derive(Debug, Clone, Default)]
pub struct LetterMap {
    positions: HashMap<char, Vec2>,
}

impl LetterMap {
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Insert a letter position. The letter is stored uppercased.
    pub fn insert(&mut self, letter: char, pos: Vec2) {
        if let Some(up) = letter.to_uppercase().next() {
            self.positions.insert(up, pos);
        }
    }

    /// Position of a letter in wall-image pixels, if calibrated.
    pub fn get(&self, letter: char) -> Option<Vec2> {
        letter
            .to_uppercase()
            .next()
            .and_then(|up| self.positions.get(&up))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
