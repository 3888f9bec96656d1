use crate::flow::blink::{BlinkSequencer, BlinkTiming};
use crate::flow::letters::normalize;

/// Verdict for a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Match,
    Mismatch,
}

/// Collects typed characters for the challenge answer.
///
/// Only alphanumerics and the space are kept, uppercased on entry so the
/// echo shows exactly what will be judged.
#[derive(Debug, Clone, Default)]
pub struct InputValidator {
    buffer: String,
}

impl InputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a typed character if it is alphanumeric or a space.
    /// Everything else is discarded.
    pub fn append_char(&mut self, c: char) {
        if c.is_alphanumeric() || c == ' ' {
            self.buffer.extend(c.to_uppercase());
        }
    }

    /// Remove the last character, if any.
    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// The accumulated answer as typed (uppercased, spaces kept).
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Judge the buffer against a target phrase. Both sides are normalized
    /// (spaces stripped, uppercased); only exact equality matches.
    pub fn submit(&self, target: &str) -> Submission {
        if normalize(&self.buffer) == normalize(target) {
            Submission::Match
        } else {
            Submission::Mismatch
        }
    }
}

/// One attempt at one level: the target phrase, its blink presentation,
/// and the typed answer. Created fresh on every Challenge entry, including
/// retries, so nothing leaks between attempts.
#[derive(Debug, Clone)]
pub struct ChallengeSession {
    target: String,
    pub blink: BlinkSequencer,
    pub answer: InputValidator,
}

impl ChallengeSession {
    pub fn new(phrase: &str, timing: BlinkTiming, now: f64) -> Self {
        Self {
            target: phrase.to_string(),
            blink: BlinkSequencer::new(phrase, timing, now),
            answer: InputValidator::new(),
        }
    }

    /// The phrase this session is testing.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Judge the current answer buffer.
    pub fn submit(&self) -> Submission {
        self.answer.submit(&self.target)
    }
}
