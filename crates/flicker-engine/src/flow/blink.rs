use crate::flow::letters::blink_letters;

/// Blink cadence. One letter occupies `cycle` seconds; it is lit for the
/// first `lit` seconds of that and dark for the remainder.
#[derive(Debug, Clone, Copy)]
pub struct BlinkTiming {
    pub cycle: f32,
    pub lit: f32,
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self { cycle: 1.2, lit: 0.8 }
    }
}

/// Where the sequencer is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    /// Letters are still being presented.
    Blinking,
    /// All letters shown; the player may type and submit.
    AwaitingInput,
}

/// Signal from [`BlinkSequencer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkSignal {
    /// A letter just lit for the first time (cue a sound, move the marker).
    LetterLit(char),
    /// The final letter finished; phase is now AwaitingInput.
    SequenceComplete,
}

/// Presents a phrase one letter at a time on a fixed cadence.
///
/// The phrase is normalized up front (spaces stripped, uppercased); an
/// empty result reaches AwaitingInput on the first tick.
#[derive(Debug, Clone)]
pub struct BlinkSequencer {
    letters: Vec<char>,
    cursor: usize,
    phase: BlinkPhase,
    timing: BlinkTiming,
    /// Clock time the current letter started its cycle.
    cycle_started: f64,
    lit_reported: bool,
}

impl BlinkSequencer {
    pub fn new(phrase: &str, timing: BlinkTiming, now: f64) -> Self {
        Self {
            letters: blink_letters(phrase),
            cursor: 0,
            phase: BlinkPhase::Blinking,
            timing,
            cycle_started: now,
            lit_reported: false,
        }
    }

    /// Advance against the clock. At most one signal per tick; letter
    /// changes are a full cycle apart so nothing is lost at 60 Hz.
    pub fn tick(&mut self, now: f64) -> Option<BlinkSignal> {
        if self.phase == BlinkPhase::AwaitingInput {
            return None;
        }

        if self.letters.is_empty() {
            self.phase = BlinkPhase::AwaitingInput;
            return Some(BlinkSignal::SequenceComplete);
        }

        if now - self.cycle_started >= self.timing.cycle as f64 {
            self.cursor += 1;
            self.cycle_started = now;
            self.lit_reported = false;
            if self.cursor >= self.letters.len() {
                self.phase = BlinkPhase::AwaitingInput;
                return Some(BlinkSignal::SequenceComplete);
            }
        }

        if !self.lit_reported {
            self.lit_reported = true;
            return Some(BlinkSignal::LetterLit(self.letters[self.cursor]));
        }

        None
    }

    /// Whether the current letter is inside its lit window.
    pub fn is_lit(&self, now: f64) -> bool {
        self.phase == BlinkPhase::Blinking
            && self.cursor < self.letters.len()
            && now - self.cycle_started < self.timing.lit as f64
    }

    /// The letter currently being presented, if any.
    pub fn current_letter(&self) -> Option<char> {
        if self.phase == BlinkPhase::Blinking {
            self.letters.get(self.cursor).copied()
        } else {
            None
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    /// The full normalized letter sequence.
    pub fn letters(&self) -> &[char] {
        &self.letters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(seq: &mut BlinkSequencer, from: f64, to: f64) -> Vec<BlinkSignal> {
        let mut signals = Vec::new();
        let dt = 1.0 / 60.0;
        let mut now = from;
        while now <= to {
            if let Some(sig) = seq.tick(now) {
                signals.push(sig);
            }
            now += dt;
        }
        signals
    }

    #[test]
    fn presents_normalized_letters_in_order() {
        let mut seq = BlinkSequencer::new("go up", BlinkTiming::default(), 0.0);
        let signals = drive(&mut seq, 0.0, 6.0);

        let lit: Vec<char> = signals
            .iter()
            .filter_map(|s| match s {
                BlinkSignal::LetterLit(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(lit, vec!['G', 'O', 'U', 'P']);
        assert_eq!(*signals.last().unwrap(), BlinkSignal::SequenceComplete);
        assert_eq!(seq.phase(), BlinkPhase::AwaitingInput);
    }

    #[test]
    fn empty_phrase_completes_on_first_tick() {
        let mut seq = BlinkSequencer::new("   ", BlinkTiming::default(), 0.0);
        assert_eq!(seq.tick(0.0), Some(BlinkSignal::SequenceComplete));
        assert_eq!(seq.phase(), BlinkPhase::AwaitingInput);
        assert_eq!(seq.tick(1.0), None);
    }

    #[test]
    fn letter_is_lit_only_inside_the_lit_window() {
        let timing = BlinkTiming { cycle: 1.2, lit: 0.8 };
        let mut seq = BlinkSequencer::new("ab", timing, 0.0);
        seq.tick(0.0);

        assert!(seq.is_lit(0.0));
        assert!(seq.is_lit(0.79));
        assert!(!seq.is_lit(0.81), "past the lit window the letter is dark");
        assert_eq!(seq.current_letter(), Some('A'));

        // Cross into the second letter's cycle
        seq.tick(1.25);
        assert_eq!(seq.current_letter(), Some('B'));
        assert!(seq.is_lit(1.3));
    }

    #[test]
    fn cycle_timestamp_resets_on_advance() {
        let timing = BlinkTiming { cycle: 1.0, lit: 0.5 };
        let mut seq = BlinkSequencer::new("xy", timing, 0.0);
        seq.tick(0.0);

        // Advance happens late (tick at 1.4); the new cycle starts at 1.4,
        // not at the nominal 1.0 boundary.
        assert_eq!(seq.tick(1.4), Some(BlinkSignal::LetterLit('Y')));
        assert!(seq.is_lit(1.8));
        assert!(!seq.is_lit(2.0));
    }

    #[test]
    fn after_completion_ticks_are_quiet() {
        let mut seq = BlinkSequencer::new("a", BlinkTiming::default(), 0.0);
        let _ = drive(&mut seq, 0.0, 3.0);
        assert_eq!(seq.phase(), BlinkPhase::AwaitingInput);
        assert_eq!(seq.current_letter(), None);
        assert_eq!(seq.tick(10.0), None);
    }
}
