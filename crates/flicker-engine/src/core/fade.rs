/// What the fade curtain is currently doing.
///
/// Level 255 is fully dark, 0 is fully clear. `Idle` and `Holding` are
/// parked modes entered at level 0; the caller decides every mode change
/// except hold expiry, which the controller reports itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeMode {
    /// Level descends toward 0 (scene becoming visible).
    RisingToClear,
    /// Level climbs toward 255 (scene blacking out).
    FallingToDark,
    /// Parked; advance is a no-op.
    Idle,
    /// Parked at clear with a timer running.
    Holding,
}

/// Completion signal from [`FadeController::advance`].
/// Each segment signals exactly once; re-arming requires a `begin_*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeSignal {
    /// A rise reached level 0.
    Cleared,
    /// A fall reached level 255.
    Darkened,
    /// A hold ran past its configured duration.
    HoldExpired,
}

/// Full-screen fade curtain with an integer level in `[0, 255]`.
///
/// The controller only moves the level and reports segment completion;
/// what happens next (hold, reverse, park) is flow-machine policy.
#[derive(Debug, Clone)]
pub struct FadeController {
    level: i32,
    mode: FadeMode,
    hold_started: f64,
    hold_duration: f32,
    signaled: bool,
}

impl FadeController {
    /// New controller parked fully dark.
    pub fn new() -> Self {
        Self {
            level: 255,
            mode: FadeMode::Idle,
            hold_started: 0.0,
            hold_duration: 2.0,
            signaled: false,
        }
    }

    /// Set how long a hold lasts before `HoldExpired` fires.
    pub fn with_hold_duration(mut self, seconds: f32) -> Self {
        self.hold_duration = seconds;
        self
    }

    /// Start descending toward clear from the current level.
    pub fn begin_rise(&mut self) {
        self.mode = FadeMode::RisingToClear;
        self.signaled = false;
    }

    /// Start climbing toward dark from the current level.
    pub fn begin_fall(&mut self) {
        self.mode = FadeMode::FallingToDark;
        self.signaled = false;
    }

    /// Park at the current level with the hold timer running.
    pub fn begin_hold(&mut self, now: f64) {
        self.mode = FadeMode::Holding;
        self.hold_started = now;
        self.signaled = false;
    }

    /// Park at the current level. Advance becomes a no-op.
    pub fn set_idle(&mut self) {
        self.mode = FadeMode::Idle;
    }

    /// Move the level by `step` according to the current mode, clamping to
    /// `[0, 255]`. Returns a completion signal exactly once per segment.
    pub fn advance(&mut self, step: i32, now: f64) -> Option<FadeSignal> {
        match self.mode {
            FadeMode::Idle => None,
            FadeMode::RisingToClear => {
                self.level = (self.level - step).max(0);
                if self.level == 0 && !self.signaled {
                    self.signaled = true;
                    Some(FadeSignal::Cleared)
                } else {
                    None
                }
            }
            FadeMode::FallingToDark => {
                self.level = (self.level + step).min(255);
                if self.level == 255 && !self.signaled {
                    self.signaled = true;
                    Some(FadeSignal::Darkened)
                } else {
                    None
                }
            }
            FadeMode::Holding => {
                if now - self.hold_started >= self.hold_duration as f64 && !self.signaled {
                    self.signaled = true;
                    Some(FadeSignal::HoldExpired)
                } else {
                    None
                }
            }
        }
    }

    /// Current curtain level, 0 (clear) to 255 (dark).
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Curtain opacity as a 0.0..=1.0 alpha for an overlay sprite.
    pub fn alpha(&self) -> f32 {
        self.level as f32 / 255.0
    }

    pub fn mode(&self) -> FadeMode {
        self.mode
    }

    /// Whether the curtain is parked and the scene accepts advances.
    pub fn is_idle(&self) -> bool {
        self.mode == FadeMode::Idle
    }
}

impl Default for FadeController {
    fn default() -> Self {
        Self::new()
    }
}
