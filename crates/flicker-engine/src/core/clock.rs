/// Monotonic game clock, advanced once per tick by the flow machine.
///
/// All timers read this clock instead of sampling wall time, so tests can
/// drive time synthetically by ticking.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameClock {
    now: f64,
}

impl GameClock {
    pub fn new() -> Self {
        Self { now: 0.0 }
    }

    /// Advance the clock by one tick's worth of time.
    pub fn advance(&mut self, dt: f32) {
        self.now += dt as f64;
    }

    /// Current time in seconds since the clock was created.
    pub fn now(&self) -> f64 {
        self.now
    }
}
