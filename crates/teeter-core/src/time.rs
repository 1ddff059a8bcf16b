use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SimTime
// ---------------------------------------------------------------------------

/// Integer-nanosecond simulation clock.
///
/// Every timed effect in the character (kick refractory periods, settling
/// phases) is measured against this clock rather than wall time, so a reset
/// invalidates them synchronously.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Resource,
)]
pub struct SimTime {
    nanos: u64,
}

impl SimTime {
    pub const ZERO: Self = Self { nanos: 0 };

    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_duration(duration: Duration) -> Self {
        Self {
            nanos: duration.as_nanos() as u64,
        }
    }

    #[must_use]
    pub const fn nanos(&self) -> u64 {
        self.nanos
    }

    #[must_use]
    pub const fn millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn secs_f32(&self) -> f32 {
        self.nanos as f32 / 1_000_000_000.0
    }

    #[must_use]
    pub const fn to_duration(&self) -> Duration {
        Duration::from_nanos(self.nanos)
    }

    /// Advance the clock by a [`Duration`].
    #[allow(clippy::cast_possible_truncation)]
    pub const fn advance(&mut self, duration: Duration) {
        self.nanos = self.nanos.saturating_add(duration.as_nanos() as u64);
    }

    pub const fn reset(&mut self) {
        self.nanos = 0;
    }
}

impl Add<Duration> for SimTime {
    type Output = Self;

    fn add(mut self, rhs: Duration) -> Self {
        self.advance(rhs);
        self
    }
}

impl AddAssign<Duration> for SimTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.advance(rhs);
    }
}

impl Sub for SimTime {
    type Output = Duration;

    /// Saturating: an earlier minus a later time is zero.
    fn sub(self, rhs: Self) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(rhs.nanos))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.nanos / 1_000_000_000;
        let millis = (self.nanos % 1_000_000_000) / 1_000_000;
        write!(f, "{secs}.{millis:03}s")
    }
}

// ---------------------------------------------------------------------------
// StepClock
// ---------------------------------------------------------------------------

/// Fixed-timestep accumulator for hosts that render at a variable rate.
///
/// ```ignore
/// clock.accumulate(frame_delta);
/// while clock.next_step() {
///     controller.step(&mut physics, input);
/// }
/// let alpha = clock.alpha(); // blend factor for rendering
/// ```
///
/// At most `max_steps` steps are dispensed per frame; surplus time is
/// dropped so a long stall cannot trigger a catch-up spiral.
#[derive(Debug, Clone)]
pub struct StepClock {
    time: SimTime,
    pending_nanos: u64,
    step_nanos: u64,
    max_steps: u32,
    steps_this_frame: u32,
}

impl StepClock {
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(step: Duration, max_steps: u32) -> Self {
        Self {
            time: SimTime::ZERO,
            pending_nanos: 0,
            step_nanos: step.as_nanos() as u64,
            max_steps,
            steps_this_frame: 0,
        }
    }

    /// Feed one frame's real elapsed time.
    #[allow(clippy::cast_possible_truncation)]
    pub fn accumulate(&mut self, frame: Duration) {
        self.pending_nanos = self.pending_nanos.saturating_add(frame.as_nanos() as u64);
        self.steps_this_frame = 0;
    }

    /// Consume one step if enough time is pending and the per-frame cap
    /// allows it. When the cap is hit, leftover whole steps are discarded.
    pub fn next_step(&mut self) -> bool {
        if self.step_nanos == 0 {
            return false;
        }
        if self.steps_this_frame >= self.max_steps {
            self.pending_nanos %= self.step_nanos;
            return false;
        }
        if self.pending_nanos < self.step_nanos {
            return false;
        }
        self.pending_nanos -= self.step_nanos;
        self.steps_this_frame += 1;
        self.time.advance(Duration::from_nanos(self.step_nanos));
        true
    }

    /// Fraction of the next step already accumulated, in `[0, 1)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn alpha(&self) -> f32 {
        if self.step_nanos == 0 {
            return 0.0;
        }
        (self.pending_nanos % self.step_nanos) as f32 / self.step_nanos as f32
    }

    /// Simulated time consumed so far.
    #[must_use]
    pub const fn time(&self) -> SimTime {
        self.time
    }

    #[must_use]
    pub const fn step(&self) -> Duration {
        Duration::from_nanos(self.step_nanos)
    }

    pub const fn reset(&mut self) {
        self.time.reset();
        self.pending_nanos = 0;
        self.steps_this_frame = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
