//! Refractory timer for kick impulses.
//!
//! Each limb has its own channel. A channel fires at most once per period
//! no matter how many fixed steps happen in between, so kick frequency does
//! not scale with the step rate.

use std::time::Duration;

use teeter_core::types::Side;

// ---------------------------------------------------------------------------
// KickChannel
// ---------------------------------------------------------------------------

/// One independently gated impulse source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KickChannel {
    Thigh(Side),
    Calf(Side),
    /// Reciprocal arm swing (both arms share one channel).
    ArmSwing,
}

impl KickChannel {
    pub const COUNT: usize = 5;

    const fn index(self) -> usize {
        match self {
            Self::Thigh(Side::Left) => 0,
            Self::Thigh(Side::Right) => 1,
            Self::Calf(Side::Left) => 2,
            Self::Calf(Side::Right) => 3,
            Self::ArmSwing => 4,
        }
    }
}

// ---------------------------------------------------------------------------
// ImpulseGate
// ---------------------------------------------------------------------------

/// Per-channel cooldowns, advanced by simulated time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpulseGate {
    period: Duration,
    remaining: [Duration; KickChannel::COUNT],
}

impl ImpulseGate {
    /// All channels start open.
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            remaining: [Duration::ZERO; KickChannel::COUNT],
        }
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Advance every cooldown by one step.
    pub fn tick(&mut self, dt: Duration) {
        for remaining in &mut self.remaining {
            *remaining = remaining.saturating_sub(dt);
        }
    }

    pub fn is_open(&self, channel: KickChannel) -> bool {
        self.remaining[channel.index()].is_zero()
    }

    /// Fire `channel` if it is open, closing it for one period.
    pub fn try_fire(&mut self, channel: KickChannel) -> bool {
        if !self.is_open(channel) {
            return false;
        }
        self.remaining[channel.index()] = self.period;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
