//! Run termination from an analytic head position.
//!
//! There is no physical head. Its centre sits half a torso height plus a
//! neck length along the torso's up axis; the run ends once its lowest point
//! drops below a fixed threshold. This is a geometric approximation, not a
//! contact test.

use std::fmt;

use bevy::math::Vec2;
use teeter_core::config::CharacterConfig;
use teeter_core::types::Pose2;
use tracing::info;

/// Running until the head drops, then Fallen for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FallState {
    #[default]
    Running,
    Fallen,
}

impl fmt::Display for FallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::Fallen => "fallen",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallDetector {
    state: FallState,
    head_offset: f32,
    head_radius: f32,
    threshold: f32,
}

impl FallDetector {
    pub fn new(config: &CharacterConfig) -> Self {
        Self {
            state: FallState::Running,
            head_offset: config.body.torso.height() / 2.0 + config.fall.neck_length,
            head_radius: config.fall.head_radius,
            threshold: config.fall.threshold,
        }
    }

    pub const fn state(&self) -> FallState {
        self.state
    }

    pub fn is_fallen(&self) -> bool {
        self.state == FallState::Fallen
    }

    /// World position of the head centre for a torso pose.
    pub fn head_position(&self, torso: Pose2) -> Vec2 {
        torso.transform_point(Vec2::new(0.0, self.head_offset))
    }

    /// Height of the head's lowest point.
    pub fn head_bottom(&self, torso: Pose2) -> f32 {
        self.head_position(torso).y - self.head_radius
    }

    /// Evaluate one torso pose. Returns `true` on the Running → Fallen step.
    ///
    /// A non-finite pose counts as a fall.
    pub fn update(&mut self, torso: Pose2) -> bool {
        if self.is_fallen() {
            return false;
        }
        let bottom = self.head_bottom(torso);
        if bottom.is_finite() && bottom >= self.threshold {
            return false;
        }
        self.state = FallState::Fallen;
        info!(head_bottom = bottom, threshold = self.threshold, "fallen");
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
