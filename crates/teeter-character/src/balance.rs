//! Shoulder counterbalance and reciprocal arm swing.
//!
//! Each step both shoulders are held at
//!
//! ```text
//! target = clamp(k1·θ + k2·ω + rest, shoulder limits)
//! ```
//!
//! where θ and ω are the torso's rotation and angular velocity. Once per
//! gate period the arm opposite the leading thigh is nudged forward and the
//! same-side arm backward.

use bevy::math::Vec2;
use teeter_core::config::CharacterConfig;
use teeter_core::error::ConfigError;
use teeter_core::types::{JointId, JointLimits, LinkId, MotorState, Side};
use teeter_physics::PhysicsAdapter;
use tracing::debug;

use crate::gate::{ImpulseGate, KickChannel};
use crate::skeleton::Skeleton;

// ---------------------------------------------------------------------------
// BalanceController
// ---------------------------------------------------------------------------

/// Torso-feedback shoulder controller.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceController {
    angle_gain: f32,
    rate_gain: f32,
    rest_angle: f32,
    limits: JointLimits,
    stiffness: f32,
    damping: f32,
    swing: f32,
}

/// What one balance update did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceOutput {
    /// Shoulder target applied to both arms.
    pub target: f32,
    /// Side of the leading thigh, if an arm swing fired.
    pub swing: Option<Side>,
}

impl BalanceController {
    pub fn new(config: &CharacterConfig) -> Result<Self, ConfigError> {
        let motors = &config.motors;
        let balance = &config.balance;
        Ok(Self {
            angle_gain: balance.angle_gain,
            rate_gain: balance.rate_gain,
            rest_angle: motors.shoulder_rest_angle,
            limits: config.body.limits(JointId::LeftShoulder)?,
            stiffness: balance.stiffness_scale * motors.shoulder_stiffness,
            damping: balance.damping_scale * motors.shoulder_damping,
            swing: config.impulses.arm_swing,
        })
    }

    /// Shoulder target for torso rotation `theta` and angular velocity
    /// `omega`, clamped to the shoulder limits.
    pub fn shoulder_target(&self, theta: f32, omega: f32) -> f32 {
        self.limits
            .clamp(self.angle_gain * theta + self.rate_gain * omega + self.rest_angle)
    }

    /// Motor state for both shoulders.
    pub const fn shoulder_command(&self, target: f32) -> MotorState {
        MotorState::hold(target, self.stiffness, self.damping)
    }

    /// Side whose thigh is strictly further forward, or `None` on a tie.
    pub fn leading_side(left_offset: f32, right_offset: f32) -> Option<Side> {
        if left_offset > right_offset {
            Some(Side::Left)
        } else if right_offset > left_offset {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Run one balance update against the post-step pose.
    ///
    /// Returns `None` when the torso cannot be read.
    pub fn apply<P: PhysicsAdapter + ?Sized>(
        &self,
        adapter: &mut P,
        skeleton: &mut Skeleton,
        gate: &mut ImpulseGate,
    ) -> Option<BalanceOutput> {
        let torso = skeleton.link(LinkId::Torso)?;
        let theta = adapter.link_rotation(torso).ok()?;
        let omega = adapter.link_angular_velocity(torso).ok()?;
        let torso_x = adapter.link_position(torso).ok()?.x;

        let target = self.shoulder_target(theta, omega);
        let command = self.shoulder_command(target);
        for side in Side::BOTH {
            skeleton.set_motor(adapter, JointId::shoulder(side), command);
        }

        let swing = if gate.try_fire(KickChannel::ArmSwing) {
            self.swing_arms(adapter, skeleton, torso_x)
        } else {
            None
        };

        Some(BalanceOutput { target, swing })
    }

    fn swing_arms<P: PhysicsAdapter + ?Sized>(
        &self,
        adapter: &mut P,
        skeleton: &Skeleton,
        torso_x: f32,
    ) -> Option<Side> {
        let left = skeleton.link_pose(&*adapter, LinkId::LeftThigh)?.position.x;
        let right = skeleton.link_pose(&*adapter, LinkId::RightThigh)?.position.x;
        let leading = Self::leading_side(left - torso_x, right - torso_x)?;

        let forward = Vec2::new(self.swing, 0.0);
        skeleton.apply_impulse(adapter, LinkId::arm(leading.opposite()), forward);
        skeleton.apply_impulse(adapter, LinkId::arm(leading), -forward);
        debug!(?leading, "arm swing");
        Some(leading)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
