//! Post-spawn settling schedule.
//!
//! ```text
//! reset ─► Initial ──(initial_ms)──► Relaxing ──(relaxing_ms)──► Normal
//!          stiff holds,              relaxed damping              nominal damping,
//!          heavy damping,                                         control handed off
//!          one-shot lift
//! ```
//!
//! Phases advance on simulated time passed in by the owner, so a reset that
//! drops the sequencer also drops every pending transition with it.

use std::fmt;
use std::time::Duration;

use bevy::math::Vec2;
use teeter_core::config::{CharacterConfig, StabilizationConfig};
use teeter_core::types::{JointId, LinkId, MotorState};
use teeter_physics::PhysicsAdapter;
use tracing::info;

use crate::skeleton::Skeleton;

// ---------------------------------------------------------------------------
// StabilizationPhase
// ---------------------------------------------------------------------------

/// Where the sequencer is. Only moves forward; only reset starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum StabilizationPhase {
    #[default]
    Initial,
    Relaxing,
    Normal,
}

impl fmt::Display for StabilizationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initial => "initial",
            Self::Relaxing => "relaxing",
            Self::Normal => "normal",
        })
    }
}

// ---------------------------------------------------------------------------
// StabilizationSequencer
// ---------------------------------------------------------------------------

/// Drives the skeleton from spawn to a settled stance.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizationSequencer {
    settings: StabilizationConfig,
    shoulder_rest: f32,
    knee_rest: MotorState,
    ankle_spring: MotorState,
    phase: StabilizationPhase,
    elapsed: Duration,
    impulses_pending: bool,
}

impl StabilizationSequencer {
    /// `knee_rest` is the knee hold handed to the motor controller at the
    /// end of the sequence.
    pub fn new(config: &CharacterConfig, knee_rest: MotorState) -> Self {
        let motors = &config.motors;
        Self {
            settings: config.stabilization.clone(),
            shoulder_rest: motors.shoulder_rest_angle,
            knee_rest,
            ankle_spring: MotorState::hold(0.0, motors.ankle_stiffness, motors.ankle_damping),
            phase: StabilizationPhase::Initial,
            elapsed: Duration::ZERO,
            impulses_pending: true,
        }
    }

    pub const fn phase(&self) -> StabilizationPhase {
        self.phase
    }

    /// Simulated time since the sequence started.
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// `true` once control has been handed off.
    pub fn is_settled(&self) -> bool {
        self.phase == StabilizationPhase::Normal
    }

    /// Stand-pose hold for `joint` while settling.
    pub const fn stand_hold(&self, joint: JointId) -> MotorState {
        let target = match joint {
            JointId::LeftKnee | JointId::RightKnee => self.settings.stand_knee_angle,
            JointId::LeftShoulder | JointId::RightShoulder => self.shoulder_rest,
            _ => 0.0,
        };
        MotorState::hold(
            target,
            self.settings.hold_stiffness,
            self.settings.hold_damping,
        )
    }

    /// Force the stand pose and heavy damping on a freshly built skeleton.
    pub fn engage<P: PhysicsAdapter + ?Sized>(&self, adapter: &mut P, skeleton: &mut Skeleton) {
        for joint in JointId::ALL {
            skeleton.set_motor(adapter, joint, self.stand_hold(joint));
        }
        Self::set_damping(
            adapter,
            skeleton,
            self.settings.torso_damping,
            self.settings.limb_damping,
        );
    }

    /// Advance by one step of simulated time.
    ///
    /// The first call applies the one-shot lift. Returns the phase entered
    /// during this call, if any.
    pub fn advance<P: PhysicsAdapter + ?Sized>(
        &mut self,
        adapter: &mut P,
        skeleton: &mut Skeleton,
        dt: Duration,
    ) -> Option<StabilizationPhase> {
        if self.impulses_pending {
            self.impulses_pending = false;
            skeleton.apply_impulse(
                adapter,
                LinkId::Torso,
                Vec2::from_array(self.settings.lift_impulse),
            );
            skeleton.apply_angular_impulse(
                adapter,
                LinkId::Torso,
                self.settings.corrective_angular_impulse,
            );
        }
        if self.is_settled() {
            return None;
        }

        self.elapsed += dt;
        let mut entered = None;
        if self.phase == StabilizationPhase::Initial
            && self.elapsed >= self.settings.initial_duration()
        {
            self.phase = StabilizationPhase::Relaxing;
            Self::set_damping(
                adapter,
                skeleton,
                self.settings.relaxed_torso_damping,
                self.settings.relaxed_limb_damping,
            );
            info!(elapsed = ?self.elapsed, "stabilization relaxing");
            entered = Some(self.phase);
        }
        if self.phase == StabilizationPhase::Relaxing
            && self.elapsed
                >= self.settings.initial_duration() + self.settings.relaxing_duration()
        {
            self.phase = StabilizationPhase::Normal;
            self.hand_off(adapter, skeleton);
            info!(elapsed = ?self.elapsed, "stabilization complete, control handed off");
            entered = Some(self.phase);
        }
        entered
    }

    fn hand_off<P: PhysicsAdapter + ?Sized>(&self, adapter: &mut P, skeleton: &mut Skeleton) {
        let nominal = self.settings.nominal_damping;
        Self::set_damping(adapter, skeleton, nominal, nominal);
        for joint in JointId::ALL {
            let state = match joint {
                JointId::LeftHip | JointId::RightHip => MotorState::Disabled,
                JointId::LeftKnee | JointId::RightKnee => self.knee_rest,
                JointId::LeftAnkle | JointId::RightAnkle => self.ankle_spring,
                // Balance takes the shoulders over from here.
                JointId::LeftShoulder | JointId::RightShoulder => continue,
            };
            skeleton.set_motor(adapter, joint, state);
        }
    }

    fn set_damping<P: PhysicsAdapter + ?Sized>(
        adapter: &mut P,
        skeleton: &Skeleton,
        torso: [f32; 2],
        limbs: [f32; 2],
    ) {
        for link in LinkId::ALL {
            let damping = if link == LinkId::Torso { torso } else { limbs };
            skeleton.set_damping(adapter, link, damping);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
