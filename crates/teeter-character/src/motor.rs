//! Player-driven hip and knee motors.
//!
//! ```text
//! hip   held     → VelocityDrive(+max_velocity)  + gated thigh kick
//! hip   released → Disabled (free swing)
//! knee  held     → VelocityDrive(-max_velocity)  + gated calf kick
//! knee  released → PositionHold(knee_rest_angle, 2×k, 2×c)
//! ```
//!
//! Ankles and shoulders are never player-controlled.

use bevy::math::Vec2;
use teeter_core::config::{ImpulseConfig, MotorConfig};
use teeter_core::types::{ControlInputState, JointId, LinkId, MotorState, Side};
use teeter_physics::PhysicsAdapter;
use tracing::debug;

use crate::gate::{ImpulseGate, KickChannel};
use crate::skeleton::Skeleton;

/// Knee hold gains are this multiple of the nominal knee spring.
const KNEE_HOLD_SCALE: f32 = 2.0;

// ---------------------------------------------------------------------------
// JointMotorController
// ---------------------------------------------------------------------------

/// Maps [`ControlInputState`] to hip and knee motor commands.
#[derive(Debug, Clone, PartialEq)]
pub struct JointMotorController {
    max_velocity: f32,
    max_force: f32,
    knee_rest: MotorState,
    thigh_kick: Vec2,
    calf_kick: Vec2,
}

impl JointMotorController {
    pub fn new(motors: &MotorConfig, impulses: &ImpulseConfig) -> Self {
        Self {
            max_velocity: motors.max_velocity,
            max_force: motors.max_force,
            knee_rest: MotorState::hold(
                motors.knee_rest_angle,
                KNEE_HOLD_SCALE * motors.knee_stiffness,
                KNEE_HOLD_SCALE * motors.knee_damping,
            ),
            thigh_kick: Vec2::from_array(impulses.thigh_kick),
            calf_kick: Vec2::from_array(impulses.calf_kick),
        }
    }

    /// Hip command for a held or released drive input.
    pub const fn hip_command(&self, held: bool) -> MotorState {
        if held {
            MotorState::velocity(self.max_velocity, self.max_force)
        } else {
            MotorState::Disabled
        }
    }

    /// Knee command for a held or released extend input.
    pub const fn knee_command(&self, held: bool) -> MotorState {
        if held {
            MotorState::velocity(-self.max_velocity, self.max_force)
        } else {
            self.knee_rest
        }
    }

    /// Knee spring used whenever its extend input is released.
    pub const fn knee_rest(&self) -> MotorState {
        self.knee_rest
    }

    /// Apply one step of input. Returns the number of kicks fired.
    ///
    /// A kick needs the input held, the limb's gate channel open and the
    /// driving joint live; a failed joint leaves its limb fully passive.
    pub fn apply<P: PhysicsAdapter + ?Sized>(
        &self,
        adapter: &mut P,
        skeleton: &mut Skeleton,
        gate: &mut ImpulseGate,
        input: ControlInputState,
    ) -> u32 {
        let mut kicks = 0;
        for side in Side::BOTH {
            let hip_held = input.thigh_drive(side);
            let hip = JointId::hip(side);
            skeleton.set_motor(adapter, hip, self.hip_command(hip_held));
            if hip_held
                && skeleton.is_joint_live(hip)
                && self.kick(adapter, skeleton, gate, KickChannel::Thigh(side))
            {
                kicks += 1;
            }

            let knee_held = input.calf_extend(side);
            let knee = JointId::knee(side);
            skeleton.set_motor(adapter, knee, self.knee_command(knee_held));
            if knee_held
                && skeleton.is_joint_live(knee)
                && self.kick(adapter, skeleton, gate, KickChannel::Calf(side))
            {
                kicks += 1;
            }
        }
        kicks
    }

    fn kick<P: PhysicsAdapter + ?Sized>(
        &self,
        adapter: &mut P,
        skeleton: &Skeleton,
        gate: &mut ImpulseGate,
        channel: KickChannel,
    ) -> bool {
        let (link, impulse) = match channel {
            KickChannel::Thigh(side) => (LinkId::thigh(side), self.thigh_kick),
            KickChannel::Calf(side) => (LinkId::calf(side), self.calf_kick),
            KickChannel::ArmSwing => return false,
        };
        // A missing link must not burn the channel's period.
        if skeleton.link(link).is_none() || !gate.try_fire(channel) {
            return false;
        }
        if !skeleton.apply_impulse(adapter, link, impulse) {
            return false;
        }
        debug!(%link, ?impulse, "kick");
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use teeter_core::config::CharacterConfig;
    use teeter_test_utils::mocks::MockPhysics;

    use crate::skeleton::SkeletonLayout;

    fn setup(mock: &mut MockPhysics) -> (JointMotorController, Skeleton, ImpulseGate) {
        let config = CharacterConfig::default();
        let layout = SkeletonLayout::from_config(&config).unwrap();
        let skeleton = Skeleton::build(mock, &layout);
        mock.clear_calls();
        (
            JointMotorController::new(&config.motors, &config.impulses),
            skeleton,
            ImpulseGate::new(config.impulses.gate_period()),
        )
    }

    fn held(f: impl FnOnce(&mut ControlInputState)) -> ControlInputState {
        let mut input = ControlInputState::IDLE;
        f(&mut input);
        input
    }

    // ---- Commands ----

    #[test]
    fn hip_drive_and_release() {
        let ctl = JointMotorController::new(&MotorConfig::default(), &ImpulseConfig::default());
        assert_eq!(ctl.hip_command(true), MotorState::velocity(6.0, 120.0));
        assert_eq!(ctl.hip_command(false), MotorState::Disabled);
    }

    #[test]
    fn knee_extend_and_release() {
        let ctl = JointMotorController::new(&MotorConfig::default(), &ImpulseConfig::default());
        assert_eq!(ctl.knee_command(true), MotorState::velocity(-6.0, 120.0));
        assert_eq!(ctl.knee_command(false), MotorState::hold(0.1, 80.0, 8.0));
    }

    // ---- Apply ----

    #[test]
    fn held_hip_drives_and_kicks_thigh() {
        let mut mock = MockPhysics::new();
        let (ctl, mut skeleton, mut gate) = setup(&mut mock);

        let input = held(|i| i.left_thigh_drive = true);
        let kicks = ctl.apply(&mut mock, &mut skeleton, &mut gate, input);

        assert_eq!(kicks, 1);
        assert_eq!(
            skeleton.motor(JointId::LeftHip),
            MotorState::velocity(6.0, 120.0)
        );
        assert_eq!(skeleton.motor(JointId::RightHip), MotorState::Disabled);
        let thigh = skeleton.link(LinkId::LeftThigh).unwrap();
        assert_eq!(mock.impulses_on(thigh), vec![Vec2::new(0.6, 0.3)]);
    }

    #[test]
    fn kicks_gated_across_steps() {
        let mut mock = MockPhysics::new();
        let (ctl, mut skeleton, mut gate) = setup(&mut mock);
        let input = held(|i| i.right_calf_extend = true);

        let mut total = 0;
        for _ in 0..4 {
            gate.tick(Duration::from_millis(10));
            total += ctl.apply(&mut mock, &mut skeleton, &mut gate, input);
        }
        assert_eq!(total, 1);
        let calf = skeleton.link(LinkId::RightCalf).unwrap();
        assert_eq!(mock.impulses_on(calf), vec![Vec2::new(0.4, 0.2)]);
    }

    #[test]
    fn release_transitions_within_one_step() {
        let mut mock = MockPhysics::new();
        let (ctl, mut skeleton, mut gate) = setup(&mut mock);
        let both = held(|i| {
            i.left_thigh_drive = true;
            i.left_calf_extend = true;
        });
        ctl.apply(&mut mock, &mut skeleton, &mut gate, both);
        ctl.apply(&mut mock, &mut skeleton, &mut gate, ControlInputState::IDLE);

        assert_eq!(skeleton.motor(JointId::LeftHip), MotorState::Disabled);
        assert_eq!(skeleton.motor(JointId::LeftKnee), ctl.knee_rest());
        assert_eq!(
            skeleton.motor(JointId::LeftKnee).target_angle(),
            Some(MotorConfig::default().knee_rest_angle)
        );
    }

    #[test]
    fn steady_input_issues_no_repeat_commands() {
        let mut mock = MockPhysics::new();
        let (ctl, mut skeleton, mut gate) = setup(&mut mock);
        let input = held(|i| i.right_thigh_drive = true);

        ctl.apply(&mut mock, &mut skeleton, &mut gate, input);
        let first = mock.motor_calls().count();
        ctl.apply(&mut mock, &mut skeleton, &mut gate, input);
        assert_eq!(mock.motor_calls().count(), first);
    }

    #[test]
    fn failed_hip_neither_drives_nor_kicks() {
        let mut mock = MockPhysics::new().fail_joint_creation(JointId::LeftHip.index());
        let (ctl, mut skeleton, mut gate) = setup(&mut mock);
        let input = held(|i| i.left_thigh_drive = true);

        let kicks = ctl.apply(&mut mock, &mut skeleton, &mut gate, input);
        assert_eq!(kicks, 0);
        assert_eq!(skeleton.motor(JointId::LeftHip), MotorState::Disabled);
        let thigh = skeleton.link(LinkId::LeftThigh).unwrap();
        assert!(mock.impulses_on(thigh).is_empty());
        assert!(gate.is_open(KickChannel::Thigh(Side::Left)));
    }

    #[test]
    fn kick_fires_once_per_period_and_skips_missing_links() {
        let mut mock = MockPhysics::new().fail_link_creation(LinkId::LeftThigh.index());
        let (ctl, skeleton, mut gate) = setup(&mut mock);

        let left = KickChannel::Thigh(Side::Left);
        assert!(!ctl.kick(&mut mock, &skeleton, &mut gate, left));
        assert!(gate.is_open(left));

        let right = KickChannel::Thigh(Side::Right);
        assert!(ctl.kick(&mut mock, &skeleton, &mut gate, right));
        assert!(!gate.is_open(right));
        assert!(!ctl.kick(&mut mock, &skeleton, &mut gate, right));
        let thigh = skeleton.link(LinkId::RightThigh).unwrap();
        assert_eq!(mock.impulses_on(thigh).len(), 1);
    }

    #[test]
    fn ankles_and_shoulders_untouched() {
        let mut mock = MockPhysics::new();
        let (ctl, mut skeleton, mut gate) = setup(&mut mock);
        let all = held(|i| {
            i.left_thigh_drive = true;
            i.right_thigh_drive = true;
            i.left_calf_extend = true;
            i.right_calf_extend = true;
        });
        ctl.apply(&mut mock, &mut skeleton, &mut gate, all);
        for joint in [
            JointId::LeftAnkle,
            JointId::RightAnkle,
            JointId::LeftShoulder,
            JointId::RightShoulder,
        ] {
            assert_eq!(skeleton.motor(joint), MotorState::Disabled, "{joint}");
        }
    }
}
