//! Recording [`PhysicsAdapter`] for controller tests.
//!
//! [`MockPhysics`] never integrates anything. It records every call, keeps
//! the last motor command per joint, and returns whatever poses and
//! velocities a test scripts. Individual link or joint creations can be made
//! to fail to exercise degraded-mode paths.

use std::collections::HashSet;

use bevy::math::Vec2;
use teeter_core::types::{MotorState, Pose2};
use teeter_physics::{JointDesc, JointHandle, LinkDesc, LinkHandle, PhysicsAdapter, PhysicsError};

// ---------------------------------------------------------------------------
// PhysicsCall
// ---------------------------------------------------------------------------

/// One recorded adapter call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsCall {
    CreateLink(LinkDesc),
    CreateJoint(JointDesc),
    RemoveLink(LinkHandle),
    Motor(JointHandle, MotorState),
    Impulse(LinkHandle, Vec2),
    AngularImpulse(LinkHandle, f32),
    Damping(LinkHandle, f32, f32),
    Step,
}

#[derive(Debug, Clone)]
struct MockLink {
    desc: LinkDesc,
    pose: Pose2,
    linear_velocity: Vec2,
    angular_velocity: f32,
    damping: (f32, f32),
}

#[derive(Debug, Clone)]
struct MockJoint {
    desc: JointDesc,
    motor: MotorState,
}

// ---------------------------------------------------------------------------
// MockPhysics
// ---------------------------------------------------------------------------

/// Adapter double that records calls and serves scripted state.
#[derive(Debug, Default)]
pub struct MockPhysics {
    links: Vec<Option<MockLink>>,
    joints: Vec<Option<MockJoint>>,
    calls: Vec<PhysicsCall>,
    steps: usize,
    link_attempts: usize,
    joint_attempts: usize,
    failing_links: HashSet<usize>,
    failing_joints: HashSet<usize>,
}

impl MockPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`th call to `create_revolute_joint` (0-based) fail.
    #[must_use]
    pub fn fail_joint_creation(mut self, n: usize) -> Self {
        self.failing_joints.insert(n);
        self
    }

    /// Make the `n`th call to `create_link` (0-based) fail.
    #[must_use]
    pub fn fail_link_creation(mut self, n: usize) -> Self {
        self.failing_links.insert(n);
        self
    }

    // -- Scripting --

    /// Overwrite a link's reported pose. Unknown links are ignored.
    pub fn set_link_pose(&mut self, link: LinkHandle, pose: Pose2) {
        if let Some(l) = self.link_mut(link) {
            l.pose = pose;
        }
    }

    /// Overwrite a link's reported velocities. Unknown links are ignored.
    pub fn set_link_velocity(&mut self, link: LinkHandle, linear: Vec2, angular: f32) {
        if let Some(l) = self.link_mut(link) {
            l.linear_velocity = linear;
            l.angular_velocity = angular;
        }
    }

    // -- Inspection --

    pub fn calls(&self) -> &[PhysicsCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn motor_calls(&self) -> impl Iterator<Item = (JointHandle, MotorState)> + '_ {
        self.calls.iter().filter_map(|call| match *call {
            PhysicsCall::Motor(joint, state) => Some((joint, state)),
            _ => None,
        })
    }

    /// Linear impulses applied to `link`, in order.
    pub fn impulses_on(&self, link: LinkHandle) -> Vec<Vec2> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                PhysicsCall::Impulse(l, impulse) if l == link => Some(impulse),
                _ => None,
            })
            .collect()
    }

    /// Angular impulses applied to `link`, in order.
    pub fn angular_impulses_on(&self, link: LinkHandle) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                PhysicsCall::AngularImpulse(l, impulse) if l == link => Some(impulse),
                _ => None,
            })
            .collect()
    }

    /// Last motor command sent to a live joint.
    pub fn motor(&self, joint: JointHandle) -> Option<MotorState> {
        self.joint(joint).map(|j| j.motor)
    }

    /// Current `(linear, angular)` damping of a live link.
    pub fn damping(&self, link: LinkHandle) -> Option<(f32, f32)> {
        self.link(link).map(|l| l.damping)
    }

    /// Descriptor a live link was created from.
    pub fn link_desc(&self, link: LinkHandle) -> Option<LinkDesc> {
        self.link(link).map(|l| l.desc)
    }

    /// Descriptor a live joint was created from.
    pub fn joint_desc(&self, joint: JointHandle) -> Option<JointDesc> {
        self.joint(joint).map(|j| j.desc)
    }

    /// Number of `step()` calls.
    pub const fn steps(&self) -> usize {
        self.steps
    }

    fn link(&self, link: LinkHandle) -> Option<&MockLink> {
        self.links.get(link.index()).and_then(Option::as_ref)
    }

    fn link_mut(&mut self, link: LinkHandle) -> Option<&mut MockLink> {
        self.links.get_mut(link.index()).and_then(Option::as_mut)
    }

    fn joint(&self, joint: JointHandle) -> Option<&MockJoint> {
        self.joints.get(joint.index()).and_then(Option::as_ref)
    }

    fn live_link(&self, link: LinkHandle) -> Result<&MockLink, PhysicsError> {
        self.link(link).ok_or(PhysicsError::UnknownLink(link))
    }

    fn set_motor(&mut self, joint: JointHandle, state: MotorState) -> Result<(), PhysicsError> {
        let slot = self
            .joints
            .get_mut(joint.index())
            .and_then(Option::as_mut)
            .ok_or(PhysicsError::UnknownJoint(joint))?;
        slot.motor = state;
        self.calls.push(PhysicsCall::Motor(joint, state));
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn handle_index(len: usize) -> u32 {
    len as u32
}

impl PhysicsAdapter for MockPhysics {
    fn create_link(&mut self, desc: &LinkDesc) -> Result<LinkHandle, PhysicsError> {
        let attempt = self.link_attempts;
        self.link_attempts += 1;
        self.calls.push(PhysicsCall::CreateLink(*desc));
        if self.failing_links.contains(&attempt) {
            return Err(PhysicsError::InvalidShape(desc.shape));
        }
        let handle = LinkHandle::new(handle_index(self.links.len()));
        self.links.push(Some(MockLink {
            desc: *desc,
            pose: desc.pose,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            damping: (0.0, 0.0),
        }));
        Ok(handle)
    }

    fn create_revolute_joint(&mut self, desc: &JointDesc) -> Result<JointHandle, PhysicsError> {
        let attempt = self.joint_attempts;
        self.joint_attempts += 1;
        self.calls.push(PhysicsCall::CreateJoint(*desc));
        self.live_link(desc.link_a)?;
        self.live_link(desc.link_b)?;
        if self.failing_joints.contains(&attempt) {
            return Err(PhysicsError::UnknownLink(desc.link_b));
        }
        let handle = JointHandle::new(handle_index(self.joints.len()));
        self.joints.push(Some(MockJoint {
            desc: *desc,
            motor: MotorState::Disabled,
        }));
        Ok(handle)
    }

    fn remove_link(&mut self, link: LinkHandle) -> Result<(), PhysicsError> {
        self.live_link(link)?;
        self.calls.push(PhysicsCall::RemoveLink(link));
        self.links[link.index()] = None;
        for slot in &mut self.joints {
            if slot
                .as_ref()
                .is_some_and(|j| j.desc.link_a == link || j.desc.link_b == link)
            {
                *slot = None;
            }
        }
        Ok(())
    }

    fn set_velocity_drive(
        &mut self,
        joint: JointHandle,
        target_velocity: f32,
        max_force: f32,
    ) -> Result<(), PhysicsError> {
        self.set_motor(joint, MotorState::velocity(target_velocity, max_force))
    }

    fn set_position_hold(
        &mut self,
        joint: JointHandle,
        target_angle: f32,
        stiffness: f32,
        damping: f32,
    ) -> Result<(), PhysicsError> {
        self.set_motor(joint, MotorState::hold(target_angle, stiffness, damping))
    }

    fn disable_motor(&mut self, joint: JointHandle) -> Result<(), PhysicsError> {
        self.set_motor(joint, MotorState::Disabled)
    }

    fn link_pose(&self, link: LinkHandle) -> Result<Pose2, PhysicsError> {
        self.live_link(link).map(|l| l.pose)
    }

    fn link_linear_velocity(&self, link: LinkHandle) -> Result<Vec2, PhysicsError> {
        self.live_link(link).map(|l| l.linear_velocity)
    }

    fn link_angular_velocity(&self, link: LinkHandle) -> Result<f32, PhysicsError> {
        self.live_link(link).map(|l| l.angular_velocity)
    }

    fn apply_impulse(&mut self, link: LinkHandle, impulse: Vec2) -> Result<(), PhysicsError> {
        self.live_link(link)?;
        self.calls.push(PhysicsCall::Impulse(link, impulse));
        Ok(())
    }

    fn apply_angular_impulse(
        &mut self,
        link: LinkHandle,
        impulse: f32,
    ) -> Result<(), PhysicsError> {
        self.live_link(link)?;
        self.calls.push(PhysicsCall::AngularImpulse(link, impulse));
        Ok(())
    }

    fn set_damping(
        &mut self,
        link: LinkHandle,
        linear: f32,
        angular: f32,
    ) -> Result<(), PhysicsError> {
        let slot = self.link_mut(link).ok_or(PhysicsError::UnknownLink(link))?;
        slot.damping = (linear, angular);
        self.calls.push(PhysicsCall::Damping(link, linear, angular));
        Ok(())
    }

    fn step(&mut self) {
        self.steps += 1;
        self.calls.push(PhysicsCall::Step);
    }

    fn link_count(&self) -> usize {
        self.links.iter().flatten().count()
    }

    fn joint_count(&self) -> usize {
        self.joints.iter().flatten().count()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use teeter_core::types::{JointLimits, LinkShape};
    use teeter_physics::{CollisionFilter, HingeAxis};

    fn desc() -> LinkDesc {
        LinkDesc {
            pose: Pose2::new(Vec2::new(0.0, -3.5), 0.0),
            shape: LinkShape::Box {
                width: 0.3,
                height: 0.6,
            },
            density: 1.0,
            friction: 0.9,
            filter: CollisionFilter::default(),
        }
    }

    fn joint(a: LinkHandle, b: LinkHandle) -> JointDesc {
        JointDesc {
            link_a: a,
            link_b: b,
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            limits: JointLimits::new(-1.0, 1.0).unwrap(),
            axis: HingeAxis::Forward,
        }
    }

    #[test]
    fn records_creation_and_reports_initial_pose() {
        let mut mock = MockPhysics::new();
        let link = mock.create_link(&desc()).unwrap();
        assert_eq!(mock.link_position(link).unwrap(), Vec2::new(0.0, -3.5));
        assert_eq!(mock.calls().len(), 1);
        assert_eq!(mock.link_count(), 1);
    }

    #[test]
    fn motor_state_tracks_last_command() {
        let mut mock = MockPhysics::new();
        let a = mock.create_link(&desc()).unwrap();
        let b = mock.create_link(&desc()).unwrap();
        let j = mock.create_revolute_joint(&joint(a, b)).unwrap();
        assert_eq!(mock.motor(j), Some(MotorState::Disabled));

        mock.set_velocity_drive(j, 6.0, 120.0).unwrap();
        assert_eq!(mock.motor(j), Some(MotorState::velocity(6.0, 120.0)));
        assert_eq!(mock.motor_calls().count(), 1);
    }

    #[test]
    fn scripted_failures() {
        let mut mock = MockPhysics::new().fail_joint_creation(1).fail_link_creation(2);
        let a = mock.create_link(&desc()).unwrap();
        let b = mock.create_link(&desc()).unwrap();
        assert!(mock.create_link(&desc()).is_err());
        assert!(mock.create_revolute_joint(&joint(a, b)).is_ok());
        assert!(mock.create_revolute_joint(&joint(a, b)).is_err());
        assert!(mock.create_revolute_joint(&joint(a, b)).is_ok());
        assert_eq!(mock.joint_count(), 2);
    }

    #[test]
    fn removal_invalidates_handles() {
        let mut mock = MockPhysics::new();
        let a = mock.create_link(&desc()).unwrap();
        let b = mock.create_link(&desc()).unwrap();
        let j = mock.create_revolute_joint(&joint(a, b)).unwrap();
        mock.remove_link(a).unwrap();

        assert_eq!(mock.link_pose(a), Err(PhysicsError::UnknownLink(a)));
        assert_eq!(mock.disable_motor(j), Err(PhysicsError::UnknownJoint(j)));
        assert_eq!(mock.joint_count(), 0);
        assert_eq!(mock.link_count(), 1);
    }

    #[test]
    fn scripted_pose_and_velocity() {
        let mut mock = MockPhysics::new();
        let a = mock.create_link(&desc()).unwrap();
        mock.set_link_pose(a, Pose2::new(Vec2::new(1.0, 2.0), 0.3));
        mock.set_link_velocity(a, Vec2::X, -0.5);
        assert!((mock.link_rotation(a).unwrap() - 0.3).abs() < f32::EPSILON);
        assert!((mock.link_angular_velocity(a).unwrap() + 0.5).abs() < f32::EPSILON);
        assert_eq!(mock.link_linear_velocity(a).unwrap(), Vec2::X);
    }

    #[test]
    fn impulses_are_filtered_by_link() {
        let mut mock = MockPhysics::new();
        let a = mock.create_link(&desc()).unwrap();
        let b = mock.create_link(&desc()).unwrap();
        mock.apply_impulse(a, Vec2::X).unwrap();
        mock.apply_impulse(b, Vec2::Y).unwrap();
        mock.apply_angular_impulse(a, 0.1).unwrap();
        assert_eq!(mock.impulses_on(a), vec![Vec2::X]);
        assert_eq!(mock.angular_impulses_on(a), vec![0.1]);
    }

    #[test]
    fn step_counts() {
        let mut mock = MockPhysics::new();
        mock.step();
        mock.step();
        assert_eq!(mock.steps(), 2);
        assert_eq!(mock.calls(), &[PhysicsCall::Step, PhysicsCall::Step]);
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn mock_is_send_sync() {
        assert_send_sync::<MockPhysics>();
    }
}
