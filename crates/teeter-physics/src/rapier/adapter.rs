//! Planar [`PhysicsAdapter`] over raw `rapier3d`.
//!
//! Links are dynamic bodies locked to the XY plane; joints are revolute
//! impulse joints hinged about ±Z. Handles index into slot tables so removed
//! entities leave a tombstone instead of shifting everyone else.

use bevy::math::{Vec2, Vec3};
use rapier3d::prelude::{
    ColliderBuilder, GenericJoint, ImpulseJointHandle, JointAxis, LockedAxes, MotorModel,
    RevoluteJointBuilder, RigidBody, RigidBodyBuilder, RigidBodyHandle,
};
use teeter_core::config::SimConfig;
use teeter_core::types::{LinkShape, Pose2, wrap_angle};
use tracing::debug;

use super::context::{RapierContext, interaction_groups};
use crate::backend::{HingeAxis, JointDesc, JointHandle, LinkDesc, LinkHandle, PhysicsAdapter};
use crate::error::PhysicsError;

/// Half thickness of box links along z.
const LINK_HALF_DEPTH: f32 = 0.1;

/// Velocity-gain factor for velocity drives; `max_force` bounds the result.
const DRIVE_GAIN: f32 = 10.0;

struct JointSlot {
    handle: ImpulseJointHandle,
    links: [LinkHandle; 2],
    axis: HingeAxis,
}

// ---------------------------------------------------------------------------
// RapierAdapter
// ---------------------------------------------------------------------------

/// Rapier-backed planar physics world.
pub struct RapierAdapter {
    context: RapierContext,
    links: Vec<Option<RigidBodyHandle>>,
    joints: Vec<Option<JointSlot>>,
}

impl RapierAdapter {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            context: RapierContext::new(config),
            links: Vec::new(),
            joints: Vec::new(),
        }
    }

    /// Underlying rapier state.
    pub const fn context(&self) -> &RapierContext {
        &self.context
    }

    /// Current joint angle, signed by the joint's [`HingeAxis`].
    pub fn joint_angle(&self, joint: JointHandle) -> Result<f32, PhysicsError> {
        let slot = self.joint_slot(joint)?;
        let a = self.link_rotation(slot.links[0])?;
        let b = self.link_rotation(slot.links[1])?;
        Ok(wrap_angle(b - a) * slot.axis.sign())
    }

    fn body_handle(&self, link: LinkHandle) -> Result<RigidBodyHandle, PhysicsError> {
        self.links
            .get(link.index())
            .copied()
            .flatten()
            .ok_or(PhysicsError::UnknownLink(link))
    }

    fn body(&self, link: LinkHandle) -> Result<&RigidBody, PhysicsError> {
        let handle = self.body_handle(link)?;
        self.context
            .rigid_body_set
            .get(handle)
            .ok_or(PhysicsError::UnknownLink(link))
    }

    fn body_mut(&mut self, link: LinkHandle) -> Result<&mut RigidBody, PhysicsError> {
        let handle = self.body_handle(link)?;
        self.context
            .rigid_body_set
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownLink(link))
    }

    fn joint_slot(&self, joint: JointHandle) -> Result<&JointSlot, PhysicsError> {
        self.joints
            .get(joint.index())
            .and_then(Option::as_ref)
            .ok_or(PhysicsError::UnknownJoint(joint))
    }

    fn joint_data_mut(&mut self, joint: JointHandle) -> Result<&mut GenericJoint, PhysicsError> {
        let handle = self.joint_slot(joint)?.handle;
        self.context
            .impulse_joint_set
            .get_mut(handle, true)
            .map(|j| &mut j.data)
            .ok_or(PhysicsError::UnknownJoint(joint))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn next_handle(len: usize) -> u32 {
    len as u32
}

fn collider_for(shape: LinkShape) -> ColliderBuilder {
    match shape {
        LinkShape::Box { width, height } => {
            ColliderBuilder::cuboid(width / 2.0, height / 2.0, LINK_HALF_DEPTH)
        }
        LinkShape::Capsule { radius, length } => {
            ColliderBuilder::capsule_y((length / 2.0 - radius).max(0.0), radius)
        }
    }
}

fn to_vec3(v: Vec2) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

impl PhysicsAdapter for RapierAdapter {
    fn create_link(&mut self, desc: &LinkDesc) -> Result<LinkHandle, PhysicsError> {
        if !desc.shape.is_valid() {
            return Err(PhysicsError::InvalidShape(desc.shape));
        }
        if !desc.pose.position.is_finite() || !desc.pose.rotation.is_finite() {
            return Err(PhysicsError::NonFinite("link pose"));
        }
        if !desc.density.is_finite() || !desc.friction.is_finite() {
            return Err(PhysicsError::NonFinite("link material"));
        }

        let body = RigidBodyBuilder::dynamic()
            .translation(to_vec3(desc.pose.position))
            .rotation(Vec3::new(0.0, 0.0, desc.pose.rotation))
            .locked_axes(
                LockedAxes::TRANSLATION_LOCKED_Z
                    | LockedAxes::ROTATION_LOCKED_X
                    | LockedAxes::ROTATION_LOCKED_Y,
            )
            .can_sleep(false)
            .build();
        let body_handle = self.context.rigid_body_set.insert(body);

        let collider = collider_for(desc.shape)
            .mass(desc.density * desc.shape.area())
            .friction(desc.friction)
            .collision_groups(interaction_groups(desc.filter))
            .build();
        self.context.collider_set.insert_with_parent(
            collider,
            body_handle,
            &mut self.context.rigid_body_set,
        );

        let link = LinkHandle::new(next_handle(self.links.len()));
        self.links.push(Some(body_handle));
        Ok(link)
    }

    fn create_revolute_joint(&mut self, desc: &JointDesc) -> Result<JointHandle, PhysicsError> {
        if desc.link_a == desc.link_b {
            return Err(PhysicsError::SelfJoint(desc.link_a));
        }
        if !desc.anchor_a.is_finite() || !desc.anchor_b.is_finite() {
            return Err(PhysicsError::NonFinite("joint anchor"));
        }
        let body_a = self.body_handle(desc.link_a)?;
        let body_b = self.body_handle(desc.link_b)?;

        let axis = match desc.axis {
            HingeAxis::Forward => Vec3::Z,
            HingeAxis::Reversed => Vec3::NEG_Z,
        };
        let mut joint: GenericJoint = RevoluteJointBuilder::new(axis)
            .local_anchor1(to_vec3(desc.anchor_a))
            .local_anchor2(to_vec3(desc.anchor_b))
            .build()
            .into();
        joint.set_limits(JointAxis::AngX, desc.limits.as_array());
        joint.set_contacts_enabled(false);
        joint.set_motor_model(JointAxis::AngX, MotorModel::ForceBased);
        joint.set_motor(JointAxis::AngX, 0.0, 0.0, 0.0, 0.0);

        let handle = self
            .context
            .impulse_joint_set
            .insert(body_a, body_b, joint, true);

        let id = JointHandle::new(next_handle(self.joints.len()));
        self.joints.push(Some(JointSlot {
            handle,
            links: [desc.link_a, desc.link_b],
            axis: desc.axis,
        }));
        Ok(id)
    }

    fn remove_link(&mut self, link: LinkHandle) -> Result<(), PhysicsError> {
        let handle = self.body_handle(link)?;
        self.context.remove_body(handle);
        self.links[link.index()] = None;

        // rapier drops the attached impulse joints with the body.
        let mut dropped = 0;
        for slot in &mut self.joints {
            if slot.as_ref().is_some_and(|s| s.links.contains(&link)) {
                *slot = None;
                dropped += 1;
            }
        }
        debug!(%link, dropped, "removed link");
        Ok(())
    }

    fn set_velocity_drive(
        &mut self,
        joint: JointHandle,
        target_velocity: f32,
        max_force: f32,
    ) -> Result<(), PhysicsError> {
        if !target_velocity.is_finite() || !max_force.is_finite() {
            return Err(PhysicsError::NonFinite("velocity drive"));
        }
        let data = self.joint_data_mut(joint)?;
        data.set_motor_velocity(JointAxis::AngX, target_velocity, DRIVE_GAIN);
        data.set_motor_max_force(JointAxis::AngX, max_force);
        Ok(())
    }

    fn set_position_hold(
        &mut self,
        joint: JointHandle,
        target_angle: f32,
        stiffness: f32,
        damping: f32,
    ) -> Result<(), PhysicsError> {
        if !target_angle.is_finite() || !stiffness.is_finite() || !damping.is_finite() {
            return Err(PhysicsError::NonFinite("position hold"));
        }
        let data = self.joint_data_mut(joint)?;
        data.set_motor(JointAxis::AngX, target_angle, 0.0, stiffness, damping);
        data.set_motor_max_force(JointAxis::AngX, f32::MAX);
        Ok(())
    }

    fn disable_motor(&mut self, joint: JointHandle) -> Result<(), PhysicsError> {
        let data = self.joint_data_mut(joint)?;
        data.set_motor(JointAxis::AngX, 0.0, 0.0, 0.0, 0.0);
        data.set_motor_max_force(JointAxis::AngX, 0.0);
        Ok(())
    }

    fn link_pose(&self, link: LinkHandle) -> Result<Pose2, PhysicsError> {
        let body = self.body(link)?;
        let t = body.translation();
        let q = body.rotation();
        Ok(Pose2::new(
            Vec2::new(t.x, t.y),
            wrap_angle(2.0 * q.z.atan2(q.w)),
        ))
    }

    fn link_linear_velocity(&self, link: LinkHandle) -> Result<Vec2, PhysicsError> {
        let v = self.body(link)?.linvel();
        Ok(Vec2::new(v.x, v.y))
    }

    fn link_angular_velocity(&self, link: LinkHandle) -> Result<f32, PhysicsError> {
        Ok(self.body(link)?.angvel().z)
    }

    fn apply_impulse(&mut self, link: LinkHandle, impulse: Vec2) -> Result<(), PhysicsError> {
        if !impulse.is_finite() {
            return Err(PhysicsError::NonFinite("impulse"));
        }
        self.body_mut(link)?.apply_impulse(to_vec3(impulse), true);
        Ok(())
    }

    fn apply_angular_impulse(
        &mut self,
        link: LinkHandle,
        impulse: f32,
    ) -> Result<(), PhysicsError> {
        if !impulse.is_finite() {
            return Err(PhysicsError::NonFinite("angular impulse"));
        }
        self.body_mut(link)?
            .apply_torque_impulse(Vec3::new(0.0, 0.0, impulse), true);
        Ok(())
    }

    fn set_damping(
        &mut self,
        link: LinkHandle,
        linear: f32,
        angular: f32,
    ) -> Result<(), PhysicsError> {
        if !linear.is_finite() || !angular.is_finite() {
            return Err(PhysicsError::NonFinite("damping"));
        }
        let body = self.body_mut(link)?;
        body.set_linear_damping(linear);
        body.set_angular_damping(angular);
        Ok(())
    }

    fn step(&mut self) {
        self.context.step();
    }

    fn link_count(&self) -> usize {
        self.links.iter().flatten().count()
    }

    fn joint_count(&self) -> usize {
        self.joints.iter().flatten().count()
    }

    fn name(&self) -> &str {
        "rapier3d"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::CollisionFilter;
    use approx::assert_relative_eq;
    use teeter_core::types::JointLimits;

    fn link_at(x: f32, y: f32) -> LinkDesc {
        LinkDesc {
            pose: Pose2::new(Vec2::new(x, y), 0.0),
            shape: LinkShape::Box {
                width: 0.2,
                height: 0.4,
            },
            density: 1.0,
            friction: 0.5,
            filter: CollisionFilter::default(),
        }
    }

    fn hinge(a: LinkHandle, b: LinkHandle) -> JointDesc {
        JointDesc {
            link_a: a,
            link_b: b,
            anchor_a: Vec2::new(0.0, -0.2),
            anchor_b: Vec2::new(0.0, 0.2),
            limits: JointLimits::new(-1.0, 1.0).unwrap(),
            axis: HingeAxis::Forward,
        }
    }

    // ---- Construction ----

    #[test]
    fn create_link_reports_pose_and_zero_velocity() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let link = adapter.create_link(&link_at(1.0, -3.0)).unwrap();

        let pose = adapter.link_pose(link).unwrap();
        assert_relative_eq!(pose.position.x, 1.0);
        assert_relative_eq!(pose.position.y, -3.0);
        assert_relative_eq!(pose.rotation, 0.0);
        assert_eq!(adapter.link_linear_velocity(link).unwrap(), Vec2::ZERO);
        assert_relative_eq!(adapter.link_angular_velocity(link).unwrap(), 0.0);
        assert_eq!(adapter.link_count(), 1);
    }

    #[test]
    fn create_link_keeps_rotation() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let mut desc = link_at(0.0, 0.0);
        desc.pose.rotation = -0.4;
        let link = adapter.create_link(&desc).unwrap();
        assert_relative_eq!(adapter.link_rotation(link).unwrap(), -0.4, epsilon = 1e-5);
    }

    #[test]
    fn invalid_shape_rejected() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let mut desc = link_at(0.0, 0.0);
        desc.shape = LinkShape::Capsule {
            radius: 0.0,
            length: 0.5,
        };
        assert!(matches!(
            adapter.create_link(&desc),
            Err(PhysicsError::InvalidShape(_))
        ));
        assert_eq!(adapter.link_count(), 0);
    }

    #[test]
    fn joint_on_unknown_link_fails() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let a = adapter.create_link(&link_at(0.0, 0.0)).unwrap();
        let bogus = LinkHandle::new(99);
        assert_eq!(
            adapter.create_revolute_joint(&hinge(a, bogus)),
            Err(PhysicsError::UnknownLink(bogus))
        );
        assert_eq!(adapter.joint_count(), 0);
    }

    #[test]
    fn self_joint_rejected() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let a = adapter.create_link(&link_at(0.0, 0.0)).unwrap();
        assert_eq!(
            adapter.create_revolute_joint(&hinge(a, a)),
            Err(PhysicsError::SelfJoint(a))
        );
    }

    // ---- Removal ----

    #[test]
    fn remove_link_drops_attached_joints() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let a = adapter.create_link(&link_at(0.0, 0.0)).unwrap();
        let b = adapter.create_link(&link_at(0.0, -0.4)).unwrap();
        let joint = adapter.create_revolute_joint(&hinge(a, b)).unwrap();

        adapter.remove_link(b).unwrap();
        assert_eq!(adapter.link_count(), 1);
        assert_eq!(adapter.joint_count(), 0);
        assert_eq!(
            adapter.disable_motor(joint),
            Err(PhysicsError::UnknownJoint(joint))
        );
        assert_eq!(adapter.link_pose(b), Err(PhysicsError::UnknownLink(b)));
        assert_eq!(adapter.remove_link(b), Err(PhysicsError::UnknownLink(b)));
    }

    // ---- Motors ----

    #[test]
    fn motor_calls_succeed_on_live_joint() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let a = adapter.create_link(&link_at(0.0, 0.0)).unwrap();
        let b = adapter.create_link(&link_at(0.0, -0.4)).unwrap();
        let joint = adapter.create_revolute_joint(&hinge(a, b)).unwrap();

        assert!(adapter.set_velocity_drive(joint, 6.0, 120.0).is_ok());
        assert!(adapter.set_position_hold(joint, 0.1, 80.0, 8.0).is_ok());
        assert!(adapter.disable_motor(joint).is_ok());
        assert_eq!(
            adapter.set_velocity_drive(joint, f32::NAN, 1.0),
            Err(PhysicsError::NonFinite("velocity drive"))
        );
    }

    #[test]
    fn joint_angle_starts_at_relative_rotation() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let a = adapter.create_link(&link_at(0.0, 0.0)).unwrap();
        let mut desc = link_at(0.0, -0.4);
        desc.pose.rotation = -0.2;
        let b = adapter.create_link(&desc).unwrap();

        let mut forward = hinge(a, b);
        let fwd = adapter.create_revolute_joint(&forward).unwrap();
        forward.axis = HingeAxis::Reversed;
        let rev = adapter.create_revolute_joint(&forward).unwrap();

        assert_relative_eq!(adapter.joint_angle(fwd).unwrap(), -0.2, epsilon = 1e-5);
        assert_relative_eq!(adapter.joint_angle(rev).unwrap(), 0.2, epsilon = 1e-5);
    }

    // ---- Mutators ----

    #[test]
    fn impulse_changes_velocity() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let link = adapter.create_link(&link_at(0.0, 0.0)).unwrap();
        adapter.apply_impulse(link, Vec2::new(1.0, 0.0)).unwrap();
        assert!(adapter.link_linear_velocity(link).unwrap().x > 0.0);
    }

    #[test]
    fn non_finite_impulse_rejected() {
        let mut adapter = RapierAdapter::new(&SimConfig::default());
        let link = adapter.create_link(&link_at(0.0, 0.0)).unwrap();
        assert!(adapter.apply_impulse(link, Vec2::new(f32::INFINITY, 0.0)).is_err());
        assert!(adapter.apply_angular_impulse(link, f32::NAN).is_err());
        assert!(adapter.set_damping(link, f32::NAN, 0.0).is_err());
    }

    #[test]
    fn name_is_rapier3d() {
        let adapter = RapierAdapter::new(&SimConfig::default());
        assert_eq!(adapter.name(), "rapier3d");
    }
}
