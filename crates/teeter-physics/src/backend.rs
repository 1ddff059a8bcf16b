//! Engine-agnostic physics adapter contract.
//!
//! The character controller only ever talks to a [`PhysicsAdapter`]. Links
//! and joints are addressed by opaque handles; every call on a handle that is
//! unknown (never issued, or removed) returns an error rather than panicking,
//! so a failed construction degrades a limb instead of aborting the run.

use std::fmt;

use bevy::math::Vec2;
use teeter_core::types::{JointLimits, LinkShape, MotorState, Pose2};

use crate::error::PhysicsError;
use crate::filter::CollisionFilter;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Opaque reference to a rigid link created by an adapter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHandle(u32);

/// Opaque reference to a revolute joint created by an adapter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointHandle(u32);

macro_rules! handle_impl {
    ($name:ident, $label:literal) => {
        impl $name {
            #[must_use]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

handle_impl!(LinkHandle, "link");
handle_impl!(JointHandle, "joint");

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Everything needed to create one rigid link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkDesc {
    /// Initial world pose of the link's centre.
    pub pose: Pose2,
    pub shape: LinkShape,
    /// Mass per unit area in the plane.
    pub density: f32,
    pub friction: f32,
    pub filter: CollisionFilter,
}

/// Which way a hinge's positive angle turns the child relative to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HingeAxis {
    /// Counter-clockwise positive (+Z).
    #[default]
    Forward,
    /// Clockwise positive (-Z).
    Reversed,
}

impl HingeAxis {
    /// `+1.0` for [`Forward`](Self::Forward), `-1.0` for [`Reversed`](Self::Reversed).
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Reversed => -1.0,
        }
    }
}

/// Everything needed to create one revolute joint between two links.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDesc {
    pub link_a: LinkHandle,
    pub link_b: LinkHandle,
    /// Hinge point in `link_a`'s local frame.
    pub anchor_a: Vec2,
    /// Hinge point in `link_b`'s local frame.
    pub anchor_b: Vec2,
    pub limits: JointLimits,
    pub axis: HingeAxis,
}

// ---------------------------------------------------------------------------
// PhysicsAdapter
// ---------------------------------------------------------------------------

/// Trait that concrete physics engines implement for the character.
///
/// Angles and angular quantities are about the out-of-plane axis,
/// counter-clockwise positive. Joint angles follow the joint's
/// [`HingeAxis`].
pub trait PhysicsAdapter {
    /// Create a dynamic link at `desc.pose` with zero velocity.
    fn create_link(&mut self, desc: &LinkDesc) -> Result<LinkHandle, PhysicsError>;

    /// Create a hinge between two existing links. Fails if either link is
    /// unknown; the caller decides how to degrade.
    fn create_revolute_joint(&mut self, desc: &JointDesc) -> Result<JointHandle, PhysicsError>;

    /// Destroy a link and every joint attached to it.
    fn remove_link(&mut self, link: LinkHandle) -> Result<(), PhysicsError>;

    // -- Joint motors --

    fn set_velocity_drive(
        &mut self,
        joint: JointHandle,
        target_velocity: f32,
        max_force: f32,
    ) -> Result<(), PhysicsError>;

    fn set_position_hold(
        &mut self,
        joint: JointHandle,
        target_angle: f32,
        stiffness: f32,
        damping: f32,
    ) -> Result<(), PhysicsError>;

    /// Free swing within limits.
    fn disable_motor(&mut self, joint: JointHandle) -> Result<(), PhysicsError>;

    /// Dispatch a [`MotorState`] to the matching motor call.
    fn apply_motor(&mut self, joint: JointHandle, state: MotorState) -> Result<(), PhysicsError> {
        match state {
            MotorState::Disabled => self.disable_motor(joint),
            MotorState::VelocityDrive {
                target_velocity,
                max_force,
            } => self.set_velocity_drive(joint, target_velocity, max_force),
            MotorState::PositionHold {
                target_angle,
                stiffness,
                damping,
            } => self.set_position_hold(joint, target_angle, stiffness, damping),
        }
    }

    // -- Link queries --

    fn link_pose(&self, link: LinkHandle) -> Result<Pose2, PhysicsError>;

    fn link_position(&self, link: LinkHandle) -> Result<Vec2, PhysicsError> {
        self.link_pose(link).map(|pose| pose.position)
    }

    /// Rotation in `(-π, π]`.
    fn link_rotation(&self, link: LinkHandle) -> Result<f32, PhysicsError> {
        self.link_pose(link).map(|pose| pose.rotation)
    }

    fn link_linear_velocity(&self, link: LinkHandle) -> Result<Vec2, PhysicsError>;

    fn link_angular_velocity(&self, link: LinkHandle) -> Result<f32, PhysicsError>;

    // -- Link mutators --

    fn apply_impulse(&mut self, link: LinkHandle, impulse: Vec2) -> Result<(), PhysicsError>;

    fn apply_angular_impulse(&mut self, link: LinkHandle, impulse: f32)
    -> Result<(), PhysicsError>;

    fn set_damping(
        &mut self,
        link: LinkHandle,
        linear: f32,
        angular: f32,
    ) -> Result<(), PhysicsError>;

    // -- World --

    /// Advance exactly one fixed timestep.
    fn step(&mut self);

    /// Live links, excluding the ground.
    fn link_count(&self) -> usize;

    fn joint_count(&self) -> usize;

    /// Human-readable engine name (e.g., "rapier3d").
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
