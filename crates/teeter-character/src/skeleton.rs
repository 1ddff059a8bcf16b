//! Biped topology: nine links, eight revolute joints.
//!
//! [`SkeletonLayout`] is the pure description (spawn poses, anchors, limits,
//! collision filters) derived once from configuration. [`Skeleton`] is one
//! built instance in a physics world, owning the handles and the
//! authoritative [`MotorState`] of every joint.

use bevy::math::Vec2;
use teeter_core::config::CharacterConfig;
use teeter_core::error::ConfigError;
use teeter_core::types::{JointId, JointLimits, JointMap, LinkId, LinkMap, MotorState, Pose2};
use teeter_physics::{
    CollisionFilter, CollisionGroups, HingeAxis, JointDesc, JointHandle, LinkDesc, LinkHandle,
    PhysicsAdapter, PhysicsError,
};
use thiserror::Error;
use tracing::warn;

/// Distance from the torso's top edge down to the shoulder hinge.
const SHOULDER_INSET: f32 = 0.05;
/// Distance from an arm's top end down to its shoulder hinge.
const ARM_HINGE_INSET: f32 = 0.03;
/// Ankle hinge position along the foot, as a fraction of foot width behind
/// the foot's centre.
const ANKLE_SETBACK: f32 = 0.2;

// ---------------------------------------------------------------------------
// Collision filtering
// ---------------------------------------------------------------------------

/// Collision filter of `link`.
///
/// Each leg collides with the ground and torso but not the other leg, so the
/// legs can cross mid-stride. Arms only touch the ground.
pub const fn collision_filter(link: LinkId) -> CollisionFilter {
    match link {
        LinkId::Torso => CollisionFilter::new(
            CollisionGroups::TORSO,
            CollisionGroups::GROUND
                .union(CollisionGroups::LEFT_LEG)
                .union(CollisionGroups::RIGHT_LEG),
        ),
        LinkId::LeftThigh | LinkId::LeftCalf | LinkId::LeftFoot => CollisionFilter::new(
            CollisionGroups::LEFT_LEG,
            CollisionGroups::GROUND.union(CollisionGroups::TORSO),
        ),
        LinkId::RightThigh | LinkId::RightCalf | LinkId::RightFoot => CollisionFilter::new(
            CollisionGroups::RIGHT_LEG,
            CollisionGroups::GROUND.union(CollisionGroups::TORSO),
        ),
        LinkId::LeftArm | LinkId::RightArm => {
            CollisionFilter::new(CollisionGroups::ARMS, CollisionGroups::GROUND)
        }
    }
}

/// Hinge direction of `joint`. Knees flex clockwise, everything else swings
/// forward counter-clockwise.
pub const fn hinge_axis(joint: JointId) -> HingeAxis {
    match joint {
        JointId::LeftKnee | JointId::RightKnee => HingeAxis::Reversed,
        _ => HingeAxis::Forward,
    }
}

// ---------------------------------------------------------------------------
// SkeletonLayout
// ---------------------------------------------------------------------------

/// Static geometry of one joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSpec {
    /// Hinge point in the parent link's frame.
    pub parent_anchor: Vec2,
    /// Hinge point in the child link's frame.
    pub child_anchor: Vec2,
    pub limits: JointLimits,
    pub axis: HingeAxis,
}

/// Spawn-pose description of the whole biped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonLayout {
    links: LinkMap<LinkDesc>,
    joints: JointMap<JointSpec>,
}

/// World pose of a child link whose anchor coincides with the parent's.
fn attach(parent: Pose2, parent_anchor: Vec2, child_anchor: Vec2, child_rotation: f32) -> Pose2 {
    let hinge = parent.transform_point(parent_anchor);
    let offset = Vec2::from_angle(child_rotation).rotate(child_anchor);
    Pose2::new(hinge - offset, child_rotation)
}

impl SkeletonLayout {
    /// Lay out a standing biped with its torso centred on `config.spawn`.
    ///
    /// Every joint starts at zero except the knees, which start at
    /// `knee_prebend` of flexion.
    pub fn from_config(config: &CharacterConfig) -> Result<Self, ConfigError> {
        let body = &config.body;
        let torso_half = body.torso.height() / 2.0;
        let thigh_half = body.thigh.height() / 2.0;
        let calf_half = body.calf.height() / 2.0;
        let foot_half = body.foot.height() / 2.0;
        let arm_half = body.arm.height() / 2.0;

        let hip = (Vec2::new(0.0, -torso_half), Vec2::new(0.0, thigh_half));
        let knee = (Vec2::new(0.0, -thigh_half), Vec2::new(0.0, calf_half));
        let ankle = (
            Vec2::new(0.0, -calf_half),
            Vec2::new(-ANKLE_SETBACK * body.foot.width(), foot_half),
        );
        let shoulder = (
            Vec2::new(0.0, torso_half - SHOULDER_INSET),
            Vec2::new(0.0, arm_half - ARM_HINGE_INSET),
        );

        let torso = Pose2::new(config.spawn_point(), 0.0);
        let thigh = attach(torso, hip.0, hip.1, 0.0);
        // Knee flexion is clockwise.
        let shin_rotation = -body.knee_prebend;
        let calf = attach(thigh, knee.0, knee.1, shin_rotation);
        let foot = attach(calf, ankle.0, ankle.1, shin_rotation);
        let arm = attach(torso, shoulder.0, shoulder.1, 0.0);

        let links = LinkMap::from_fn(|link| {
            let (pose, shape, density) = match link {
                LinkId::Torso => (torso, body.torso, body.torso_density),
                LinkId::LeftThigh | LinkId::RightThigh => (thigh, body.thigh, body.limb_density),
                LinkId::LeftCalf | LinkId::RightCalf => (calf, body.calf, body.limb_density),
                LinkId::LeftFoot | LinkId::RightFoot => (foot, body.foot, body.limb_density),
                LinkId::LeftArm | LinkId::RightArm => (arm, body.arm, body.limb_density),
            };
            LinkDesc {
                pose,
                shape,
                density,
                friction: body.friction,
                filter: collision_filter(link),
            }
        });

        let mut specs = Vec::with_capacity(JointId::COUNT);
        for joint in JointId::ALL {
            let (parent_anchor, child_anchor) = match joint {
                JointId::LeftHip | JointId::RightHip => hip,
                JointId::LeftKnee | JointId::RightKnee => knee,
                JointId::LeftAnkle | JointId::RightAnkle => ankle,
                JointId::LeftShoulder | JointId::RightShoulder => shoulder,
            };
            specs.push(JointSpec {
                parent_anchor,
                child_anchor,
                limits: body.limits(joint)?,
                axis: hinge_axis(joint),
            });
        }
        let joints = JointMap::from_fn(|joint| specs[joint.index()]);

        Ok(Self { links, joints })
    }

    pub fn link(&self, link: LinkId) -> &LinkDesc {
        &self.links[link]
    }

    pub fn joint(&self, joint: JointId) -> &JointSpec {
        &self.joints[joint]
    }

    /// Spawn pose of the torso.
    pub fn root(&self) -> Pose2 {
        self.links[LinkId::Torso].pose
    }
}

// ---------------------------------------------------------------------------
// BuildIssue
// ---------------------------------------------------------------------------

/// A construction or runtime failure that left part of the skeleton passive.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BuildIssue {
    #[error("link {link} failed to build: {error}")]
    Link { link: LinkId, error: PhysicsError },

    #[error("joint {joint} failed to build: {error}")]
    Joint { joint: JointId, error: PhysicsError },

    #[error("joint {joint} skipped: link {link} is missing")]
    MissingLink { joint: JointId, link: LinkId },

    #[error("joint {joint} degraded: {error}")]
    Degraded { joint: JointId, error: PhysicsError },
}

// ---------------------------------------------------------------------------
// Skeleton
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct JointSlot {
    handle: Option<JointHandle>,
    motor: MotorState,
}

/// One built biped. Rebuilt wholesale on reset, never patched.
#[derive(Debug, Clone)]
pub struct Skeleton {
    links: LinkMap<Option<LinkHandle>>,
    joints: JointMap<JointSlot>,
    issues: Vec<BuildIssue>,
}

impl Skeleton {
    /// Create every link and joint of `layout` in `adapter`.
    ///
    /// Failures are recorded in [`issues`](Self::issues) and leave the
    /// affected joint passive; building never aborts.
    pub fn build<P: PhysicsAdapter + ?Sized>(adapter: &mut P, layout: &SkeletonLayout) -> Self {
        let mut issues = Vec::new();

        let links = LinkMap::from_fn(|link| match adapter.create_link(layout.link(link)) {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(%link, %error, "link failed to build");
                issues.push(BuildIssue::Link { link, error });
                None
            }
        });

        let joints = JointMap::from_fn(|joint| {
            let (parent, child) = joint.links();
            let (Some(link_a), Some(link_b)) = (links[parent], links[child]) else {
                let link = if links[parent].is_none() { parent } else { child };
                warn!(%joint, %link, "joint skipped, link missing");
                issues.push(BuildIssue::MissingLink { joint, link });
                return JointSlot::default();
            };
            let spec = layout.joint(joint);
            let desc = JointDesc {
                link_a,
                link_b,
                anchor_a: spec.parent_anchor,
                anchor_b: spec.child_anchor,
                limits: spec.limits,
                axis: spec.axis,
            };
            match adapter.create_revolute_joint(&desc) {
                Ok(handle) => JointSlot {
                    handle: Some(handle),
                    motor: MotorState::Disabled,
                },
                Err(error) => {
                    warn!(%joint, %error, "joint failed to build, limb left passive");
                    issues.push(BuildIssue::Joint { joint, error });
                    JointSlot::default()
                }
            }
        });

        Self {
            links,
            joints,
            issues,
        }
    }

    pub fn link(&self, link: LinkId) -> Option<LinkHandle> {
        self.links[link]
    }

    pub fn joint(&self, joint: JointId) -> Option<JointHandle> {
        self.joints[joint].handle
    }

    /// `true` while the joint exists and accepts motor commands.
    pub fn is_joint_live(&self, joint: JointId) -> bool {
        self.joints[joint].handle.is_some()
    }

    /// Current motor state. Failed joints always report `Disabled`.
    pub fn motor(&self, joint: JointId) -> MotorState {
        self.joints[joint].motor
    }

    pub fn issues(&self) -> &[BuildIssue] {
        &self.issues
    }

    /// No construction or runtime failures so far.
    pub fn is_intact(&self) -> bool {
        self.issues.is_empty()
    }

    /// Command a joint motor.
    ///
    /// No-op on a failed joint or when `state` equals the current state.
    /// An adapter error degrades the joint to passive for the rest of the
    /// run. Returns `true` if the adapter was called successfully.
    pub fn set_motor<P: PhysicsAdapter + ?Sized>(
        &mut self,
        adapter: &mut P,
        joint: JointId,
        state: MotorState,
    ) -> bool {
        let slot = &mut self.joints[joint];
        let Some(handle) = slot.handle else {
            return false;
        };
        if slot.motor == state {
            return false;
        }
        match adapter.apply_motor(handle, state) {
            Ok(()) => {
                slot.motor = state;
                true
            }
            Err(error) => {
                warn!(%joint, %error, "motor command failed, joint degraded");
                *slot = JointSlot::default();
                self.issues.push(BuildIssue::Degraded { joint, error });
                false
            }
        }
    }

    /// World pose of a live link.
    pub fn link_pose<P: PhysicsAdapter + ?Sized>(&self, adapter: &P, link: LinkId) -> Option<Pose2> {
        adapter.link_pose(self.links[link]?).ok()
    }

    pub fn apply_impulse<P: PhysicsAdapter + ?Sized>(
        &self,
        adapter: &mut P,
        link: LinkId,
        impulse: Vec2,
    ) -> bool {
        let Some(handle) = self.links[link] else {
            return false;
        };
        adapter
            .apply_impulse(handle, impulse)
            .inspect_err(|error| warn!(%link, %error, "impulse rejected"))
            .is_ok()
    }

    pub fn apply_angular_impulse<P: PhysicsAdapter + ?Sized>(
        &self,
        adapter: &mut P,
        link: LinkId,
        impulse: f32,
    ) -> bool {
        let Some(handle) = self.links[link] else {
            return false;
        };
        adapter
            .apply_angular_impulse(handle, impulse)
            .inspect_err(|error| warn!(%link, %error, "angular impulse rejected"))
            .is_ok()
    }

    /// Set `[linear, angular]` damping on a live link.
    pub fn set_damping<P: PhysicsAdapter + ?Sized>(
        &self,
        adapter: &mut P,
        link: LinkId,
        [linear, angular]: [f32; 2],
    ) {
        if let Some(handle) = self.links[link]
            && let Err(error) = adapter.set_damping(handle, linear, angular)
        {
            warn!(%link, %error, "damping rejected");
        }
    }

    /// Remove every link (and with them every joint) from `adapter`.
    pub fn destroy<P: PhysicsAdapter + ?Sized>(self, adapter: &mut P) {
        for (link, handle) in self.links.iter() {
            if let Some(handle) = *handle
                && let Err(error) = adapter.remove_link(handle)
            {
                warn!(%link, %error, "link already gone");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
