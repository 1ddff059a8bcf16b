//! Identity enums and value types shared by every teeter crate.
//!
//! Links and joints are addressed by closed enums and stored in fixed arrays
//! ([`LinkMap`], [`JointMap`]), so every lookup is total and adding a body
//! segment is a compile-time change rather than a string key.

use std::fmt;
use std::ops::{Index, IndexMut};

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Left or right half of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

// ---------------------------------------------------------------------------
// LinkId
// ---------------------------------------------------------------------------

/// One of the nine rigid segments of the biped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkId {
    Torso,
    LeftThigh,
    RightThigh,
    LeftCalf,
    RightCalf,
    LeftFoot,
    RightFoot,
    LeftArm,
    RightArm,
}

impl LinkId {
    pub const COUNT: usize = 9;

    /// All links in build order (every parent precedes its children).
    pub const ALL: [Self; Self::COUNT] = [
        Self::Torso,
        Self::LeftThigh,
        Self::RightThigh,
        Self::LeftCalf,
        Self::RightCalf,
        Self::LeftFoot,
        Self::RightFoot,
        Self::LeftArm,
        Self::RightArm,
    ];

    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Torso => "torso",
            Self::LeftThigh => "left_thigh",
            Self::RightThigh => "right_thigh",
            Self::LeftCalf => "left_calf",
            Self::RightCalf => "right_calf",
            Self::LeftFoot => "left_foot",
            Self::RightFoot => "right_foot",
            Self::LeftArm => "left_arm",
            Self::RightArm => "right_arm",
        }
    }

    /// `None` for the torso.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::Torso => None,
            Self::LeftThigh | Self::LeftCalf | Self::LeftFoot | Self::LeftArm => Some(Side::Left),
            Self::RightThigh | Self::RightCalf | Self::RightFoot | Self::RightArm => {
                Some(Side::Right)
            }
        }
    }

    /// Thigh, calf or foot.
    #[must_use]
    pub const fn is_leg(self) -> bool {
        matches!(
            self,
            Self::LeftThigh
                | Self::RightThigh
                | Self::LeftCalf
                | Self::RightCalf
                | Self::LeftFoot
                | Self::RightFoot
        )
    }

    #[must_use]
    pub const fn thigh(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftThigh,
            Side::Right => Self::RightThigh,
        }
    }

    #[must_use]
    pub const fn calf(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftCalf,
            Side::Right => Self::RightCalf,
        }
    }

    #[must_use]
    pub const fn foot(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftFoot,
            Side::Right => Self::RightFoot,
        }
    }

    #[must_use]
    pub const fn arm(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftArm,
            Side::Right => Self::RightArm,
        }
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// JointId
// ---------------------------------------------------------------------------

/// One of the eight revolute joints of the biped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JointId {
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftShoulder,
    RightShoulder,
}

impl JointId {
    pub const COUNT: usize = 8;

    pub const ALL: [Self; Self::COUNT] = [
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftShoulder,
        Self::RightShoulder,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
        }
    }

    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::LeftHip | Self::LeftKnee | Self::LeftAnkle | Self::LeftShoulder => Side::Left,
            Self::RightHip | Self::RightKnee | Self::RightAnkle | Self::RightShoulder => {
                Side::Right
            }
        }
    }

    /// `(parent, child)` links connected by this joint.
    #[must_use]
    pub const fn links(self) -> (LinkId, LinkId) {
        let side = self.side();
        match self {
            Self::LeftHip | Self::RightHip => (LinkId::Torso, LinkId::thigh(side)),
            Self::LeftKnee | Self::RightKnee => (LinkId::thigh(side), LinkId::calf(side)),
            Self::LeftAnkle | Self::RightAnkle => (LinkId::calf(side), LinkId::foot(side)),
            Self::LeftShoulder | Self::RightShoulder => (LinkId::Torso, LinkId::arm(side)),
        }
    }

    #[must_use]
    pub const fn hip(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftHip,
            Side::Right => Self::RightHip,
        }
    }

    #[must_use]
    pub const fn knee(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftKnee,
            Side::Right => Self::RightKnee,
        }
    }

    #[must_use]
    pub const fn ankle(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftAnkle,
            Side::Right => Self::RightAnkle,
        }
    }

    #[must_use]
    pub const fn shoulder(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftShoulder,
            Side::Right => Self::RightShoulder,
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// LinkMap / JointMap
// ---------------------------------------------------------------------------

macro_rules! id_map {
    ($(#[$meta:meta])* $name:ident, $id:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name<T>([T; $id::COUNT]);

        impl<T> $name<T> {
            /// Build a map by evaluating `f` for every identifier in order.
            pub fn from_fn(mut f: impl FnMut($id) -> T) -> Self {
                Self(std::array::from_fn(|i| f($id::ALL[i])))
            }

            pub fn iter(&self) -> impl Iterator<Item = ($id, &T)> {
                $id::ALL.into_iter().zip(self.0.iter())
            }

            pub fn iter_mut(&mut self) -> impl Iterator<Item = ($id, &mut T)> {
                $id::ALL.into_iter().zip(self.0.iter_mut())
            }

            pub fn values(&self) -> impl Iterator<Item = &T> {
                self.0.iter()
            }
        }

        impl<T: Default> Default for $name<T> {
            fn default() -> Self {
                Self::from_fn(|_| T::default())
            }
        }

        impl<T> Index<$id> for $name<T> {
            type Output = T;
            fn index(&self, id: $id) -> &T {
                &self.0[id.index()]
            }
        }

        impl<T> IndexMut<$id> for $name<T> {
            fn index_mut(&mut self, id: $id) -> &mut T {
                &mut self.0[id.index()]
            }
        }
    };
}

id_map!(
    /// One value per [`LinkId`].
    LinkMap,
    LinkId
);
id_map!(
    /// One value per [`JointId`].
    JointMap,
    JointId
);

// ---------------------------------------------------------------------------
// LinkShape
// ---------------------------------------------------------------------------

/// Collision/mass shape of a link, in the sagittal plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkShape {
    /// Axis-aligned box with full `width` (x) and `height` (y).
    Box { width: f32, height: f32 },
    /// Vertical capsule; `length` is the full tip-to-tip extent along y.
    Capsule { radius: f32, length: f32 },
}

impl LinkShape {
    /// Full vertical extent.
    #[must_use]
    pub const fn height(&self) -> f32 {
        match *self {
            Self::Box { height, .. } => height,
            Self::Capsule { length, .. } => length,
        }
    }

    /// Full horizontal extent.
    #[must_use]
    pub fn width(&self) -> f32 {
        match *self {
            Self::Box { width, .. } => width,
            Self::Capsule { radius, .. } => 2.0 * radius,
        }
    }

    /// Area in the plane, used for mass.
    #[must_use]
    pub fn area(&self) -> f32 {
        match *self {
            Self::Box { width, height } => width * height,
            Self::Capsule { radius, length } => {
                2.0 * radius * (length - 2.0 * radius) + std::f32::consts::PI * radius * radius
            }
        }
    }

    /// `true` when every dimension is finite and strictly positive, and a
    /// capsule is at least as long as its two end caps.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Box { width, height } => {
                width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
            }
            Self::Capsule { radius, length } => {
                radius.is_finite() && length.is_finite() && radius > 0.0 && length >= 2.0 * radius
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JointLimits
// ---------------------------------------------------------------------------

/// Angular range `[min, max]` of a revolute joint, in radians.
///
/// Construction rejects `min > max`, so a value of this type always
/// satisfies `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    min: f32,
    max: f32,
}

impl JointLimits {
    pub fn new(min: f32, max: f32) -> Result<Self, ValidationError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ValidationError::NonFinite("joint limit"));
        }
        if min > max {
            return Err(ValidationError::InvertedLimits { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub const fn min(&self) -> f32 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    #[must_use]
    pub const fn as_array(&self) -> [f32; 2] {
        [self.min, self.max]
    }

    #[must_use]
    pub fn clamp(&self, angle: f32) -> f32 {
        angle.clamp(self.min, self.max)
    }

    #[must_use]
    pub fn contains(&self, angle: f32) -> bool {
        (self.min..=self.max).contains(&angle)
    }
}

impl TryFrom<[f32; 2]> for JointLimits {
    type Error = ValidationError;

    fn try_from([min, max]: [f32; 2]) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

// ---------------------------------------------------------------------------
// MotorState
// ---------------------------------------------------------------------------

/// Drive mode of a joint motor. Every joint holds exactly one at all times.
///
/// `Disabled` means the joint swings freely within its limits; it never
/// means the joint is absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum MotorState {
    #[default]
    Disabled,
    /// Track `target_velocity` (rad/s), bounded by `max_force`.
    VelocityDrive { target_velocity: f32, max_force: f32 },
    /// Spring toward `target_angle` (rad).
    PositionHold {
        target_angle: f32,
        stiffness: f32,
        damping: f32,
    },
}

impl MotorState {
    #[must_use]
    pub const fn velocity(target_velocity: f32, max_force: f32) -> Self {
        Self::VelocityDrive {
            target_velocity,
            max_force,
        }
    }

    #[must_use]
    pub const fn hold(target_angle: f32, stiffness: f32, damping: f32) -> Self {
        Self::PositionHold {
            target_angle,
            stiffness,
            damping,
        }
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Hold target, if this is a position hold.
    #[must_use]
    pub const fn target_angle(&self) -> Option<f32> {
        match *self {
            Self::PositionHold { target_angle, .. } => Some(target_angle),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ControlInputState
// ---------------------------------------------------------------------------

/// The four player-held controls, sampled once per fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ControlInputState {
    pub left_thigh_drive: bool,
    pub right_thigh_drive: bool,
    pub left_calf_extend: bool,
    pub right_calf_extend: bool,
}

impl ControlInputState {
    /// Nothing held.
    pub const IDLE: Self = Self {
        left_thigh_drive: false,
        right_thigh_drive: false,
        left_calf_extend: false,
        right_calf_extend: false,
    };

    #[must_use]
    pub const fn thigh_drive(&self, side: Side) -> bool {
        match side {
            Side::Left => self.left_thigh_drive,
            Side::Right => self.right_thigh_drive,
        }
    }

    #[must_use]
    pub const fn calf_extend(&self, side: Side) -> bool {
        match side {
            Side::Left => self.left_calf_extend,
            Side::Right => self.right_calf_extend,
        }
    }

    pub const fn set_thigh_drive(&mut self, side: Side, held: bool) {
        match side {
            Side::Left => self.left_thigh_drive = held,
            Side::Right => self.right_thigh_drive = held,
        }
    }

    pub const fn set_calf_extend(&mut self, side: Side, held: bool) {
        match side {
            Side::Left => self.left_calf_extend = held,
            Side::Right => self.right_calf_extend = held,
        }
    }

    #[must_use]
    pub const fn any(&self) -> bool {
        self.left_thigh_drive
            || self.right_thigh_drive
            || self.left_calf_extend
            || self.right_calf_extend
    }
}

// ---------------------------------------------------------------------------
// Pose2
// ---------------------------------------------------------------------------

/// Planar pose: position plus rotation about the out-of-plane axis
/// (counter-clockwise positive, radians).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose2 {
    pub position: Vec2,
    pub rotation: f32,
}

impl Pose2 {
    #[must_use]
    pub const fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Map a point from this pose's local frame into the parent frame.
    #[must_use]
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.rotation).rotate(local)
    }

    /// Pose of a child frame expressed in this frame's local coordinates.
    #[must_use]
    pub fn compose(&self, local: Self) -> Self {
        Self {
            position: self.transform_point(local.position),
            rotation: self.rotation + local.rotation,
        }
    }
}

/// Wrap an angle into `(-π, π]`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    // ---- Identity enums ----

    #[test]
    fn link_indices_match_all_order() {
        for (i, link) in LinkId::ALL.into_iter().enumerate() {
            assert_eq!(link.index(), i);
        }
        for (i, joint) in JointId::ALL.into_iter().enumerate() {
            assert_eq!(joint.index(), i);
        }
    }

    #[test]
    fn joint_links_are_same_side_or_torso() {
        for joint in JointId::ALL {
            let (parent, child) = joint.links();
            assert_eq!(child.side(), Some(joint.side()));
            assert!(parent == LinkId::Torso || parent.side() == Some(joint.side()));
        }
    }

    #[test]
    fn build_order_puts_parents_first() {
        for joint in JointId::ALL {
            let (parent, child) = joint.links();
            assert!(parent.index() < child.index(), "{joint}");
        }
    }

    #[test]
    fn side_opposite_round_trips() {
        for side in Side::BOTH {
            assert_ne!(side, side.opposite());
            assert_eq!(side, side.opposite().opposite());
        }
    }

    #[test]
    fn legs_and_arms_classified() {
        assert!(LinkId::LeftCalf.is_leg());
        assert!(!LinkId::LeftArm.is_leg());
        assert!(!LinkId::Torso.is_leg());
        assert_eq!(LinkId::Torso.side(), None);
    }

    // ---- Maps ----

    #[test]
    fn link_map_from_fn_and_index() {
        let mut map = LinkMap::from_fn(LinkId::index);
        assert_eq!(map[LinkId::RightArm], 8);
        map[LinkId::Torso] = 42;
        assert_eq!(map[LinkId::Torso], 42);
        assert_eq!(map.iter().count(), LinkId::COUNT);
    }

    #[test]
    fn joint_map_default_is_disabled() {
        let map: JointMap<MotorState> = JointMap::default();
        assert!(map.values().all(MotorState::is_disabled));
    }

    // ---- Shapes ----

    #[test]
    fn shape_validity() {
        assert!(LinkShape::Box { width: 0.3, height: 0.6 }.is_valid());
        assert!(!LinkShape::Box { width: 0.0, height: 0.6 }.is_valid());
        assert!(LinkShape::Capsule { radius: 0.07, length: 0.5 }.is_valid());
        assert!(!LinkShape::Capsule { radius: 0.3, length: 0.5 }.is_valid());
        assert!(!LinkShape::Capsule { radius: f32::NAN, length: 0.5 }.is_valid());
    }

    #[test]
    fn capsule_width_is_diameter() {
        let shape = LinkShape::Capsule { radius: 0.05, length: 0.5 };
        assert_relative_eq!(shape.width(), 0.1);
        assert_relative_eq!(shape.height(), 0.5);
    }

    #[test]
    fn shape_area() {
        assert_relative_eq!(LinkShape::Box { width: 0.3, height: 0.6 }.area(), 0.18);
        // A capsule as long as its caps is a disc.
        let disc = LinkShape::Capsule { radius: 0.1, length: 0.2 };
        assert_relative_eq!(disc.area(), std::f32::consts::PI * 0.01);
    }

    // ---- Limits ----

    #[test]
    fn limits_reject_inverted_range() {
        let err = JointLimits::new(1.0, -1.0).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedLimits { .. }));
    }

    #[test]
    fn limits_accept_degenerate_range() {
        let limits = JointLimits::new(0.5, 0.5).unwrap();
        assert!(limits.min() <= limits.max());
        assert_relative_eq!(limits.clamp(3.0), 0.5);
    }

    #[test]
    fn limits_reject_nan() {
        assert!(JointLimits::new(f32::NAN, 1.0).is_err());
    }

    #[test]
    fn limits_clamp_shoulder_range() {
        let limits = JointLimits::new(-FRAC_PI_2, FRAC_PI_2).unwrap();
        assert_relative_eq!(limits.clamp(2.0), FRAC_PI_2);
        assert_relative_eq!(limits.clamp(-2.0), -FRAC_PI_2);
        assert!(limits.contains(0.49));
    }

    #[test]
    fn limits_try_from_array() {
        let limits = JointLimits::try_from([-0.1, 1.6]).unwrap();
        assert_eq!(limits.as_array(), [-0.1, 1.6]);
        assert!(JointLimits::try_from([2.0, 1.0]).is_err());
    }

    // ---- Motor state ----

    #[test]
    fn motor_state_constructors() {
        assert_eq!(
            MotorState::velocity(6.0, 120.0),
            MotorState::VelocityDrive {
                target_velocity: 6.0,
                max_force: 120.0
            }
        );
        assert_eq!(MotorState::hold(0.1, 80.0, 8.0).target_angle(), Some(0.1));
        assert_eq!(MotorState::Disabled.target_angle(), None);
    }

    // ---- Input ----

    #[test]
    fn input_side_accessors() {
        let mut input = ControlInputState::IDLE;
        assert!(!input.any());
        input.set_thigh_drive(Side::Left, true);
        input.set_calf_extend(Side::Right, true);
        assert!(input.thigh_drive(Side::Left));
        assert!(!input.thigh_drive(Side::Right));
        assert!(input.calf_extend(Side::Right));
        assert!(input.any());
    }

    // ---- Pose ----

    #[test]
    fn pose_transform_rotates_then_translates() {
        let pose = Pose2::new(Vec2::new(1.0, 2.0), FRAC_PI_2);
        let p = pose.transform_point(Vec2::new(0.0, 1.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn pose_compose_accumulates_rotation() {
        let a = Pose2::new(Vec2::ZERO, 0.2);
        let b = a.compose(Pose2::new(Vec2::new(0.0, -1.0), 0.3));
        assert_relative_eq!(b.rotation, 0.5);
        assert_relative_eq!(b.position.x, 0.2_f32.sin(), epsilon = 1e-6);
    }

    #[test]
    fn wrap_angle_range() {
        assert_relative_eq!(wrap_angle(0.0), 0.0);
        assert_relative_eq!(wrap_angle(PI), PI, epsilon = 1e-6);
        assert_relative_eq!(wrap_angle(-PI), PI, epsilon = 1e-6);
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(-0.3), -0.3, epsilon = 1e-6);
    }
}
