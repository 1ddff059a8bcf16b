//! Collision group bits and membership/filter pairs.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

// ---------------------------------------------------------------------------
// CollisionGroups
// ---------------------------------------------------------------------------

/// Bit set of collision groups.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CollisionGroups(u32);

impl CollisionGroups {
    pub const NONE: Self = Self(0);
    pub const GROUND: Self = Self(1 << 0);
    pub const TORSO: Self = Self(1 << 1);
    pub const LEFT_LEG: Self = Self(1 << 2);
    pub const RIGHT_LEG: Self = Self(1 << 3);
    pub const ARMS: Self = Self(1 << 4);
    pub const ALL: Self = Self(u32::MAX);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for CollisionGroups {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for CollisionGroups {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for CollisionGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollisionGroups({:#07b})", self.0)
    }
}

// ---------------------------------------------------------------------------
// CollisionFilter
// ---------------------------------------------------------------------------

/// Which groups a collider belongs to and which it collides with.
///
/// Two colliders interact only if each one's `memberships` intersects the
/// other's `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionFilter {
    pub memberships: CollisionGroups,
    pub filter: CollisionGroups,
}

impl CollisionFilter {
    /// Static ground: collides with everything.
    pub const GROUND: Self = Self::new(CollisionGroups::GROUND, CollisionGroups::ALL);

    #[must_use]
    pub const fn new(memberships: CollisionGroups, filter: CollisionGroups) -> Self {
        Self {
            memberships,
            filter,
        }
    }

    #[must_use]
    pub const fn interacts_with(&self, other: &Self) -> bool {
        self.memberships.intersects(other.filter) && other.memberships.intersects(self.filter)
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::new(CollisionGroups::ALL, CollisionGroups::ALL)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
