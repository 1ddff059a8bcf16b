// teeter-physics: Engine-agnostic physics adapter for the teeter biped.
//
// The character talks to a `PhysicsAdapter` through opaque link and joint
// handles. `RapierAdapter` is the concrete planar backend over raw rapier3d.

pub mod backend;
pub mod error;
pub mod filter;
pub mod rapier;

pub use backend::{HingeAxis, JointDesc, JointHandle, LinkDesc, LinkHandle, PhysicsAdapter};
pub use error::PhysicsError;
pub use filter::{CollisionFilter, CollisionGroups};
pub use rapier::RapierAdapter;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        backend::{HingeAxis, JointDesc, JointHandle, LinkDesc, LinkHandle, PhysicsAdapter},
        error::PhysicsError,
        filter::{CollisionFilter, CollisionGroups},
        rapier::{RapierAdapter, RapierContext},
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
