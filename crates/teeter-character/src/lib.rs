//! Engine-agnostic control for the teeter biped.
//!
//! Everything here talks to physics through
//! [`PhysicsAdapter`](teeter_physics::PhysicsAdapter) and owns no engine
//! state, so the same controller drives rapier in the app and a call
//! recorder in tests.
//!
//! # Step Pipeline
//!
//! ```text
//! reset ─► Skeleton::build ─► stand holds + heavy damping
//!
//! step(input)
//!   ├─ StabilizationSequencer   Initial ─► Relaxing ─► Normal
//!   ├─ ImpulseGate::tick        per-channel refractory timers
//!   ├─ JointMotorController     hips/knees from input, gated kicks
//!   ├─ PhysicsAdapter::step
//!   ├─ BalanceController        shoulder PD target, gated arm swing
//!   └─ FallDetector             head below threshold ─► Fallen
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use teeter_character::prelude::*;
//!
//! let mut controller = CharacterController::new(config, timestep)?;
//! controller.reset(&mut physics);
//! let report = controller.step(&mut physics, ControlInputState::IDLE)?;
//! ```

pub mod balance;
pub mod controller;
pub mod fall;
pub mod gate;
pub mod motor;
pub mod skeleton;
pub mod stabilize;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::balance::{BalanceController, BalanceOutput};
    pub use crate::controller::{CharacterController, StepReport};
    pub use crate::fall::{FallDetector, FallState};
    pub use crate::gate::{ImpulseGate, KickChannel};
    pub use crate::motor::JointMotorController;
    pub use crate::skeleton::{BuildIssue, Skeleton, SkeletonLayout};
    pub use crate::stabilize::{StabilizationPhase, StabilizationSequencer};
}
