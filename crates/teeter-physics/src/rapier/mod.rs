//! Raw `rapier3d` physics backend.
//!
//! This module implements [`PhysicsAdapter`](crate::backend::PhysicsAdapter)
//! using the `rapier3d` crate directly (not `bevy_rapier3d`). We own the
//! [`PhysicsPipeline`](rapier3d::pipeline::PhysicsPipeline), call `step()`
//! ourselves, and constrain every link to the sagittal plane.

pub mod adapter;
pub mod context;

pub use adapter::RapierAdapter;
pub use context::RapierContext;
