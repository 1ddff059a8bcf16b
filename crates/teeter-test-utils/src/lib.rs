//! Shared test fixtures for teeter crates.
//!
//! Provides a recording [`PhysicsAdapter`](teeter_physics::PhysicsAdapter)
//! double for controller tests and helpers for building Bevy test apps.

pub mod app;
pub mod mocks;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use app::{minimal_test_app, request_reset, sim_test_app, step_n};
pub use mocks::{MockPhysics, PhysicsCall};
