//! All rapier pipeline state plus the static ground.

use bevy::math::Vec3;
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, Group, ImpulseJointSet,
    IntegrationParameters, InteractionGroups, InteractionTestMode, IslandManager,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, RigidBodyBuilder, RigidBodyHandle,
    RigidBodySet,
};
use teeter_core::config::SimConfig;

use crate::filter::CollisionFilter;

/// Half extents of the ground slab along x and z.
const GROUND_HALF_WIDTH: f32 = 500.0;
const GROUND_HALF_DEPTH: f32 = 1.0;
const GROUND_HALF_THICKNESS: f32 = 0.5;

// ---------------------------------------------------------------------------
// RapierContext
// ---------------------------------------------------------------------------

/// Every rapier set and pipeline object in one place.
///
/// `PhysicsPipeline::step()` requires mutable access to every set
/// simultaneously, so they must all live together.
pub struct RapierContext {
    // -- Rapier sets --
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,

    // -- Pipeline objects --
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub ccd_solver: CCDSolver,

    // -- Parameters --
    pub integration_parameters: IntegrationParameters,
    pub gravity: Vec3,

    ground: RigidBodyHandle,
}

impl RapierContext {
    /// Create a world with gravity, timestep and ground taken from `config`.
    ///
    /// The ground's top surface sits at `config.ground_level`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(config: &SimConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.timestep as f32;

        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();

        let ground = rigid_body_set.insert(
            RigidBodyBuilder::fixed()
                .translation(Vec3::new(
                    0.0,
                    config.ground_level - GROUND_HALF_THICKNESS,
                    0.0,
                ))
                .build(),
        );
        let ground_collider =
            ColliderBuilder::cuboid(GROUND_HALF_WIDTH, GROUND_HALF_THICKNESS, GROUND_HALF_DEPTH)
                .friction(config.ground_friction)
                .collision_groups(interaction_groups(CollisionFilter::GROUND))
                .build();
        collider_set.insert_with_parent(ground_collider, ground, &mut rigid_body_set);

        let gravity = config.gravity_vec();

        Self {
            rigid_body_set,
            collider_set,
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            integration_parameters,
            gravity: Vec3::new(gravity.x, gravity.y, 0.0),
            ground,
        }
    }

    /// Handle of the static ground body.
    pub const fn ground(&self) -> RigidBodyHandle {
        self.ground
    }

    /// Timestep in seconds.
    pub const fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Remove a body with its colliders and attached joints. Returns `false`
    /// if the body was already gone.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    /// Run one physics step.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }
}

/// Translate a [`CollisionFilter`] into rapier's group representation.
pub(crate) fn interaction_groups(filter: CollisionFilter) -> InteractionGroups {
    InteractionGroups::new(
        Group::from_bits_truncate(filter.memberships.bits()),
        Group::from_bits_truncate(filter.filter.bits()),
        InteractionTestMode::And,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_context_has_only_ground() {
        let ctx = RapierContext::new(&SimConfig::default());
        assert_eq!(ctx.rigid_body_set.len(), 1);
        assert_eq!(ctx.collider_set.len(), 1);
        assert!(ctx.rigid_body_set.get(ctx.ground()).is_some());
    }

    #[test]
    fn ground_top_surface_at_configured_level() {
        let config = SimConfig {
            ground_level: -2.0,
            ..SimConfig::default()
        };
        let ctx = RapierContext::new(&config);
        let body = &ctx.rigid_body_set[ctx.ground()];
        assert_relative_eq!(body.translation().y + GROUND_HALF_THICKNESS, -2.0);
    }

    #[test]
    fn timestep_and_gravity_from_config() {
        let ctx = RapierContext::new(&SimConfig::default());
        assert_relative_eq!(ctx.dt(), 1.0 / 60.0);
        assert_relative_eq!(ctx.gravity.y, -9.81);
        assert_relative_eq!(ctx.gravity.z, 0.0);
    }

    #[test]
    fn remove_missing_body_is_false() {
        let mut ctx = RapierContext::new(&SimConfig::default());
        let ground = ctx.ground();
        assert!(ctx.remove_body(ground));
        assert!(!ctx.remove_body(ground));
    }

    #[test]
    fn step_on_empty_world_does_not_panic() {
        let mut ctx = RapierContext::new(&SimConfig::default());
        for _ in 0..10 {
            ctx.step();
        }
    }
}
