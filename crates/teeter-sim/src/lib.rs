//! Bevy integration for the teeter biped.
//!
//! [`TeeterSimPlugin`] owns one [`Character`] (controller plus rapier world)
//! and steps it once per run of its schedule, publishing [`RunStatus`] for
//! the UI and [`LinkPoses`] for the renderer.
//!
//! # Example
//!
//! ```no_run
//! use bevy::prelude::*;
//! use teeter_sim::TeeterSimPlugin;
//!
//! App::new()
//!     .add_plugins(TeeterSimPlugin::default())
//!     .run();
//! ```

pub mod headless;
pub mod random;
pub mod resources;
pub mod script;
pub mod stats;
pub mod status;
pub mod systems;

use bevy::prelude::*;
use teeter_core::config::SceneConfig;
use teeter_core::{TeeterCorePlugin, TeeterSet};

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use headless::{HeadlessConfig, HeadlessReport, RunSummary, run_headless};
pub use random::RandomInput;
pub use resources::{
    Character, ControlInput, InputSource, LastStep, LinkPoses, ResetRequest, SimOptions,
};
pub use script::{InputScript, ScriptError};
pub use stats::RunStats;
pub use status::RunStatus;

// ---------------------------------------------------------------------------
// TeeterSimPlugin
// ---------------------------------------------------------------------------

/// Schedule the character is stepped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimSchedule {
    /// One step per `app.update()`. Used by headless runs and tests.
    #[default]
    Update,
    /// Frame-rate independent stepping. The plugin sets `Time<Fixed>` to
    /// the configured timestep.
    FixedUpdate,
}

/// Adds [`TeeterCorePlugin`] (if absent), the simulation resources and the
/// per-step systems.
///
/// The [`Character`] is built from the [`SceneConfig`] resource present
/// when the plugin is added.
///
/// # Panics
///
/// If that config fails validation. Hosts loading config from disk should
/// validate it first.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeeterSimPlugin {
    pub schedule: SimSchedule,
}

impl TeeterSimPlugin {
    pub const fn fixed() -> Self {
        Self {
            schedule: SimSchedule::FixedUpdate,
        }
    }
}

impl Plugin for TeeterSimPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<TeeterCorePlugin>() {
            app.add_plugins(TeeterCorePlugin);
        }

        let scene = app.world().resource::<SceneConfig>().clone();
        let character = match Character::from_scene(&scene) {
            Ok(character) => character,
            Err(err) => panic!("invalid scene config: {err}"),
        };

        app.insert_resource(character)
            .init_resource::<ControlInput>()
            .init_resource::<InputSource>()
            .init_resource::<ResetRequest>()
            .init_resource::<SimOptions>()
            .init_resource::<LastStep>()
            .init_resource::<RunStatus>()
            .init_resource::<RunStats>()
            .init_resource::<LinkPoses>();

        match self.schedule {
            SimSchedule::Update => add_sim_systems(app, Update),
            SimSchedule::FixedUpdate => {
                app.insert_resource(Time::<Fixed>::from_duration(
                    scene.simulation.step_duration(),
                ));
                add_sim_systems(app, FixedUpdate);
            }
        }
    }
}

fn add_sim_systems(app: &mut App, schedule: impl bevy::ecs::schedule::ScheduleLabel + Clone) {
    app.add_systems(
        schedule.clone(),
        (systems::reset_system, systems::input_source_system)
            .chain()
            .in_set(TeeterSet::Input),
    )
    .add_systems(
        schedule.clone(),
        systems::step_system.in_set(TeeterSet::Simulate),
    )
    .add_systems(
        schedule,
        (
            systems::status_system,
            systems::stats_system,
            systems::export_poses_system,
        )
            .in_set(TeeterSet::Report),
    );
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Character, ControlInput, HeadlessConfig, InputScript, InputSource, LastStep, LinkPoses,
        RandomInput, ResetRequest, RunStats, RunStatus, SimOptions, SimSchedule,
        TeeterSimPlugin,
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use teeter_character::fall::FallState;
    use teeter_character::stabilize::StabilizationPhase;
    use teeter_core::time::SimTime;
    use teeter_core::types::LinkId;

    fn app_with(scene: SceneConfig) -> App {
        let mut app = App::new();
        app.insert_resource(scene);
        app.add_plugins(TeeterSimPlugin::default());
        app.finish();
        app.cleanup();
        app
    }

    fn step_n(app: &mut App, n: usize) {
        for _ in 0..n {
            app.update();
        }
    }

    #[test]
    fn plugin_builds_without_panic() {
        let mut app = App::new();
        app.add_plugins(TeeterSimPlugin::default());
        app.finish();
        app.cleanup();

        assert!(app.world().get_resource::<Character>().is_some());
        assert!(app.world().get_resource::<RunStatus>().is_some());
        assert!(app.world().get_resource::<SimTime>().is_some());
    }

    #[test]
    fn first_update_spawns_and_steps() {
        let mut app = app_with(SceneConfig::default());
        app.update();

        let status = app.world().resource::<RunStatus>();
        assert_eq!(status.run, 1);
        assert_eq!(status.phase, StabilizationPhase::Initial);
        assert!(app.world().resource::<LastStep>().0.is_some());
        let poses = app.world().resource::<LinkPoses>();
        assert!(poses.0[LinkId::Torso].is_some());
        assert!(*app.world().resource::<SimTime>() > SimTime::ZERO);
    }

    #[test]
    fn settles_after_stabilization() {
        let mut app = app_with(SceneConfig::default());
        step_n(&mut app, 50);
        let status = app.world().resource::<RunStatus>();
        assert_eq!(status.phase, StabilizationPhase::Normal);
        assert_eq!(status.fall_state, FallState::Running);
    }

    #[test]
    fn reset_request_starts_new_run() {
        let mut app = app_with(SceneConfig::default());
        step_n(&mut app, 10);
        app.world_mut().resource_mut::<ResetRequest>().request();
        app.update();

        let status = app.world().resource::<RunStatus>();
        assert_eq!(status.run, 2);
        assert_eq!(status.phase, StabilizationPhase::Initial);
        assert!(!app.world().resource::<ResetRequest>().0);
    }

    #[test]
    fn fallen_run_waits_without_auto_reset() {
        let mut scene = SceneConfig::default();
        scene.character.fall.threshold = 10.0;
        let mut app = app_with(scene);
        step_n(&mut app, 3);

        let status = app.world().resource::<RunStatus>();
        assert_eq!(status.run, 1);
        assert!(status.is_over());
        assert_eq!(app.world().resource::<RunStats>().runs_completed, 1);
    }

    #[test]
    fn auto_reset_respawns_after_fall() {
        let mut scene = SceneConfig::default();
        scene.character.fall.threshold = 10.0;
        let mut app = app_with(scene);
        app.insert_resource(SimOptions { auto_reset: true });
        step_n(&mut app, 3);

        assert_eq!(app.world().resource::<RunStatus>().run, 3);
        assert_eq!(app.world().resource::<RunStats>().runs_completed, 3);
    }

    #[test]
    fn scripted_source_drives_input() {
        let mut app = app_with(SceneConfig::default());
        let script = InputScript::parse("q:0-100").unwrap();
        app.insert_resource(InputSource::Script(script));
        app.update();
        assert!(app.world().resource::<ControlInput>().0.left_thigh_drive);
        step_n(&mut app, 10);
        assert!(!app.world().resource::<ControlInput>().0.left_thigh_drive);
    }

    #[test]
    #[should_panic(expected = "invalid scene config")]
    fn invalid_config_panics_at_build() {
        let mut scene = SceneConfig::default();
        scene.character.body.knee_limits = [2.0, 1.0];
        app_with(scene);
    }
}
