// teeter-core: Identity types, configuration, errors and simulated time for the
// teeter biped.

pub mod config;
pub mod error;
pub mod time;
pub mod types;

use bevy::prelude::*;

// ---------------------------------------------------------------------------
// TeeterSet
// ---------------------------------------------------------------------------

/// Per-step system ordering: input is sampled, the character is stepped,
/// then results are published to the renderer/UI resources.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeeterSet {
    Input,
    Simulate,
    Report,
}

// ---------------------------------------------------------------------------
// TeeterCorePlugin
// ---------------------------------------------------------------------------

/// Configures [`TeeterSet`] ordering on `Update` and `FixedUpdate` and
/// inserts the shared resources.
///
/// A [`SceneConfig`](config::SceneConfig) inserted before this plugin is
/// kept; otherwise the defaults are used.
pub struct TeeterCorePlugin;

impl Plugin for TeeterCorePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (TeeterSet::Input, TeeterSet::Simulate, TeeterSet::Report).chain(),
        )
        .configure_sets(
            FixedUpdate,
            (TeeterSet::Input, TeeterSet::Simulate, TeeterSet::Report).chain(),
        )
        .init_resource::<time::SimTime>();

        if !app.world().contains_resource::<config::SceneConfig>() {
            app.insert_resource(config::SceneConfig::default());
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        TeeterCorePlugin, TeeterSet,
        config::{CharacterConfig, SceneConfig, SimConfig},
        error::{ConfigError, SimError, ValidationError},
        time::{SimTime, StepClock},
        types::{
            ControlInputState, JointId, JointLimits, JointMap, LinkId, LinkMap, LinkShape,
            MotorState, Pose2, Side,
        },
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
