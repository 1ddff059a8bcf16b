//! Bevy resources shared between the simulation systems and the host.

use bevy::prelude::*;
use teeter_character::controller::{CharacterController, StepReport};
use teeter_core::config::SceneConfig;
use teeter_core::error::ConfigError;
use teeter_core::types::{ControlInputState, LinkMap, Pose2};
use teeter_physics::RapierAdapter;

use crate::random::RandomInput;
use crate::script::InputScript;

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// The controller together with the physics world its skeleton lives in.
#[derive(Resource)]
pub struct Character {
    pub controller: CharacterController,
    pub physics: RapierAdapter,
}

impl Character {
    /// Validate `scene` and build an empty world. The skeleton is spawned
    /// by the first reset.
    pub fn from_scene(scene: &SceneConfig) -> Result<Self, ConfigError> {
        scene.validate()?;
        Ok(Self {
            controller: CharacterController::new(
                scene.character.clone(),
                scene.simulation.step_duration(),
            )?,
            physics: RapierAdapter::new(&scene.simulation),
        })
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Controls applied on the next step.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlInput(pub ControlInputState);

/// Where [`ControlInput`] comes from each step.
#[derive(Resource, Debug, Clone, Default)]
pub enum InputSource {
    /// Written by the host (keyboard, tests).
    #[default]
    Manual,
    Script(InputScript),
    Random(RandomInput),
}

// ---------------------------------------------------------------------------
// Reset and options
// ---------------------------------------------------------------------------

/// Set to respawn the character at the start of the next update.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetRequest(pub bool);

impl ResetRequest {
    pub const fn request(&mut self) {
        self.0 = true;
    }

    /// Clear the flag, returning whether it was set.
    pub const fn take(&mut self) -> bool {
        let pending = self.0;
        self.0 = false;
        pending
    }
}

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimOptions {
    /// Respawn automatically on the update after a fall.
    pub auto_reset: bool,
}

// ---------------------------------------------------------------------------
// Step output
// ---------------------------------------------------------------------------

/// Report of the most recent step, `None` right after a reset.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct LastStep(pub Option<StepReport>);

/// Renderer contract: pose of every live link.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct LinkPoses(pub LinkMap<Option<Pose2>>);

impl Default for LinkPoses {
    fn default() -> Self {
        Self(LinkMap::from_fn(|_| None))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_request_take_clears() {
        let mut request = ResetRequest::default();
        assert!(!request.take());
        request.request();
        assert!(request.take());
        assert!(!request.take());
    }

    #[test]
    fn character_rejects_invalid_scene() {
        let mut scene = SceneConfig::default();
        scene.simulation.timestep = 0.0;
        assert!(Character::from_scene(&scene).is_err());
    }

    #[test]
    fn character_starts_unspawned() {
        let character = Character::from_scene(&SceneConfig::default()).unwrap();
        assert!(character.controller.skeleton().is_none());
        assert_eq!(character.controller.run(), 0);
    }
}
