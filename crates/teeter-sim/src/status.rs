//! [`RunStatus`]: what a HUD shows for the current run.

use bevy::prelude::*;
use teeter_character::controller::CharacterController;
use teeter_character::fall::FallState;
use teeter_character::stabilize::StabilizationPhase;
use teeter_core::time::SimTime;

/// UI contract, refreshed once per update after the step.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStatus {
    /// Run number, 0 before the first spawn.
    pub run: u32,
    pub time: SimTime,
    /// Torso x travelled since spawn.
    pub distance: f32,
    pub phase: StabilizationPhase,
    pub fall_state: FallState,
    /// Distance at the moment of falling.
    pub final_score: Option<f32>,
}

impl RunStatus {
    pub const fn from_controller(controller: &CharacterController) -> Self {
        Self {
            run: controller.run(),
            time: controller.time(),
            distance: controller.distance(),
            phase: controller.phase(),
            fall_state: controller.fall_state(),
            final_score: controller.final_score(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.fall_state == FallState::Fallen
    }

    /// One-line HUD text.
    pub fn summary(&self) -> String {
        match self.final_score {
            Some(score) => format!("run {} fell at {score:.2} m", self.run),
            None => format!(
                "run {} {:.2} m [{}] {}",
                self.run, self.distance, self.phase, self.time
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use teeter_core::config::CharacterConfig;

    #[test]
    fn default_is_pre_spawn() {
        let status = RunStatus::default();
        assert_eq!(status.run, 0);
        assert!(!status.is_over());
        assert_eq!(status.final_score, None);
    }

    #[test]
    fn mirrors_unspawned_controller() {
        let controller =
            CharacterController::new(CharacterConfig::default(), Duration::from_millis(10))
                .unwrap();
        assert_eq!(RunStatus::from_controller(&controller), RunStatus::default());
    }

    #[test]
    fn summary_reports_score_once_fallen() {
        let status = RunStatus {
            run: 3,
            fall_state: FallState::Fallen,
            final_score: Some(1.234),
            ..RunStatus::default()
        };
        assert_eq!(status.summary(), "run 3 fell at 1.23 m");
    }
}
