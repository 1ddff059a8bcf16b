//! Headless batch runs, no window and no renderer.

use bevy::prelude::*;
use teeter_character::fall::FallState;
use teeter_core::config::SceneConfig;
use teeter_core::error::ConfigError;
use tracing::info;

use crate::TeeterSimPlugin;
use crate::resources::{InputSource, LastStep, ResetRequest};
use crate::stats::RunStats;
use crate::status::RunStatus;

/// Batch parameters for [`run_headless`].
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub runs: u32,
    /// Step cap per run; a run still standing at the cap ends unfallen.
    pub max_steps: u32,
    pub input: InputSource,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            runs: 1,
            max_steps: 1_800,
            input: InputSource::Manual,
        }
    }
}

/// Outcome of one headless run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub run: u32,
    pub steps: u32,
    pub distance: f32,
    pub fell: bool,
}

/// Results of a whole batch.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    pub runs: Vec<RunSummary>,
    pub stats: RunStats,
}

/// Build an app around `scene` and play `config.runs` runs back to back.
pub fn run_headless(
    scene: SceneConfig,
    config: HeadlessConfig,
) -> Result<HeadlessReport, ConfigError> {
    scene.validate()?;

    let mut app = App::new();
    app.insert_resource(scene)
        .add_plugins(TeeterSimPlugin::default())
        .insert_resource(config.input);
    app.finish();
    app.cleanup();

    let mut runs = Vec::new();
    for i in 0..config.runs {
        if i > 0 {
            app.world_mut().resource_mut::<ResetRequest>().request();
        }
        let mut steps = 0;
        while steps < config.max_steps {
            app.update();
            steps += 1;
            let fell = app
                .world()
                .resource::<LastStep>()
                .0
                .is_some_and(|report| report.fell.is_some());
            if fell {
                break;
            }
        }

        let status = *app.world().resource::<RunStatus>();
        let summary = RunSummary {
            run: status.run,
            steps,
            distance: status.distance,
            fell: status.fall_state == FallState::Fallen,
        };
        info!(
            run = summary.run,
            steps = summary.steps,
            distance = summary.distance,
            fell = summary.fell,
            "run finished"
        );
        runs.push(summary);
    }

    Ok(HeadlessReport {
        runs,
        stats: app.world().resource::<RunStats>().clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_scene_rejected() {
        let mut scene = SceneConfig::default();
        scene.simulation.max_steps_per_frame = 0;
        assert!(run_headless(scene, HeadlessConfig::default()).is_err());
    }

    #[test]
    fn runs_are_numbered_and_capped() {
        let config = HeadlessConfig {
            runs: 2,
            max_steps: 30,
            input: InputSource::Manual,
        };
        let report = run_headless(SceneConfig::default(), config).unwrap();

        assert_eq!(report.runs.len(), 2);
        assert_eq!(report.runs[0].run, 1);
        assert_eq!(report.runs[1].run, 2);
        // Still settling at 500 ms, far too early to fall.
        assert!(report.runs.iter().all(|r| r.steps == 30 && !r.fell));
        assert_eq!(report.stats.total_steps, 60);
        assert_eq!(report.stats.runs_completed, 0);
    }

    #[test]
    fn falls_end_runs_early() {
        let mut scene = SceneConfig::default();
        // Any standing pose is already below this line.
        scene.character.fall.threshold = 10.0;
        let config = HeadlessConfig {
            runs: 3,
            max_steps: 100,
            input: InputSource::Manual,
        };
        let report = run_headless(scene, config).unwrap();

        assert!(report.runs.iter().all(|r| r.steps == 1 && r.fell));
        assert_eq!(report.stats.runs_completed, 3);
        assert_eq!(report.stats.scores.len(), 3);
    }
}
