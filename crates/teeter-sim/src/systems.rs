//! Per-update systems, in [`TeeterSet`](teeter_core::TeeterSet) order:
//!
//! ```text
//! Input:    reset_system ─► input_source_system
//! Simulate: step_system
//! Report:   status_system, stats_system, export_poses_system
//! ```

use bevy::prelude::*;
use teeter_character::fall::FallState;
use teeter_core::time::SimTime;
use tracing::warn;

use crate::resources::{
    Character, ControlInput, InputSource, LastStep, LinkPoses, ResetRequest, SimOptions,
};
use crate::stats::RunStats;
use crate::status::RunStatus;

/// Spawn on the first update, on request, or after a fall when
/// [`SimOptions::auto_reset`] is set.
#[allow(clippy::needless_pass_by_value)]
pub fn reset_system(
    mut character: ResMut<Character>,
    mut request: ResMut<ResetRequest>,
    options: Res<SimOptions>,
    mut last: ResMut<LastStep>,
) {
    let Character {
        controller,
        physics,
    } = &mut *character;
    let requested = request.take();
    let unspawned = controller.skeleton().is_none();
    let fell = options.auto_reset && controller.fall_state() == FallState::Fallen;
    if requested || unspawned || fell {
        controller.reset(physics);
        last.0 = None;
    }
}

/// Fill [`ControlInput`] from the active [`InputSource`].
#[allow(clippy::needless_pass_by_value)]
pub fn input_source_system(
    character: Res<Character>,
    mut source: ResMut<InputSource>,
    mut input: ResMut<ControlInput>,
) {
    let controller = &character.controller;
    match &mut *source {
        InputSource::Manual => {}
        InputSource::Script(script) => input.0 = script.sample(controller.time()),
        InputSource::Random(random) => input.0 = random.sample(controller.run()),
    }
}

/// Advance the character one fixed step.
#[allow(clippy::needless_pass_by_value)]
pub fn step_system(
    mut character: ResMut<Character>,
    input: Res<ControlInput>,
    mut last: ResMut<LastStep>,
    mut time: ResMut<SimTime>,
) {
    let Character {
        controller,
        physics,
    } = &mut *character;
    match controller.step(physics, input.0) {
        Ok(report) => {
            *time = report.time;
            last.0 = Some(report);
        }
        Err(error) => {
            warn!(%error, "character step skipped");
            last.0 = None;
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn status_system(character: Res<Character>, mut status: ResMut<RunStatus>) {
    *status = RunStatus::from_controller(&character.controller);
}

/// Count steps and record each fall's final score.
#[allow(clippy::needless_pass_by_value)]
pub fn stats_system(last: Res<LastStep>, mut stats: ResMut<RunStats>) {
    let Some(report) = last.0 else {
        return;
    };
    stats.total_steps += 1;
    if let Some(score) = report.fell {
        stats.record_fall(score);
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn export_poses_system(character: Res<Character>, mut poses: ResMut<LinkPoses>) {
    poses.0 = character.controller.link_poses(&character.physics);
}
