//! Integration test: the sim plugin driven through whole Bevy apps.
//!
//! Checks that:
//! 1. Random input replays identically for a given seed
//! 2. Scripted kicks reach the physics world
//! 3. Stats accumulate across auto-reset runs

use teeter_core::config::SceneConfig;
use teeter_core::types::LinkId;
use teeter_sim::prelude::*;
use teeter_test_utils::{request_reset, sim_test_app, step_n};

fn random_app(seed: u64) -> bevy::app::App {
    let mut app = sim_test_app(SceneConfig::default());
    app.insert_resource(InputSource::Random(RandomInput::new(seed, 0.1)));
    app
}

#[test]
fn random_input_replays_per_seed() {
    let mut a = random_app(11);
    let mut b = random_app(11);
    step_n(&mut a, 180);
    step_n(&mut b, 180);

    assert_eq!(
        a.world().resource::<RunStatus>(),
        b.world().resource::<RunStatus>()
    );
    assert_eq!(
        a.world().resource::<LinkPoses>(),
        b.world().resource::<LinkPoses>()
    );
}

#[test]
fn reset_restores_spawn_pose() {
    let mut app = random_app(5);
    step_n(&mut app, 120);
    request_reset(&mut app);
    app.update();

    let status = *app.world().resource::<RunStatus>();
    assert_eq!(status.run, 2);
    assert_eq!(status.final_score, None);
    let torso = app.world().resource::<LinkPoses>().0[LinkId::Torso].unwrap();
    // One step of free fall under the stand holds at most.
    assert!((torso.position.x).abs() < 1e-3, "{torso:?}");
    assert!((torso.position.y + 3.5).abs() < 1e-2, "{torso:?}");
}

#[test]
fn scripted_kicks_fire_after_settling() {
    let mut app = sim_test_app(SceneConfig::default());
    let script = InputScript::parse("q:800-1300").unwrap();
    app.insert_resource(InputSource::Script(script));

    let mut kicks = 0;
    for _ in 0..90 {
        app.update();
        kicks += app
            .world()
            .resource::<LastStep>()
            .0
            .map_or(0, |report| report.kicks);
    }
    assert!(kicks >= 1, "no kicks fired");
    assert!(kicks <= 7, "{kicks} kicks in 500 ms");
}

#[test]
fn stats_accumulate_across_auto_resets() {
    let mut scene = SceneConfig::default();
    scene.character.fall.threshold = 10.0;
    let mut app = sim_test_app(scene);
    app.insert_resource(SimOptions { auto_reset: true });
    step_n(&mut app, 4);

    let stats = app.world().resource::<RunStats>();
    assert_eq!(stats.runs_completed, 4);
    assert_eq!(stats.total_steps, 4);
    assert!(stats.best().is_some());
}
