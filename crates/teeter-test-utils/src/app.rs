//! Bevy test app builders and stepping helpers.

use bevy::prelude::*;
use teeter_core::config::SceneConfig;
use teeter_sim::{ResetRequest, TeeterSimPlugin};

/// Create a minimal test app with only the core plugin.
///
/// Provides `TeeterSet` system ordering and core resources but no
/// character.
pub fn minimal_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(teeter_core::TeeterCorePlugin);
    app.finish();
    app.cleanup();
    app
}

/// Create an app stepping one character per `update()` with `scene`.
pub fn sim_test_app(scene: SceneConfig) -> App {
    let mut app = App::new();
    app.insert_resource(scene);
    app.add_plugins(TeeterSimPlugin::default());
    app.finish();
    app.cleanup();
    app
}

/// Run `n` updates.
pub fn step_n(app: &mut App, n: usize) {
    for _ in 0..n {
        app.update();
    }
}

/// Ask for a respawn on the next update.
pub fn request_reset(app: &mut App) {
    app.world_mut().resource_mut::<ResetRequest>().request();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
