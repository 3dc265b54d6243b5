//! Bevy test app builders.

use bevy::prelude::*;
use cuberain_scene::config::CubeRainConfig;
use cuberain_scene::CubeRainPlugin;

/// App with the cube rain plugin and the given scene configuration.
pub fn rain_test_app(config: CubeRainConfig) -> App {
    let mut app = App::new();
    app.add_plugins(CubeRainPlugin::new(config));
    app.finish();
    app.cleanup();
    app
}

/// Run `n` app updates, one rain frame each.
pub fn step_n(app: &mut App, n: usize) {
    for _ in 0..n {
        app.update();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
