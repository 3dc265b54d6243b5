//! Bevy plugin wiring the physics world and the cube rain into an app.

use bevy::app::{App, Plugin, Update};

use cuberain_physics::world::PhysicsWorld;

use crate::config::CubeRainConfig;
use crate::rain::CubeRain;
use crate::stats::{cube_rain_step_system, RainStats};

/// Inserts [`PhysicsWorld`], [`CubeRain`] and [`RainStats`] and runs
/// [`cube_rain_step_system`] on every `Update`.
///
/// ```ignore
/// app.add_plugins(CubeRainPlugin::new(CubeRainConfig::default()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CubeRainPlugin {
    config: CubeRainConfig,
}

impl CubeRainPlugin {
    /// `config` is assumed validated.
    pub const fn new(config: CubeRainConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &CubeRainConfig {
        &self.config
    }
}

impl Plugin for CubeRainPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PhysicsWorld::new(&self.config.physics))
            .insert_resource(CubeRain::new(self.config.clone()))
            .init_resource::<RainStats>()
            .add_systems(Update, cube_rain_step_system);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
