// cuberain-scene: Falling-cube demo driven by cuberain-physics.
//
// Keeps a pool of cubes raining through a weightless world, highlights cubes
// while they touch something and for a short while after, respawns cubes
// that fall past the floor and exposes the whole thing as a Bevy plugin.

pub mod config;
pub mod cube;
pub mod highlight;
pub mod plugin;
pub mod rain;
pub mod stats;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        config::CubeRainConfig,
        cube::{CubeId, CubeObject, SceneEntity},
        highlight::{CollectedContacts, ContactCollector, Highlights},
        plugin::CubeRainPlugin,
        rain::{CubeRain, CubeSlot, FrameReport},
        stats::{cube_rain_step_system, RainStats},
    };
}

pub use plugin::CubeRainPlugin;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
