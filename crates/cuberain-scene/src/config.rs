use serde::{Deserialize, Serialize};

use cuberain_physics::config::PhysicsConfig;
use cuberain_physics::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_cube_count() -> usize {
    300
}
const fn default_max_cube_count() -> usize {
    1500
}
const fn default_frame_dt() -> f32 {
    1.0 / 60.0
}
const fn default_fall_off_threshold() -> f32 {
    -10.0
}
const fn default_highlight_ms() -> u64 {
    250
}
const fn default_time_dilation() -> f32 {
    1.0
}
const fn default_spawn_half_width() -> u32 {
    7
}
const fn default_spawn_floor() -> i32 {
    7
}
const fn default_spawn_layers() -> u32 {
    30
}
const fn default_base_fall_speed() -> f32 {
    3.0
}
const fn default_cube_mass() -> f32 {
    1.0
}

// ---------------------------------------------------------------------------
// CubeRainConfig
// ---------------------------------------------------------------------------

/// Scene configuration for the falling-cube demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeRainConfig {
    /// Dynamics settings. Gravity is off by default: cubes fall at their
    /// spawn velocity.
    #[serde(default = "PhysicsConfig::weightless")]
    pub physics: PhysicsConfig,

    /// Cubes kept in the pool.
    #[serde(default = "default_cube_count")]
    pub cube_count: usize,

    /// Upper bound for `cube_count`.
    #[serde(default = "default_max_cube_count")]
    pub max_cube_count: usize,

    /// Spawn RNG seed.
    #[serde(default)]
    pub seed: u64,

    /// Frame time fed to the world each update, in seconds.
    #[serde(default = "default_frame_dt")]
    pub frame_dt: f32,

    /// Cubes below this height are respawned at the top.
    #[serde(default = "default_fall_off_threshold")]
    pub fall_off_threshold: f32,

    /// How long a cube stays highlighted after its last impact.
    #[serde(default = "default_highlight_ms")]
    pub highlight_ms: u64,

    /// Simulation speed multiplier; 0 pauses physics.
    #[serde(default = "default_time_dilation")]
    pub time_dilation: f32,

    /// Spawn x and z are whole numbers in `[-spawn_half_width, spawn_half_width]`.
    #[serde(default = "default_spawn_half_width")]
    pub spawn_half_width: u32,

    /// Lowest spawn height.
    #[serde(default = "default_spawn_floor")]
    pub spawn_floor: i32,

    /// Spawn y is a whole number in `[spawn_floor, spawn_floor + spawn_layers)`.
    #[serde(default = "default_spawn_layers")]
    pub spawn_layers: u32,

    /// Downward speed of a unit cube; smaller cubes fall faster.
    #[serde(default = "default_base_fall_speed")]
    pub base_fall_speed: f32,

    #[serde(default = "default_cube_mass")]
    pub cube_mass: f32,
}

impl Default for CubeRainConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::weightless(),
            cube_count: default_cube_count(),
            max_cube_count: default_max_cube_count(),
            seed: 0,
            frame_dt: default_frame_dt(),
            fall_off_threshold: default_fall_off_threshold(),
            highlight_ms: default_highlight_ms(),
            time_dilation: default_time_dilation(),
            spawn_half_width: default_spawn_half_width(),
            spawn_floor: default_spawn_floor(),
            spawn_layers: default_spawn_layers(),
            base_fall_speed: default_base_fall_speed(),
            cube_mass: default_cube_mass(),
        }
    }
}

impl CubeRainConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        if self.cube_count > self.max_cube_count {
            return Err(ConfigError::invalid(
                "cube_count",
                format!("{} exceeds max_cube_count {}", self.cube_count, self.max_cube_count),
            ));
        }
        if !(self.frame_dt.is_finite() && self.frame_dt > 0.0) {
            return Err(ConfigError::invalid("frame_dt", "must be > 0"));
        }
        if !(self.time_dilation.is_finite() && self.time_dilation >= 0.0) {
            return Err(ConfigError::invalid("time_dilation", "must be >= 0"));
        }
        if self.spawn_layers == 0 {
            return Err(ConfigError::invalid("spawn_layers", "must be >= 1"));
        }
        if i32::try_from(self.spawn_half_width).is_err() {
            return Err(ConfigError::invalid("spawn_half_width", "too large"));
        }
        if self.spawn_floor.checked_add_unsigned(self.spawn_layers).is_none() {
            return Err(ConfigError::invalid("spawn_layers", "spawn range overflows"));
        }
        if !(self.cube_mass.is_finite() && self.cube_mass > 0.0) {
            return Err(ConfigError::invalid("cube_mass", "must be > 0"));
        }
        if !self.fall_off_threshold.is_finite() || !self.base_fall_speed.is_finite() {
            return Err(ConfigError::invalid(
                "fall_off_threshold",
                "threshold and fall speed must be finite",
            ));
        }
        Ok(())
    }

    /// Highlight lifetime in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn highlight_secs(&self) -> f64 {
        self.highlight_ms as f64 / 1000.0
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_and_weightless() {
        let config = CubeRainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.physics.gravity, [0.0; 3]);
        assert_eq!(config.cube_count, 300);
        assert_eq!((config.spawn_half_width, config.spawn_floor, config.spawn_layers), (7, 7, 30));
        assert!((config.highlight_secs() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn rejects_too_many_cubes() {
        let config = CubeRainConfig {
            cube_count: 2000,
            ..CubeRainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "cube_count"
        ));
    }

    #[test]
    fn rejects_negative_dilation() {
        let config = CubeRainConfig {
            time_dilation: -1.0,
            ..CubeRainConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_spawn_range() {
        let config = CubeRainConfig {
            spawn_layers: 0,
            ..CubeRainConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nested_physics_errors_propagate() {
        let config = CubeRainConfig {
            physics: PhysicsConfig {
                fixed_dt: 0.0,
                ..PhysicsConfig::weightless()
            },
            ..CubeRainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFixedDt(_))
        ));
    }

    #[test]
    fn toml_overrides_and_defaults() {
        let config = CubeRainConfig::from_toml_str(
            r"
            cube_count = 12
            seed = 99

            [physics]
            max_sub_steps = 3
            ",
        )
        .unwrap();
        assert_eq!(config.cube_count, 12);
        assert_eq!(config.seed, 99);
        assert_eq!(config.physics.max_sub_steps, 3);
        // Nested table falls back to field defaults, so gravity comes back.
        assert_eq!(config.physics.gravity, [0.0, -9.81, 0.0]);
        assert_eq!(config.highlight_ms, 250);
    }

    #[test]
    fn missing_physics_table_stays_weightless() {
        let config = CubeRainConfig::from_toml_str("cube_count = 5\n").unwrap();
        assert_eq!(config.physics.gravity, [0.0; 3]);
    }
}
