use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_gravity() -> [f32; 3] {
    [0.0, -9.81, 0.0]
}
const fn default_fixed_dt() -> f32 {
    1.0 / 60.0
}
const fn default_max_sub_steps() -> u32 {
    10
}

// ---------------------------------------------------------------------------
// PhysicsConfig
// ---------------------------------------------------------------------------

/// Dynamics world configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Gravity vector [x, y, z] in m/s^2.
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],

    /// Internal engine step in seconds (default: 1/60).
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f32,

    /// Upper bound on engine steps taken by a single `simulate` call.
    #[serde(default = "default_max_sub_steps")]
    pub max_sub_steps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            fixed_dt: default_fixed_dt(),
            max_sub_steps: default_max_sub_steps(),
        }
    }
}

impl PhysicsConfig {
    /// Same defaults with gravity switched off.
    pub fn weightless() -> Self {
        Self {
            gravity: [0.0; 3],
            ..Self::default()
        }
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(ConfigError::InvalidFixedDt(self.fixed_dt));
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(ConfigError::invalid("gravity", "components must be finite"));
        }
        Ok(())
    }

    /// Engine step rate in Hz.
    pub fn physics_hz(&self) -> f32 {
        1.0 / self.fixed_dt
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
