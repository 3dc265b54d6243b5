use thiserror::Error;

/// Top-level error type for Cube Rain crates.
#[derive(Debug, Error)]
pub enum CubeRainError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),
}

/// Body construction errors.
///
/// Copy + static messages; these are raised before anything touches the
/// dynamics engine.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PhysicsError {
    #[error("Invalid shape: {0}")]
    InvalidShape(&'static str),

    #[error("Invalid mass: {0} (must be finite and >= 0)")]
    InvalidMass(f32),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid fixed_dt: {0} (must be > 0)")]
    InvalidFixedDt(f32),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
