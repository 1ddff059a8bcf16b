use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid timestep: {0} (must be finite and > 0)")]
    InvalidTimestep(f64),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid limits for {joint}: {source}")]
    InvalidLimits {
        joint: &'static str,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Simulation runtime errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("No skeleton: reset has not been called")]
    NotSpawned,
}

/// Value-level validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValidationError {
    #[error("Joint limits inverted: min {min} > max {max}")]
    InvertedLimits { min: f32, max: f32 },

    #[error("Non-finite {0}")]
    NonFinite(&'static str),
}
