use thiserror::Error;

/// Setup-time failures. Everything past setup is total and reports misses as
/// empty results instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("maze needs at least one cell along {axis}, got {value}")]
    TooSmall { axis: &'static str, value: usize },

    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("safepoint fraction must be in (0, 1], got {0}")]
    InvalidFraction(f32),

    #[error("could not parse {key}={value:?}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
