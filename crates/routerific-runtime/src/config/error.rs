use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or validating a [`RouterificConfig`](super::RouterificConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file {0} does not exist")]
    FileNotFound(PathBuf),

    /// The file extension has no enabled format feature.
    #[error("unsupported configuration file format `.{0}`")]
    UnsupportedFormat(String),

    /// A source failed to parse, or a value has the wrong shape.
    #[error("{0}")]
    Extract(Box<figment::Error>),

    #[error("invalid configuration: {message}")]
    ValidationError { message: String },

    #[error("`{field}` is required")]
    MissingField { field: String },
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Extract(Box::new(e))
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
