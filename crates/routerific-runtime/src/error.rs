//! Runtime error types.

use routerific_core::RouteConfigError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while bootstrapping an application.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating the configuration failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A view or route could not be registered.
    #[error("route configuration error: {0}")]
    Route(#[from] RouteConfigError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
