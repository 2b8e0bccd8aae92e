//! Configuration module for the Routerific runtime.
//!
//! This module provides figment-based configuration loading and validation for the
//! logging setup and the router's behaviour switches.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, RouterificConfig, RoutingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
