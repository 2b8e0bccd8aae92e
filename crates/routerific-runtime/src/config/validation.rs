//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, RouterificConfig, RoutingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &RouterificConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_routing_config(&config.routing)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for target in logging.filters.keys() {
        if target.trim().is_empty() {
            return Err(ConfigError::validation("Log filter target cannot be empty"));
        }
        if target.contains(char::is_whitespace) || target.contains('=') {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {target:?}"
            )));
        }
    }

    Ok(())
}

fn validate_routing_config(routing: &RoutingConfig) -> ConfigResult<()> {
    if routing.max_body_bytes == Some(0) {
        return Err(ConfigError::validation(
            "routing.max_body_bytes must be greater than 0",
        ));
    }
    Ok(())
}
