//! Application bootstrap.
//!
//! [`Runtime`] loads and validates the configuration, installs the logging subscriber
//! and hands out router builders carrying the configured [`RouterOptions`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use routerific_runtime::Runtime;
//!
//! // Loads routerific.toml from the current directory, if any
//! let runtime = Runtime::new()?;
//!
//! // Custom configuration path
//! let runtime = Runtime::builder()
//!     .config_file("config/routerific.toml")
//!     .profile("production")
//!     .build()?;
//!
//! let router = runtime.build_router([index, detail])?;
//! ```

use std::path::Path;

use routerific_framework::{IntoView, Router, RouterBuilder, RouterOptions};
use tracing::info;

use crate::config::{ConfigLoader, RouterificConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// Validated configuration with logging initialized.
#[derive(Debug, Clone)]
pub struct Runtime {
    config: RouterificConfig,
}

impl Runtime {
    /// Creates a runtime from `routerific.*` in the current directory, the
    /// `ROUTERIFIC_*` environment and the defaults.
    pub fn new() -> RuntimeResult<Self> {
        let config = ConfigLoader::new().with_current_dir().load()?;
        Self::from_config(config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from a loaded configuration.
    ///
    /// Logging is only initialized if no global subscriber is installed yet.
    pub fn from_config(config: RouterificConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            max_body_bytes = ?config.routing.max_body_bytes,
            "Runtime initialized from configuration"
        );

        Ok(Self { config })
    }

    pub fn config(&self) -> &RouterificConfig {
        &self.config
    }

    /// Router options derived from the `routing` section.
    pub fn router_options(&self) -> RouterOptions {
        self.config.routing.to_options()
    }

    /// An empty router builder with the configured options.
    pub fn router_builder<R: 'static>(&self) -> RouterBuilder<R> {
        RouterBuilder::with_options(self.router_options())
    }

    /// Registers `views` in order and builds the router.
    ///
    /// # Errors
    ///
    /// Returns the first registration error; no router is built.
    pub fn build_router<R, I, V>(&self, views: I) -> RuntimeResult<Router<R>>
    where
        R: 'static,
        I: IntoIterator<Item = V>,
        V: IntoView<R>,
    {
        let mut builder = self.router_builder();
        builder.include(views)?;
        Ok(builder.build())
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`Runtime`] with custom configuration sources.
#[derive(Default)]
pub struct RuntimeBuilder {
    loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            loader: ConfigLoader::new(),
        }
    }

    /// Loads this file instead of searching for one.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    /// Adds a directory searched for `routerific.*`.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.search_path(path);
        self
    }

    /// Ignores `ROUTERIFIC_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    /// Merges a configuration over every other source.
    pub fn merge(mut self, config: RouterificConfig) -> Self {
        self.loader = self.loader.merge(config);
        self
    }

    pub fn build(self) -> RuntimeResult<Runtime> {
        let config = self.loader.load()?;
        Runtime::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use routerific_core::{Request, RouteConfigError};
    use routerific_framework::View;

    use super::*;
    use crate::config::ConfigError;
    use crate::error::RuntimeError;

    fn runtime() -> Runtime {
        let mut config = RouterificConfig::default();
        config.routing.max_body_bytes = Some(8);
        config.routing.header_underscore_fallback = false;
        Runtime::from_config(config).unwrap()
    }

    #[test]
    fn test_router_options_from_config() {
        let options = runtime().router_options();
        assert_eq!(options.max_body_bytes, Some(8));
        assert!(!options.header_underscore_fallback);
        assert_eq!(runtime().router_builder::<String>().options(), &options);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RouterificConfig::default();
        config.routing.max_body_bytes = Some(0);
        assert!(matches!(
            Runtime::from_config(config),
            Err(RuntimeError::Config(ConfigError::ValidationError { .. }))
        ));
    }

    #[test]
    fn test_build_router() {
        let router = runtime()
            .build_router([
                View::new("index", || "index".to_string()).route("GET", "/"),
                View::new("detail", |id: i64| format!("post {id}"))
                    .params(["id"])
                    .route("GET", "/blog/<int:id>"),
            ])
            .unwrap();

        assert_eq!(router.route_count(), 2);
        assert_eq!(router.dispatch(&Request::get("/blog/7")).unwrap(), "post 7");
        assert_eq!(router.dispatch(&Request::get("/")).unwrap(), "index");
    }

    #[test]
    fn test_build_router_reports_route_errors() {
        let result = runtime().build_router([View::new("detail", |id: i64| format!("{id}"))
            .params(["id"])
            .route("GET", "/blog/<int:id")]);
        assert!(matches!(
            result,
            Err(RuntimeError::Route(RouteConfigError::MalformedPlaceholder { .. }))
        ));
    }

    #[test]
    fn test_builder_merge() {
        let mut config = RouterificConfig::default();
        config.routing.log_rejections = true;

        let runtime = Runtime::builder()
            .search_path("/nonexistent")
            .without_env()
            .merge(config)
            .build()
            .unwrap();
        assert!(runtime.router_options().log_rejections);
    }
}
