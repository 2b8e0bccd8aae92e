//! Application bootstrap: configuration, logging, and configured routers.
//!
//! [`Runtime`] loads a [`RouterificConfig`], installs the subscriber described by its
//! `logging` table, and hands out routers built with its `routing` options.
//!
//! # Where configuration comes from
//!
//! Later sources win:
//!
//! 1. Built-in defaults
//! 2. `routerific.{profile}.toml` then `routerific.toml` (`toml-config` feature),
//!    or the `.yaml` variants (`yaml-config` feature)
//! 3. `ROUTERIFIC_*` environment variables, with `__` between keys
//!    (`ROUTERIFIC_ROUTING__MAX_BODY_BYTES=4096`)
//! 4. Configurations merged in code
//!
//! ```ignore
//! use routerific_runtime::Runtime;
//!
//! fn main() -> routerific_runtime::RuntimeResult<()> {
//!     let runtime = Runtime::new()?;
//!     let router = runtime.build_router([index, detail])?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LoggingConfig, RouterificConfig, RoutingConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, init_from_config};
pub use runtime::{Runtime, RuntimeBuilder};

pub use tracing;
pub use tracing_subscriber;

/// `tracing` macros, for applications that log next to the router.
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
