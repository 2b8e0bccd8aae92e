//! Logging setup on `tracing-subscriber`.
//!
//! The router only emits `tracing` events: `info` when a routing table is built, a
//! `debug` span named `dispatch` per request, and candidate rejections at `debug` or
//! `trace` depending on `routing.log_rejections`. This module installs the subscriber
//! that prints them.
//!
//! ```rust,ignore
//! use routerific_runtime::config::{LogLevel, SpanEventConfig};
//! use routerific_runtime::logging::LoggingBuilder;
//!
//! LoggingBuilder::new()
//!     .level(LogLevel::Debug)
//!     .filter("routerific_framework", LogLevel::Trace)
//!     .span_events(SpanEventConfig::LIFECYCLE)
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig};

const DEFAULT_LOG_FILE: &str = "routerific.log";

/// Installs the global subscriber described by `config`.
///
/// Does nothing if a subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Subscriber setup, starting from a [`LoggingConfig`].
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    config: LoggingConfig,
    directives: Vec<String>,
    with_target: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::from_config(&LoggingConfig::default())
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            config: config.clone(),
            directives: Vec::new(),
            with_target: true,
        }
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Sets the level for one target, e.g. `routerific_framework`.
    pub fn filter(mut self, target: impl Into<String>, level: LogLevel) -> Self {
        self.config.filters.insert(target.into(), level);
        self
    }

    /// Adds a raw `EnvFilter` directive.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.config.output = output;
        self
    }

    /// Writes to `path` instead of a standard stream.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = LogOutput::File;
        self.config.file_path = Some(path.into());
        self
    }

    pub fn span_events(mut self, events: SpanEventConfig) -> Self {
        self.config.span_events = events;
        self
    }

    pub fn thread_ids(mut self, enabled: bool) -> Self {
        self.config.thread_ids = enabled;
        self
    }

    pub fn file_location(mut self, enabled: bool) -> Self {
        self.config.file_location = enabled;
        self
    }

    pub fn target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Filter directives in application order: per-target filters sorted by target,
    /// then raw directives.
    fn directives(&self) -> Vec<String> {
        let mut filters: Vec<_> = self.config.filters.iter().collect();
        filters.sort_by(|a, b| a.0.cmp(b.0));
        filters
            .into_iter()
            .map(|(target, level)| format!("{target}={level}"))
            .chain(self.directives.iter().cloned())
            .collect()
    }

    /// `RUST_LOG` when set, else the configured level, plus the directives.
    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_str()));
        for directive in self.directives() {
            match directive.parse() {
                Ok(parsed) => filter = filter.add_directive(parsed),
                Err(e) => eprintln!("Ignoring invalid log directive {directive:?}: {e}"),
            }
        }
        filter
    }

    fn writer(&self) -> BoxMakeWriter {
        match (self.config.output, &self.config.file_path) {
            (LogOutput::Stdout, _) | (LogOutput::File, None) => BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => {
                let dir = path
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .unwrap_or(Path::new("."));
                let name = path.file_name().unwrap_or(OsStr::new(DEFAULT_LOG_FILE));
                BoxMakeWriter::new(tracing_appender::rolling::never(dir, name))
            }
        }
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_span_events(fmt_span(&self.config.span_events))
            .with_target(self.with_target)
            .with_thread_ids(self.config.thread_ids)
            .with_file(self.config.file_location)
            .with_line_number(self.config.file_location);

        match self.config.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => layer.boxed(),
            LogFormat::Full => layer.boxed(),
        }
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber.
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(self.layer())
            .with(self.env_filter())
            .try_init()?;

        if cfg!(not(feature = "json-log")) && self.config.format == LogFormat::Json {
            warn!("JSON log format requires the `json-log` feature, using full format");
        }
        if self.config.output == LogOutput::File && self.config.file_path.is_none() {
            warn!("File output requested but no file path configured, using stdout");
        }
        Ok(())
    }
}

fn fmt_span(events: &SpanEventConfig) -> FmtSpan {
    [
        (events.new, FmtSpan::NEW),
        (events.enter, FmtSpan::ENTER),
        (events.exit, FmtSpan::EXIT),
        (events.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |acc, (_, span)| acc | span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_from_config() {
        let builder = LoggingBuilder::new()
            .filter("routerific_framework", LogLevel::Trace)
            .filter("routerific_core", LogLevel::Warn)
            .directive("hyper=off");

        assert_eq!(
            builder.directives(),
            [
                "routerific_core=warn",
                "routerific_framework=trace",
                "hyper=off"
            ]
        );
    }

    #[test]
    fn test_file_sets_output() {
        let builder = LoggingBuilder::new().file("logs/app.log");
        assert_eq!(builder.config.output, LogOutput::File);
        assert_eq!(builder.config.file_path, Some(PathBuf::from("logs/app.log")));
    }

    #[test]
    fn test_span_presets() {
        assert_eq!(fmt_span(&SpanEventConfig::NONE), FmtSpan::NONE);
        assert_eq!(fmt_span(&SpanEventConfig::ALL), FmtSpan::FULL);
        assert_eq!(
            fmt_span(&SpanEventConfig::LIFECYCLE),
            FmtSpan::NEW | FmtSpan::CLOSE
        );
    }
}
