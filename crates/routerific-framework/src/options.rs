//! Router behaviour switches.

/// Options affecting how guards resolve and how the router logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOptions {
    /// Bodies larger than this fail body guards softly.
    pub max_body_bytes: Option<usize>,
    /// A header guard named `x_token` also tries `X-TOKEN`.
    pub header_underscore_fallback: bool,
    /// Log rejected candidates at `debug` instead of `trace`.
    pub log_rejections: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            max_body_bytes: None,
            header_underscore_fallback: true,
            log_rejections: false,
        }
    }
}

impl RouterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    pub fn header_underscore_fallback(mut self, enabled: bool) -> Self {
        self.header_underscore_fallback = enabled;
        self
    }

    pub fn log_rejections(mut self, enabled: bool) -> Self {
        self.log_rejections = enabled;
        self
    }
}
