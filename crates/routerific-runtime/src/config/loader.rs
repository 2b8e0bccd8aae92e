//! Layered configuration loading on figment.
//!
//! Lowest priority first: defaults, `routerific.{profile}.{ext}`, `routerific.{ext}`,
//! `ROUTERIFIC_*` variables, then in-code overrides. `toml` needs the `toml-config`
//! feature, `yaml`/`yml` need `yaml-config`.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::RouterificConfig;

const ENV_PREFIX: &str = "ROUTERIFIC_";
const PROFILE_VAR: &str = "ROUTERIFIC_PROFILE";
const FILE_STEM: &str = "routerific";

/// File extensions searched for, in order, for the enabled formats.
const EXTENSIONS: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "toml",
    #[cfg(feature = "yaml-config")]
    "yaml",
    #[cfg(feature = "yaml-config")]
    "yml",
];

/// A configuration profile such as `development` or `production`.
///
/// `dev` and `prod` are accepted as aliases; names are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile(String);

impl Profile {
    pub const DEVELOPMENT: &'static str = "development";
    pub const PRODUCTION: &'static str = "production";

    pub fn new(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "dev" | "" => Self(Self::DEVELOPMENT.to_owned()),
            "prod" => Self(Self::PRODUCTION.to_owned()),
            _ => Self(name),
        }
    }

    /// Reads `ROUTERIFIC_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|name| Self::new(&name))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self(Self::DEVELOPMENT.to_owned())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Layered configuration loading.
///
/// Sources, lowest priority first: defaults, the profile file, the main file,
/// `ROUTERIFIC_*` variables, then configurations passed to [`merge`](Self::merge).
pub struct ConfigLoader {
    profile: Profile,
    dirs: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
    overrides: Vec<RouterificConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            profile: Profile::from_env(),
            dirs: Vec::new(),
            file: None,
            env: true,
            overrides: Vec::new(),
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::new(profile.as_ref());
        self
    }

    /// Adds a directory searched for `routerific.*`.
    ///
    /// Without any, the current directory and the user config directory are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dirs.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds `<config dir>/routerific`, e.g. `~/.config/routerific` on Linux.
    pub fn with_user_config_dir(self) -> Self {
        match user_config_dir() {
            Some(dir) => self.search_path(dir),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Merges `config` over every other source.
    pub fn merge(mut self, config: RouterificConfig) -> Self {
        self.overrides.push(config);
        self
    }

    pub fn load(self) -> ConfigResult<RouterificConfig> {
        let config: RouterificConfig = self.figment()?.extract()?;

        debug!(
            profile = %self.profile,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    fn figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(RouterificConfig::default()));

        let files = match &self.file {
            Some(path) if !path.exists() => return Err(ConfigError::FileNotFound(path.clone())),
            Some(path) => vec![path.clone()],
            None => self.discover(),
        };
        if files.is_empty() {
            warn!("No configuration file found, using defaults");
        }
        for path in &files {
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_file(figment, path)?;
        }

        if self.env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["PROFILE"]).split("__"));
        }

        Ok(self
            .overrides
            .iter()
            .fold(figment, |figment, config| figment.merge(Serialized::defaults(config))))
    }

    /// The profile file and main file of the first directory and format that has
    /// either, profile file first.
    fn discover(&self) -> Vec<PathBuf> {
        let dirs = if self.dirs.is_empty() {
            std::env::current_dir()
                .into_iter()
                .chain(user_config_dir())
                .collect()
        } else {
            self.dirs.clone()
        };

        for dir in &dirs {
            for ext in EXTENSIONS {
                let found: Vec<PathBuf> = [
                    dir.join(format!("{FILE_STEM}.{}.{ext}", self.profile)),
                    dir.join(format!("{FILE_STEM}.{ext}")),
                ]
                .into_iter()
                .filter(|path| path.exists())
                .collect();
                if !found.is_empty() {
                    return found;
                }
            }
        }
        Vec::new()
    }
}

fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(FILE_STEM))
}

fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_owned())),
    }
}

/// Loads configuration from the default locations and environment.
pub fn load_config() -> ConfigResult<RouterificConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path` plus environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<RouterificConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================
