//! Line-oriented key/value store for the endpoint configuration
//!
//! The file holds two recognised lines, `SupabaseUrl=<url>` and `ApiKey=<key>`.
//! Anything else is ignored. `load` and `save` never fail: errors are logged and
//! reduced to defaults or a no-op.

use super::config::ForwarderConfig;
use super::{ForwarderError, ForwarderResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const URL_PREFIX: &str = "SupabaseUrl=";
const API_KEY_PREFIX: &str = "ApiKey=";

/// Directory (under the user's config dir) holding the config and diagnostic log
pub const APP_DIR_NAME: &str = "TimeLogger";
const CONFIG_FILE_NAME: &str = "config.txt";
const LOG_FILE_NAME: &str = "timelogger.log";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/TimeLogger/config.txt`
    pub fn default_location() -> Self {
        Self::new(app_dir().join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Diagnostic log file living next to the config file
    pub fn log_file_path(&self) -> PathBuf {
        self.path
            .parent()
            .map(|dir| dir.join(LOG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME))
    }

    /// Load the configuration, falling back to defaults on any error
    pub fn load(&self) -> ForwarderConfig {
        match self.try_load() {
            Ok(Some(config)) => {
                info!(path = %self.path.display(), "Loaded configuration");
                config
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No configuration file, using defaults");
                ForwarderConfig::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Error loading configuration: {}", e);
                ForwarderConfig::default()
            }
        }
    }

    /// Load the configuration; `Ok(None)` when the file does not exist
    pub fn try_load(&self) -> ForwarderResult<Option<ForwarderConfig>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(ForwarderError::config(format!(
                    "{} is not valid UTF-8",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(parse_config(&contents)))
    }

    /// Persist the configuration, logging instead of failing
    pub fn save(&self, config: &ForwarderConfig) {
        match self.try_save(config) {
            Ok(()) => info!(path = %self.path.display(), "Saved configuration"),
            Err(e) => warn!(path = %self.path.display(), "Error saving configuration: {}", e),
        }
    }

    /// Persist the configuration, overwriting any previous content
    pub fn try_save(&self, config: &ForwarderConfig) -> ForwarderResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, render_config(config))?;
        Ok(())
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn parse_config(contents: &str) -> ForwarderConfig {
    let mut config = ForwarderConfig::default();

    for line in contents.lines() {
        if let Some(url) = line.strip_prefix(URL_PREFIX) {
            config.endpoint_url = url.to_string();
        } else if let Some(key) = line.strip_prefix(API_KEY_PREFIX) {
            config.api_key = key.to_string();
        }
    }

    config
}

fn render_config(config: &ForwarderConfig) -> String {
    format!(
        "{}{}\n{}{}",
        URL_PREFIX, config.endpoint_url, API_KEY_PREFIX, config.api_key
    )
}
