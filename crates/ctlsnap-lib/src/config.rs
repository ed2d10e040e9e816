//! Application configuration: TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enumerate;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str = "# ctlsnap configuration\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Control device listed when none is given. Default: "default".
    #[serde(default = "default_device")]
    pub device: String,

    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_device() -> String {
    "default".into()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: default_device(),
            pretty: true,
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The `device` field cannot name a control device.
    InvalidDevice(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidDevice(e) => write!(f, "Invalid device: {e}"),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ctlsnap"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Settings from the platform config file, or defaults. Problems with
    /// the file are logged, never fatal.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        let (config, warnings) = Self::load_from(&path);
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Read settings from `path`.
    ///
    /// A missing file yields defaults silently. An unreadable or malformed
    /// file yields defaults plus one warning naming the file.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (Self::default(), Vec::new());
            }
            Err(e) => {
                let warning = format!("cannot read {}, using defaults: {e}", path.display());
                return (Self::default(), vec![warning]);
            }
        };
        match toml::from_str(&contents) {
            Ok(config) => (config, Vec::new()),
            Err(e) => {
                let warning = format!(
                    "config parse error ({}), using defaults: {e}",
                    path.display()
                );
                (Self::default(), vec![warning])
            }
        }
    }

    /// Write settings to `path`, creating its directory.
    ///
    /// The file is staged next to `path` and renamed into place so a reader
    /// never sees half a file.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let body = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{body}");

        let staged = path.with_extension("toml.tmp");
        std::fs::write(&staged, &contents)?;
        if let Err(e) = std::fs::rename(&staged, path) {
            log::debug!("rename {} failed ({e}), writing in place", staged.display());
            let written = std::fs::write(path, &contents);
            let _ = std::fs::remove_file(&staged);
            written?;
        }
        log::debug!("saved config to {}", path.display());
        Ok(())
    }

    /// Write settings to the platform config file.
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "No config directory")
        })?;
        self.save_to(&path)
    }

    /// Validate the config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = enumerate::validate_device_name(&self.device) {
            errors.push(ValidationError::InvalidDevice(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
