//! INI configuration file (`~/.swcatalog/config.ini`).
//!
//! ```ini
//! [catalog]
//! url = https://swscan.apple.com/content/catalogs/others/index-...sucatalog
//!
//! [download]
//! workdir = /private/tmp
//! mirror = 10.0.1.20:49232
//! discover_mirror = true
//! user_agent = MacAppStore/3.0 ...
//!
//! [run]
//! target_version = 10.15
//! machine_model = MacBookPro15,1
//! error_grace_secs = 10
//! installer_only = false
//!
//! [logging]
//! directory = /var/log/swcatalog
//! ```
//!
//! Every key is optional; missing keys fall back to [`RunConfig::default`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::RunConfig;

/// Errors reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The file could not be written.
    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A key holds a value of the wrong type.
    #[error("invalid value for [{section}] {key}: {value}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

/// Location of the user config file.
pub fn config_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".swcatalog")
        .join("config.ini")
}

/// Settings persisted in the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    /// `[catalog] url`
    pub catalog_url: Option<String>,
    /// `[download] workdir`
    pub workdir: Option<PathBuf>,
    /// `[download] mirror`
    pub mirror: Option<String>,
    /// `[download] discover_mirror`
    pub discover_mirror: Option<bool>,
    /// `[download] user_agent`
    pub user_agent: Option<String>,
    /// `[run] target_version`
    pub target_version: Option<String>,
    /// `[run] machine_model`
    pub machine_model: Option<String>,
    /// `[run] error_grace_secs`
    pub error_grace_secs: Option<u64>,
    /// `[run] installer_only`
    pub installer_only: Option<bool>,
    /// `[logging] directory`
    pub log_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Load the user config file; a missing file yields the empty config.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load a config file from `path`; a missing file yields the empty config.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            catalog_url: get_string(&ini, "catalog", "url"),
            workdir: get_string(&ini, "download", "workdir").map(PathBuf::from),
            mirror: get_string(&ini, "download", "mirror"),
            discover_mirror: get_bool(&ini, "download", "discover_mirror")?,
            user_agent: get_string(&ini, "download", "user_agent"),
            target_version: get_string(&ini, "run", "target_version"),
            machine_model: get_string(&ini, "run", "machine_model"),
            error_grace_secs: get_u64(&ini, "run", "error_grace_secs")?,
            installer_only: get_bool(&ini, "run", "installer_only")?,
            log_dir: get_string(&ini, "logging", "directory").map(PathBuf::from),
        })
    }

    /// Save to the user config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut ini = Ini::new();
        set_opt(&mut ini, "catalog", "url", self.catalog_url.clone());
        set_opt(
            &mut ini,
            "download",
            "workdir",
            self.workdir.as_ref().map(|p| p.display().to_string()),
        );
        set_opt(&mut ini, "download", "mirror", self.mirror.clone());
        set_opt(
            &mut ini,
            "download",
            "discover_mirror",
            self.discover_mirror.map(|b| b.to_string()),
        );
        set_opt(&mut ini, "download", "user_agent", self.user_agent.clone());
        set_opt(&mut ini, "run", "target_version", self.target_version.clone());
        set_opt(&mut ini, "run", "machine_model", self.machine_model.clone());
        set_opt(
            &mut ini,
            "run",
            "error_grace_secs",
            self.error_grace_secs.map(|s| s.to_string()),
        );
        set_opt(
            &mut ini,
            "run",
            "installer_only",
            self.installer_only.map(|b| b.to_string()),
        );
        set_opt(
            &mut ini,
            "logging",
            "directory",
            self.log_dir.as_ref().map(|p| p.display().to_string()),
        );

        ini.write_to_file(path).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// A config file pre-filled with the built-in defaults, for `init`.
    pub fn with_defaults() -> Self {
        let defaults = RunConfig::default();
        Self {
            workdir: Some(defaults.workdir),
            discover_mirror: Some(defaults.discover_mirror),
            user_agent: Some(defaults.user_agent),
            error_grace_secs: Some(defaults.error_grace.as_secs()),
            installer_only: Some(defaults.installer_only),
            log_dir: Some(defaults.log_dir),
            ..Default::default()
        }
    }

    /// Layer the file settings over the built-in defaults.
    pub fn to_run_config(&self) -> RunConfig {
        let mut config = RunConfig::default();

        config.catalog_url = self.catalog_url.clone();
        config.mirror = self.mirror.clone();
        config.target_version = self.target_version.clone();
        config.machine_model = self.machine_model.clone();
        if let Some(ref workdir) = self.workdir {
            config.workdir = workdir.clone();
        }
        if let Some(discover) = self.discover_mirror {
            config.discover_mirror = discover;
        }
        if let Some(ref user_agent) = self.user_agent {
            config.user_agent = user_agent.clone();
        }
        if let Some(secs) = self.error_grace_secs {
            config.error_grace = Duration::from_secs(secs);
        }
        if let Some(installer_only) = self.installer_only {
            config.installer_only = installer_only;
        }
        if let Some(ref dir) = self.log_dir {
            config.log_dir = dir.clone();
        }

        config
    }
}

fn get_string(ini: &Ini, section: &str, key: &str) -> Option<String> {
    ini.section(Some(section))
        .and_then(|props| props.get(key))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_bool(ini: &Ini, section: &str, key: &str) -> Result<Option<bool>, ConfigError> {
    match get_string(ini, section, key) {
        None => Ok(None),
        Some(value) => match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(invalid(section, key, value)),
        },
    }
}

fn get_u64(ini: &Ini, section: &str, key: &str) -> Result<Option<u64>, ConfigError> {
    match get_string(ini, section, key) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, value)),
    }
}

fn invalid(section: &str, key: &str, value: String) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value,
    }
}

fn set_opt(ini: &mut Ini, section: &str, key: &str, value: Option<String>) {
    if let Some(value) = value {
        ini.with_section(Some(section)).set(key, value);
    }
}
