//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tfsget/tfsget.toml`
//! 3. Environment variables: `TFSGET_*` prefix, `__` separates sections
//!
//! Every setting is optional; the CLI works without any config file.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Connection settings for the TFVC REST client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// `api-version` sent with every REST call
    pub api_version: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Page size for history and change queries
    pub page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_version: "5.0".into(),
            timeout_secs: 120,
            page_size: 256,
        }
    }
}

/// History rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    /// CSV field separator; derived from the locale when not set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_separator: Option<String>,
    /// Render dates in UTC instead of local time
    pub utc_dates: bool,
}

/// Raw sections for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawServerConfig {
    pub api_version: Option<String>,
    pub timeout_secs: Option<u64>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawHistoryConfig {
    pub csv_separator: Option<String>,
    pub utc_dates: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub server: RawServerConfig,
    pub history: RawHistoryConfig,
}

/// Unified configuration for tfsget.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub history: HistoryConfig,
}

/// Get the XDG config directory for tfsget.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tfsget").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tfsget.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            server: ServerConfig {
                api_version: overlay
                    .server
                    .api_version
                    .clone()
                    .unwrap_or_else(|| self.server.api_version.clone()),
                timeout_secs: overlay.server.timeout_secs.unwrap_or(self.server.timeout_secs),
                page_size: overlay.server.page_size.unwrap_or(self.server.page_size),
            },
            history: HistoryConfig {
                csv_separator: overlay
                    .history
                    .csv_separator
                    .clone()
                    .or_else(|| self.history.csv_separator.clone()),
                utc_dates: overlay.history.utc_dates.unwrap_or(self.history.utc_dates),
            },
        }
    }

    /// Load settings with layered precedence from the default locations.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings using `config_file` as the global config layer.
    ///
    /// A missing file is skipped; an unreadable or malformed one is an error.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config file
        if let Some(path) = config_file {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.validate()?;
        Ok(current)
    }

    /// Apply TFSGET_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TFSGET")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("server.api_version") {
            settings.server.api_version = val;
        }
        if let Ok(val) = config.get_string("server.timeout_secs") {
            settings.server.timeout_secs = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("TFSGET_SERVER__TIMEOUT_SECS: {}", e),
            })?;
        }
        if let Ok(val) = config.get_string("server.page_size") {
            settings.server.page_size = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("TFSGET_SERVER__PAGE_SIZE: {}", e),
            })?;
        }
        if let Ok(val) = config.get_string("history.csv_separator") {
            settings.history.csv_separator = Some(val);
        }
        if let Ok(val) = config.get_string("history.utc_dates") {
            settings.history.utc_dates = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("TFSGET_HISTORY__UTC_DATES: {}", e),
            })?;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.server.page_size == 0 {
            return Err(ApplicationError::Config {
                message: "server.page_size must be greater than 0".into(),
            });
        }
        if self.server.timeout_secs == 0 {
            return Err(ApplicationError::Config {
                message: "server.timeout_secs must be greater than 0".into(),
            });
        }
        if self.history.csv_separator.as_deref() == Some("") {
            return Err(ApplicationError::Config {
                message: "history.csv_separator must not be empty".into(),
            });
        }
        Ok(())
    }

    /// CSV separator: configured value, else derived from the process locale.
    pub fn csv_separator(&self) -> String {
        match &self.history.csv_separator {
            Some(sep) => sep.clone(),
            None => locale_list_separator(current_locale().as_deref()).to_string(),
        }
    }

    /// Render settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }

    /// Commented template for `config init`.
    pub fn template() -> String {
        let defaults = ServerConfig::default();
        format!(
            r#"# tfsget configuration

[server]
# api-version sent with every REST call
api_version = "{}"
# per-request timeout in seconds
timeout_secs = {}
# page size for history and change queries
page_size = {}

[history]
# CSV field separator (default: derived from the locale, ";" or ",")
# csv_separator = ";"
# render dates in UTC instead of local time
utc_dates = false
"#,
            defaults.api_version, defaults.timeout_secs, defaults.page_size
        )
    }
}

/// Active locale name from `LC_ALL`, `LC_NUMERIC`, `LANG` (first non-empty).
fn current_locale() -> Option<String> {
    ["LC_ALL", "LC_NUMERIC", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|val| !val.is_empty())
}

/// Languages writing decimals with a comma, which use `;` to separate list items.
const DECIMAL_COMMA_LANGUAGES: &[&str] = &[
    "bg", "ca", "cs", "da", "de", "el", "es", "et", "eu", "fi", "fr", "gl", "hr", "hu", "id",
    "is", "it", "lt", "lv", "nb", "nl", "nn", "no", "pl", "pt", "ro", "ru", "sk", "sl", "sr",
    "sv", "tr", "uk", "vi",
];

/// List separator for a POSIX locale name such as `de_DE.UTF-8`.
pub fn locale_list_separator(locale: Option<&str>) -> &'static str {
    let language = locale
        .and_then(|l| l.split(['_', '.', '@', '-']).next())
        .unwrap_or("")
        .to_ascii_lowercase();
    if DECIMAL_COMMA_LANGUAGES.contains(&language.as_str()) {
        ";"
    } else {
        ","
    }
}
