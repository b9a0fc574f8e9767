//! TOML-based configuration for shortcode.
//!
//! Supports a config file (shortcode.toml) with environment variable
//! expansion in paths.
//!
//! Example configuration:
//! ```toml
//! spec_dir = "${APP_ROOT}/shortcode_spec"
//! add_global = true
//! dialect = "mysql"
//!
//! [template]
//! escape_html = true
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::{Dialect, UnknownDialect};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SHORTCODE_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding spec configuration files (supports `${VAR}`).
    pub spec_dir: String,

    /// Add the `global` spec to every `init_specs` call.
    pub add_global: bool,

    /// SQL dialect name (mysql, postgres, duckdb).
    pub dialect: String,

    /// Template rendering options.
    pub template: TemplateSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spec_dir: "shortcode_spec".to_string(),
            add_global: true,
            dialect: "mysql".to_string(),
            template: TemplateSettings::default(),
        }
    }
}

/// Template rendering options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// HTML-escape `{{name}}` output.
    pub escape_html: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self { escape_html: false }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SHORTCODE_CONFIG`
    /// 2. `./shortcode.toml`
    /// 3. `~/.config/shortcode/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("shortcode.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("shortcode").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// The spec directory with environment variables expanded.
    pub fn spec_dir_path(&self) -> Result<PathBuf, SettingsError> {
        Ok(PathBuf::from(expand_env_vars(&self.spec_dir)?))
    }

    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        self.dialect
            .parse()
            .map_err(|e: UnknownDialect| SettingsError::InvalidConfig(e.to_string()))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
