//! Configuration for shortcode.
//!
//! Handles the settings file, environment variables, and job files.

mod job;
mod settings;

pub use job::{JobFile, SpecEntry};
pub use settings::{expand_env_vars, Settings, SettingsError, TemplateSettings, CONFIG_ENV};
