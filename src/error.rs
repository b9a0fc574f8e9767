//! Crate-level error type.
//!
//! Each concern owns its own error enum; [`ShortcodeError`] wraps them so
//! callers driving the whole pipeline can use a single `?`.

use thiserror::Error;

use crate::config::SettingsError;
use crate::executor::ExecutorError;
use crate::spec::LoadError;
use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum ShortcodeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Raised by a custom or external fetcher.
    #[error("Fetcher for '{alias}' failed: {message}")]
    Fetcher { alias: String, message: String },

    /// Invalid caller input. The engine itself degrades silently and never
    /// returns this; it is available to handlers and wrappers that want to
    /// fail hard.
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl ShortcodeError {
    pub fn fetcher(alias: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetcher {
            alias: alias.into(),
            message: message.into(),
        }
    }
}

pub type ShortcodeResult<T> = Result<T, ShortcodeError>;
