//! Spec configuration loaders.
//!
//! Currently supports:
//! - **TOML** (.toml) - primary format
//! - **JSON** (.json)
//!
//! A loader returns `Ok(None)` when no configuration exists for a key; the
//! spec is then skipped. A file that exists but cannot be parsed is an
//! error.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use super::config::FieldSpecConfig;

/// Errors that can occur when loading a spec configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Key that cannot be mapped to a file under the spec directory
    #[error("Invalid spec key: '{key}'")]
    InvalidKey { key: String },

    /// IO error reading file
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse error
    #[error("Failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// JSON parse error
    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for spec loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Source of spec configurations.
pub trait SpecLoader: Send + Sync {
    /// Load the configuration named `key`, or `None` if there is none.
    fn load(&self, key: &str) -> LoadResult<Option<FieldSpecConfig>>;
}

impl<T: SpecLoader + ?Sized> SpecLoader for Box<T> {
    fn load(&self, key: &str) -> LoadResult<Option<FieldSpecConfig>> {
        (**self).load(key)
    }
}

impl<T: SpecLoader + ?Sized> SpecLoader for std::sync::Arc<T> {
    fn load(&self, key: &str) -> LoadResult<Option<FieldSpecConfig>> {
        (**self).load(key)
    }
}

/// Loads `<root>/<key>.toml`, falling back to `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct DirLoader {
    root: PathBuf,
}

impl DirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys may contain `/` to reach subdirectories but never leave `root`.
    fn base_path(&self, key: &str) -> LoadResult<PathBuf> {
        let rel = Path::new(key);
        let plain = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(LoadError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(rel))
    }
}

impl SpecLoader for DirLoader {
    fn load(&self, key: &str) -> LoadResult<Option<FieldSpecConfig>> {
        let base = self.base_path(key)?;

        let toml_path = with_extension(&base, "toml");
        if toml_path.is_file() {
            let content = read(&toml_path)?;
            let cfg = toml::from_str(&content).map_err(|source| LoadError::Toml {
                path: toml_path.clone(),
                source,
            })?;
            tracing::debug!(key, path = %toml_path.display(), "loaded spec config");
            return Ok(Some(cfg));
        }

        let json_path = with_extension(&base, "json");
        if json_path.is_file() {
            let content = read(&json_path)?;
            let cfg = serde_json::from_str(&content).map_err(|source| LoadError::Json {
                path: json_path.clone(),
                source,
            })?;
            tracing::debug!(key, path = %json_path.display(), "loaded spec config");
            return Ok(Some(cfg));
        }

        tracing::trace!(key, root = %self.root.display(), "no spec config found");
        Ok(None)
    }
}

// `Path::with_extension` would replace a dotted suffix in the key itself.
fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

fn read(path: &Path) -> LoadResult<String> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Configurations held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    configs: HashMap<String, FieldSpecConfig>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, cfg: FieldSpecConfig) -> &mut Self {
        self.configs.insert(key.to_string(), cfg);
        self
    }

    pub fn with(mut self, key: &str, cfg: FieldSpecConfig) -> Self {
        self.insert(key, cfg);
        self
    }
}

impl SpecLoader for MemoryLoader {
    fn load(&self, key: &str) -> LoadResult<Option<FieldSpecConfig>> {
        Ok(self.configs.get(key).cloned())
    }
}
