//! Parameters describing how one [`FieldSpec`](super::FieldSpec) is built.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer};

use super::config::{FieldConfig, FieldSpecConfig, JoinConfig};
use super::postprocess::Postprocess;

/// A normalized request for one spec.
///
/// Only `key` is required; every other attribute overrides or narrows what
/// the loaded configuration provides. A plain string converts to a request
/// with that key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpecRequest {
    /// Configuration name; also the alias when `key_alias` is empty.
    pub key: String,
    pub key_alias: String,
    /// Dotted path where rows are appended. Empty means a single row merged
    /// at the top level.
    pub plural: String,
    pub table: String,
    pub table_alias: String,
    /// Replaces the configured joins entirely when non-empty.
    pub joins: Vec<JoinConfig>,
    /// `<name>` substitutions for field SQL and join conditions.
    pub vars: BTreeMap<String, String>,
    #[serde(deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,
    /// When non-empty, only these fields are used.
    #[serde(deserialize_with = "one_or_many")]
    pub include: Vec<String>,
    /// Fields placed ahead of the loaded ones.
    pub add_fields: Vec<FieldConfig>,
    /// Field transforms by registry name.
    #[serde(rename = "postprocess")]
    pub postprocess_names: BTreeMap<String, String>,
    /// Field transforms as closures; these win over `postprocess_names`.
    #[serde(skip)]
    pub postprocess: HashMap<String, Postprocess>,
    /// Use this configuration instead of loading one.
    pub cfg_override: Option<FieldSpecConfig>,
}

impl SpecRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.key.is_empty()
    }

    /// `key_alias`, or `key` when no alias was given.
    pub fn alias(&self) -> &str {
        if self.key_alias.is_empty() {
            &self.key
        } else {
            &self.key_alias
        }
    }

    pub fn key_alias(mut self, alias: &str) -> Self {
        self.key_alias = alias.to_string();
        self
    }

    pub fn plural(mut self, path: &str) -> Self {
        self.plural = path.to_string();
        self
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    pub fn table_alias(mut self, alias: &str) -> Self {
        self.table_alias = alias.to_string();
        self
    }

    pub fn joins(mut self, joins: Vec<JoinConfig>) -> Self {
        self.joins = joins;
        self
    }

    pub fn var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn add_field(mut self, field: FieldConfig) -> Self {
        self.add_fields.push(field);
        self
    }

    pub fn postprocess(mut self, field: &str, transform: impl Into<Postprocess>) -> Self {
        self.postprocess.insert(field.to_string(), transform.into());
        self
    }

    pub fn postprocess_named(mut self, field: &str, name: &str) -> Self {
        self.postprocess_names
            .insert(field.to_string(), name.to_string());
        self
    }

    pub fn cfg_override(mut self, cfg: FieldSpecConfig) -> Self {
        self.cfg_override = Some(cfg);
        self
    }
}

impl From<&str> for SpecRequest {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SpecRequest {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// Accept either a single string or a list of strings.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
