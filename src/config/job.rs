//! Job files: one template run described in TOML.
//!
//! ```toml
//! template_file = "order.mustache"
//! fields = ["order.id"]
//!
//! specs = ["order", { key = "product", plural = "order.products" }]
//!
//! [[groups]]
//! key_aliases = "order"
//! where = "o.id = 7"
//!
//! [[groups]]
//! key_aliases = "product"
//! order_by = "p.name"
//!
//! [fixtures]
//! global = { site = "Example" }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use super::settings::SettingsError;
use crate::aggregator::{Aggregator, DataParamGroup, GroupData};
use crate::error::ShortcodeResult;
use crate::spec::SpecRequest;

/// A spec entry: a bare key or a full request table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SpecEntry {
    Key(String),
    Request(SpecRequest),
}

impl From<SpecEntry> for SpecRequest {
    fn from(entry: SpecEntry) -> Self {
        match entry {
            SpecEntry::Key(key) => SpecRequest::new(key),
            SpecEntry::Request(request) => request,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobFile {
    /// Inline template.
    pub template: Option<String>,
    /// Template path, relative to the job file. Ignored when `template` is set.
    pub template_file: Option<PathBuf>,
    /// Overrides `Settings::add_global` for this job.
    pub add_global: Option<bool>,
    /// Extra field references kept when pruning.
    pub fields: Vec<String>,
    /// Skip template-driven pruning.
    pub no_prune: bool,
    pub specs: Vec<SpecEntry>,
    pub groups: Vec<DataParamGroup>,
    /// Raw rows per group index, used instead of SQL.
    pub input: Vec<Value>,
    /// Data served for a group key instead of fetching it.
    pub fixtures: BTreeMap<String, Value>,
}

impl JobFile {
    /// Parse a job file, reading `template_file` relative to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut job: JobFile = toml::from_str(&content)?;
        job.resolve_template(path.parent().unwrap_or_else(|| Path::new(".")))?;
        Ok(job)
    }

    fn resolve_template(&mut self, base: &Path) -> Result<(), SettingsError> {
        if self.template.is_some() {
            return Ok(());
        }
        if let Some(file) = &self.template_file {
            let path = base.join(file);
            if !path.exists() {
                return Err(SettingsError::FileNotFound(path));
            }
            self.template = Some(fs::read_to_string(&path)?);
        }
        Ok(())
    }

    pub fn requests(&self) -> Vec<SpecRequest> {
        self.specs.iter().cloned().map(SpecRequest::from).collect()
    }

    /// Declare specs, template, pruning, fixtures and groups on `aggregator`.
    pub fn apply(&self, aggregator: &mut Aggregator) -> ShortcodeResult<()> {
        aggregator.init_specs(self.requests(), self.add_global)?;

        if let Some(template) = &self.template {
            aggregator.set_template(template.clone());
        }
        if !self.no_prune {
            if self.template.is_some() {
                aggregator.extract_fields_from_template(&self.fields, true)?;
            } else if !self.fields.is_empty() {
                aggregator.set_fields(&self.fields);
            }
        }

        for (key, value) in &self.fixtures {
            let value = value.clone();
            aggregator.set_external_data_getter(key, move |_, _| {
                Ok(GroupData::from_value(value.clone()))
            });
        }

        aggregator.set_data_params(self.groups.clone());
        Ok(())
    }
}
