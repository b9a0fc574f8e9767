//! A configured, filterable set of fields for one named entity.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::config::{FieldSpecConfig, JoinConfig};
use super::loader::{LoadResult, SpecLoader};
use super::postprocess::{Postprocess, PostprocessRegistry};
use super::request::SpecRequest;
use super::{FIELD_ALIAS_SEPARATOR, TABLE_PLACEHOLDER};
use crate::sql::SelectExpr;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(\w+)>").unwrap());

/// One projected column: `<expr> AS <column_alias>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedField {
    pub name: String,
    pub expr: String,
    /// `<key_alias>___<name>`, unquoted.
    pub column_alias: String,
}

impl ProjectedField {
    pub fn to_select_expr(&self) -> SelectExpr {
        SelectExpr::raw(&self.expr).with_alias(&self.column_alias)
    }
}

/// The SELECT-list entries and joins a spec contributes to a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub fields: Vec<ProjectedField>,
    /// Joins whose alias is used by a projected field, `on` already
    /// substituted.
    pub joins: Vec<JoinConfig>,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn select_exprs(&self) -> impl Iterator<Item = SelectExpr> + '_ {
        self.fields.iter().map(ProjectedField::to_select_expr)
    }
}

/// Declarative description of one named entity.
///
/// Built from a [`SpecRequest`] and a loaded (or overridden)
/// [`FieldSpecConfig`]. `filtered_field_keys` is recomputed whenever the
/// include or exclude list changes.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    key: String,
    key_alias: String,
    plural: String,
    config: FieldSpecConfig,
    vars: BTreeMap<String, String>,
    field_keys: Vec<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    filtered_field_keys: Vec<String>,
    /// Request-level overrides.
    postprocess: HashMap<String, Postprocess>,
    /// Transforms named in the field configuration.
    field_postprocess: HashMap<String, Postprocess>,
    valid: bool,
}

impl FieldSpec {
    /// Build a spec, loading its configuration unless the request carries
    /// `cfg_override`.
    pub fn load(
        request: &SpecRequest,
        loader: &dyn SpecLoader,
        registry: &PostprocessRegistry,
    ) -> LoadResult<Self> {
        let config = match &request.cfg_override {
            Some(cfg) => Some(cfg.clone()),
            None => loader.load(&request.key)?,
        };
        Ok(Self::new(request, config, registry))
    }

    /// Build a spec from an already resolved configuration. `None` yields an
    /// invalid spec.
    pub fn new(
        request: &SpecRequest,
        config: Option<FieldSpecConfig>,
        registry: &PostprocessRegistry,
    ) -> Self {
        let mut spec = Self {
            key: request.key.clone(),
            key_alias: request.alias().to_string(),
            plural: request.plural.clone(),
            config: FieldSpecConfig::default(),
            vars: request.vars.clone(),
            field_keys: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            filtered_field_keys: Vec::new(),
            postprocess: HashMap::new(),
            field_postprocess: HashMap::new(),
            valid: false,
        };

        let Some(mut config) = config else {
            tracing::trace!(key = %request.key, "no configuration, spec is invalid");
            return spec;
        };

        config.prepend_fields(&request.add_fields);
        if !request.table.is_empty() {
            config.table = request.table.clone();
        }
        if !request.table_alias.is_empty() {
            config.table_alias = request.table_alias.clone();
        }
        if !request.joins.is_empty() {
            config.joins = request.joins.clone();
        }

        spec.field_keys = config.fields.iter().map(|f| f.name.clone()).collect();
        spec.field_postprocess = config
            .fields
            .iter()
            .filter_map(|f| {
                f.postprocess
                    .as_deref()
                    .map(|name| (f.name.clone(), registry.resolve(name)))
            })
            .collect();
        spec.postprocess = request
            .postprocess_names
            .iter()
            .map(|(field, name)| (field.clone(), registry.resolve(name)))
            .collect();
        spec.postprocess.extend(
            request
                .postprocess
                .iter()
                .map(|(field, p)| (field.clone(), p.clone())),
        );
        spec.config = config;
        spec.valid = true;

        spec.push_exclude(&request.exclude);
        spec.push_include(&request.include);
        spec.filter_keys();
        spec
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn key_alias(&self) -> &str {
        &self.key_alias
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn is_plural(&self) -> bool {
        !self.plural.is_empty()
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    pub fn table_alias(&self) -> &str {
        &self.config.table_alias
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn config(&self) -> &FieldSpecConfig {
        &self.config
    }

    /// Every configured field name, in order.
    pub fn field_keys(&self) -> &[String] {
        &self.field_keys
    }

    /// Field names that survive include/exclude filtering.
    pub fn filtered_field_keys(&self) -> &[String] {
        &self.filtered_field_keys
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    pub fn is_selected(&self, field: &str) -> bool {
        self.filtered_field_keys.iter().any(|f| f == field)
    }

    /// Add names to the include list. Names already excluded are skipped.
    pub fn add_include<S: AsRef<str>>(&mut self, names: &[S]) -> &mut Self {
        self.push_include(names);
        self.filter_keys();
        self
    }

    /// Add names to the exclude list, removing them from the include list.
    pub fn add_exclude<S: AsRef<str>>(&mut self, names: &[S]) -> &mut Self {
        self.push_exclude(names);
        self.filter_keys();
        self
    }

    /// Restrict the spec to exactly `names`, clearing the exclude list.
    pub fn set_include_only<S: AsRef<str>>(&mut self, names: &[S]) -> &mut Self {
        self.include = names.iter().map(|n| n.as_ref().to_string()).collect();
        self.exclude.clear();
        self.filtered_field_keys = self.include.clone();
        self
    }

    fn push_include<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names.iter().map(AsRef::as_ref) {
            if !contains(&self.include, name) && !contains(&self.exclude, name) {
                self.include.push(name.to_string());
            }
        }
    }

    fn push_exclude<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names.iter().map(AsRef::as_ref) {
            if !contains(&self.exclude, name) {
                self.exclude.push(name.to_string());
            }
        }
        self.include.retain(|i| !contains_ref(names, i));
    }

    fn filter_keys(&mut self) {
        self.filtered_field_keys = self
            .field_keys
            .iter()
            .filter(|k| {
                if !self.include.is_empty() {
                    contains(&self.include, k)
                } else {
                    !contains(&self.exclude, k)
                }
            })
            .cloned()
            .collect();
    }

    /// Names from `names` that are not configured fields, in input order.
    pub fn check_fields<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| !contains(&self.field_keys, n))
            .map(str::to_string)
            .collect()
    }

    /// Description text for every selected, non-hidden field.
    pub fn descriptions(&self) -> Map<String, Value> {
        self.config
            .fields
            .iter()
            .filter(|f| self.is_selected(&f.name) && !f.hidden)
            .map(|f| {
                (
                    f.name.clone(),
                    Value::String(f.description.clone().unwrap_or_default()),
                )
            })
            .collect()
    }

    /// The transform for `field`: request override, then the field's
    /// configured transform.
    pub fn postprocess_for(&self, field: &str) -> Option<&Postprocess> {
        self.postprocess
            .get(field)
            .or_else(|| self.field_postprocess.get(field))
    }

    /// SELECT-list entries and the joins they need.
    ///
    /// Empty when the spec is `nosql`, lacks a table or table alias, or has
    /// no selected fields.
    pub fn projection(&self) -> Projection {
        let cfg = &self.config;
        if !self.valid
            || cfg.nosql
            || cfg.table.is_empty()
            || cfg.table_alias.is_empty()
            || self.filtered_field_keys.is_empty()
        {
            return Projection::default();
        }

        let mut out = Projection::default();
        let mut used_aliases: Vec<&str> = Vec::new();

        for field in &cfg.fields {
            if field.nosql || !self.is_selected(&field.name) {
                continue;
            }
            let table_alias = match field.table_alias.as_deref() {
                Some(a) if !a.is_empty() => a,
                _ => cfg.table_alias.as_str(),
            };
            if !used_aliases.contains(&table_alias) {
                used_aliases.push(table_alias);
            }

            let expr = match field.sql.as_deref() {
                Some(sql) if !sql.is_empty() => self.substitute(sql, table_alias),
                _ => {
                    let column = match field.alias_of.as_deref() {
                        Some(c) if !c.is_empty() => c,
                        _ => field.name.as_str(),
                    };
                    format!("{}.{}", table_alias, column)
                }
            };

            out.fields.push(ProjectedField {
                name: field.name.clone(),
                expr,
                column_alias: column_alias(&self.key_alias, &field.name),
            });
        }

        for join in &cfg.joins {
            if join.table.is_empty() || !used_aliases.contains(&join.table_alias.as_str()) {
                continue;
            }
            out.joins.push(JoinConfig {
                table: join.table.clone(),
                table_alias: join.table_alias.clone(),
                on: join
                    .on
                    .as_deref()
                    .map(|on| self.substitute(on, &cfg.table_alias)),
            });
        }

        out
    }

    /// Replace `<TABLE>` and request vars in one pass. Unknown placeholders
    /// are left alone.
    fn substitute(&self, template: &str, table_alias: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures| {
                let name = &caps[1];
                if name == TABLE_PLACEHOLDER {
                    table_alias.to_string()
                } else {
                    match self.vars.get(name) {
                        Some(v) => v.clone(),
                        None => caps[0].to_string(),
                    }
                }
            })
            .into_owned()
    }
}

/// `<key_alias>___<field>`
pub fn column_alias(key_alias: &str, field: &str) -> String {
    format!("{}{}{}", key_alias, FIELD_ALIAS_SEPARATOR, field)
}

fn contains(list: &[String], name: &str) -> bool {
    list.iter().any(|s| s == name)
}

fn contains_ref<S: AsRef<str>>(list: &[S], name: &str) -> bool {
    list.iter().any(|s| s.as_ref() == name)
}
