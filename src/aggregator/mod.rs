//! The aggregator: builds specs, fetches data per group and merges it into
//! one tree for the template.
//!
//! - [`group`] - data-param groups and alias resolution
//! - [`fetch`] - per-alias fetch strategies
//! - [`compose`] - SQL for a group
//! - [`reshape`] - raw rows to aliased field maps
//! - [`tree`] - the merged result tree
//! - [`reconcile`] - template field extraction and pruning
//! - [`descriptions`] - field description tree

pub mod compose;
pub mod descriptions;
pub mod fetch;
pub mod group;
pub mod reconcile;
pub mod reshape;
pub mod tree;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

pub use descriptions::{DescriptionHook, DescriptionOverride, IS_ARRAY_KEY};
pub use fetch::{FetchHandler, FetchStrategy, FetcherRegistry, GroupData};
pub use group::{DataParamGroup, ResolvedGroup, WhereClause};

use crate::config::Settings;
use crate::error::ShortcodeResult;
use crate::executor::SqlExecutor;
use crate::spec::{DirLoader, FieldSpec, LoadResult, PostprocessRegistry, SpecLoader, SpecRequest, SpecSet};
use crate::sql::Dialect;
use crate::template::{Mustache, TemplateError, TemplateRenderer};
use compose::{compose, COUNT_COLUMN};
use tree::{split_path, ResultTree};

/// Alias of the spec added by `init_specs` unless told otherwise.
pub const GLOBAL_KEY: &str = "global";

/// Whole-tree postprocessor run once after all groups.
pub type DataProcessor = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Orchestrates specs, groups, fetching and rendering for one template.
///
/// Single-threaded and caller-driven: groups are fetched one at a time in
/// declaration order.
pub struct Aggregator {
    loader: Box<dyn SpecLoader>,
    executor: Box<dyn SqlExecutor>,
    renderer: Box<dyn TemplateRenderer>,
    registry: PostprocessRegistry,
    dialect: Dialect,
    add_global: bool,

    specs: SpecSet,
    template: Option<String>,
    groups: Vec<DataParamGroup>,
    fetchers: FetcherRegistry,
    processor: Option<DataProcessor>,
    description_overrides: HashMap<String, DescriptionOverride>,
    description_hook: Option<DescriptionHook>,

    data: Value,
    has_no_results: bool,
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("dialect", &self.dialect)
            .field("add_global", &self.add_global)
            .field("specs", &self.specs.aliases().collect::<Vec<_>>())
            .field("groups", &self.groups.len())
            .field("has_no_results", &self.has_no_results)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    pub fn new(
        loader: impl SpecLoader + 'static,
        executor: impl SqlExecutor + 'static,
        renderer: impl TemplateRenderer + 'static,
    ) -> Self {
        let mut fetchers = FetcherRegistry::default();
        fetchers.register_custom(
            GLOBAL_KEY,
            FetchHandler::new(|_, _| Ok(GroupData::empty())),
        );

        Self {
            loader: Box::new(loader),
            executor: Box::new(executor),
            renderer: Box::new(renderer),
            registry: PostprocessRegistry::default(),
            dialect: Dialect::default(),
            add_global: true,
            specs: SpecSet::new(),
            template: None,
            groups: Vec::new(),
            fetchers,
            processor: None,
            description_overrides: HashMap::new(),
            description_hook: None,
            data: Value::Object(Map::new()),
            has_no_results: false,
        }
    }

    /// An aggregator reading specs from `settings.spec_dir` and rendering
    /// with [`Mustache`].
    pub fn from_settings(
        settings: &Settings,
        executor: impl SqlExecutor + 'static,
    ) -> ShortcodeResult<Self> {
        let loader = DirLoader::new(settings.spec_dir_path()?);
        let renderer = Mustache::new().with_escape_html(settings.template.escape_html);
        Ok(Self::new(loader, executor, renderer)
            .with_dialect(settings.dialect()?)
            .with_add_global(settings.add_global))
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_add_global(mut self, add_global: bool) -> Self {
        self.add_global = add_global;
        self
    }

    pub fn with_registry(mut self, registry: PostprocessRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry_mut(&mut self) -> &mut PostprocessRegistry {
        &mut self.registry
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn specs(&self) -> &SpecSet {
        &self.specs
    }

    pub fn spec_mut(&mut self, alias: &str) -> Option<&mut FieldSpec> {
        self.specs.get_mut(alias)
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn groups(&self) -> &[DataParamGroup] {
        &self.groups
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Build a spec for every valid request. A `global` request is appended
    /// unless `add_global` (default: the aggregator's setting) is false or
    /// one already uses that alias. Requests whose configuration is missing
    /// are skipped; a malformed configuration is an error.
    pub fn init_specs(
        &mut self,
        requests: Vec<SpecRequest>,
        add_global: Option<bool>,
    ) -> LoadResult<&mut Self> {
        let mut requests = requests;
        let add_global = add_global.unwrap_or(self.add_global)
            && !requests.iter().any(|r| r.alias() == GLOBAL_KEY);
        if add_global {
            requests.push(SpecRequest::new(GLOBAL_KEY).key_alias(GLOBAL_KEY));
        }

        for request in &requests {
            if !request.is_valid() {
                tracing::trace!(alias = %request.key_alias, "spec request without key skipped");
                continue;
            }
            let spec = FieldSpec::load(request, self.loader.as_ref(), &self.registry)?;
            if spec.is_valid() {
                self.specs.insert(spec);
            } else {
                tracing::debug!(key = %request.key, "no configuration for spec, skipped");
            }
        }
        Ok(self)
    }

    pub fn set_template(&mut self, template: impl Into<String>) -> &mut Self {
        self.template = Some(template.into());
        self
    }

    /// Serve the group keyed `key` from `getter` for this run. Cleared by
    /// [`reset`](Self::reset).
    pub fn set_external_data_getter<F>(&mut self, key: &str, getter: F) -> &mut Self
    where
        F: Fn(&DataParamGroup, bool) -> ShortcodeResult<GroupData> + Send + Sync + 'static,
    {
        self.fetchers
            .register_external(key, FetchHandler::new(getter));
        self
    }

    /// Install a custom fetcher for the group keyed `key`. Survives
    /// [`reset`](Self::reset).
    pub fn register_fetcher<F>(&mut self, key: &str, fetcher: F) -> &mut Self
    where
        F: Fn(&DataParamGroup, bool) -> ShortcodeResult<GroupData> + Send + Sync + 'static,
    {
        self.fetchers.register_custom(key, FetchHandler::new(fetcher));
        self
    }

    /// Run `processor` over the whole tree after every fetch.
    pub fn set_external_data_processor<F>(&mut self, processor: F) -> &mut Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.processor = Some(Arc::new(processor));
        self
    }

    pub fn set_data_params(&mut self, groups: Vec<DataParamGroup>) -> &mut Self {
        self.groups = groups;
        self
    }

    /// Replace the descriptions reported for `alias`.
    pub fn set_description_override<F>(&mut self, alias: &str, f: F) -> &mut Self
    where
        F: Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.description_overrides
            .insert(alias.to_string(), Arc::new(f));
        self
    }

    pub fn set_description_hook<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.description_hook = Some(Arc::new(f));
        self
    }

    // =========================================================================
    // Template reconciliation
    // =========================================================================

    /// Field references used by the current template.
    pub fn extract_fields(&self) -> Result<Vec<String>, TemplateError> {
        match &self.template {
            Some(t) => Ok(reconcile::extract_fields(&self.renderer.tokenize(t)?)),
            None => Ok(Vec::new()),
        }
    }

    /// References in `fields` that match no spec, plural path or field.
    pub fn check_fields<S: AsRef<str>>(&self, fields: &[S]) -> Vec<String> {
        reconcile::check_fields(fields, &self.specs)
    }

    /// [`check_fields`](Self::check_fields) over the current template.
    pub fn check_fields_from_template(&self) -> Result<Vec<String>, TemplateError> {
        Ok(self.check_fields(&self.extract_fields()?))
    }

    /// Prune specs and fields the current template (plus `extra`) does not
    /// use. With `do_check`, unknown references are ignored first.
    pub fn extract_fields_from_template<S: AsRef<str>>(
        &mut self,
        extra: &[S],
        do_check: bool,
    ) -> Result<&mut Self, TemplateError> {
        let mut fields: Vec<String> = extra.iter().map(|s| s.as_ref().to_string()).collect();
        for f in self.extract_fields()? {
            if !fields.contains(&f) {
                fields.push(f);
            }
        }
        if !fields.is_empty() {
            reconcile::prune_to_fields(&fields, &mut self.specs, do_check);
        }
        Ok(self)
    }

    /// Prune specs and fields to exactly `fields`, ignoring the template.
    pub fn set_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> &mut Self {
        if !fields.is_empty() {
            reconcile::prune_to_fields(fields, &mut self.specs, true);
        }
        self
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Fetch every group and merge the results.
    pub fn fetch(&mut self) -> ShortcodeResult<&mut Self> {
        self.fetch_with(&[])
    }

    /// Like [`fetch`](Self::fetch), but `input[i]` (when non-empty) supplies
    /// the raw rows of group `i` instead of SQL. External and custom
    /// fetchers still take precedence.
    pub fn fetch_with(&mut self, input: &[Value]) -> ShortcodeResult<&mut Self> {
        let mut tree = ResultTree::new();

        for (index, group) in self.groups.iter().enumerate() {
            let Some(resolved) = group.resolve(&self.specs) else {
                tracing::trace!(index, aliases = ?group.key_aliases, "group not resolvable, skipped");
                continue;
            };
            let plural = resolved.is_plural();

            let data = match self.fetchers.strategy(&resolved.key) {
                FetchStrategy::External(handler) | FetchStrategy::Custom(handler) => {
                    let visible = DataParamGroup {
                        key_aliases: resolved.aliases.clone(),
                        ..group.clone()
                    };
                    handler.call(&visible, plural)?
                }
                FetchStrategy::Default => match input.get(index).filter(|v| !is_empty_input(v)) {
                    Some(raw) => reshape::reshape(
                        GroupData::from_value(raw.clone()),
                        &resolved.aliases,
                        &self.specs,
                        group,
                        plural,
                    ),
                    None => {
                        let (data, empty) = self.query_group(group, plural)?;
                        if empty {
                            self.has_no_results = true;
                        }
                        data
                    }
                },
            };

            if plural {
                tree.append(&split_path(&resolved.plural), data.into_rows());
            } else {
                for (key, value) in data.into_map() {
                    tree.insert(ResultTree::ROOT, &key, value);
                }
            }
        }

        let data = tree.into_value();
        self.data = match &self.processor {
            Some(p) => p(data),
            None => data,
        };
        Ok(self)
    }

    /// Run the composed SQL for `group`. The flag is true when the query
    /// came back empty.
    fn query_group(&self, group: &DataParamGroup, plural: bool) -> ShortcodeResult<(GroupData, bool)> {
        let Some(composition) = compose(group, &self.specs, false) else {
            let data = if plural {
                GroupData::Rows(Vec::new())
            } else {
                GroupData::empty()
            };
            return Ok((data, false));
        };
        let sql = composition.query.to_sql(self.dialect);
        tracing::debug!(sql = %sql, "running group query");

        let result = self.executor.query(&sql)?;
        let raw = if plural {
            GroupData::Rows(result.rows.into_iter().map(Value::Object).collect())
        } else {
            GroupData::Single(result.row)
        };
        let empty = raw.is_empty();
        let data = reshape::reshape(raw, &composition.aliases, &self.specs, group, plural);
        Ok((data, empty))
    }

    /// Number of rows `group` matches. 0 when the group has nothing to
    /// query or the count is missing or not numeric.
    pub fn count(&self, group: &DataParamGroup) -> ShortcodeResult<u64> {
        let Some(composition) = compose(group, &self.specs, true) else {
            return Ok(0);
        };
        let sql = composition.query.to_sql(self.dialect);
        tracing::debug!(sql = %sql, "running count query");

        let result = self.executor.query(&sql)?;
        if result.num_rows == 0 {
            return Ok(0);
        }
        Ok(result.row.get(COUNT_COLUMN).map_or(0, count_value))
    }

    /// The SQL `group` would run, without running it.
    pub fn sql_for(&self, group: &DataParamGroup) -> Option<String> {
        compose(group, &self.specs, false).map(|c| c.query.to_sql(self.dialect))
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    /// Whether any SQL fetch since the last [`reset`](Self::reset) came back
    /// empty.
    pub fn has_no_results(&self) -> bool {
        self.has_no_results
    }

    pub fn field_descriptions(&self) -> Value {
        descriptions::field_descriptions(
            &self.specs,
            &self.description_overrides,
            self.description_hook.as_ref(),
        )
    }

    /// Render the current template with the fetched data. No template
    /// renders as an empty string.
    pub fn render(&self) -> Result<String, TemplateError> {
        match &self.template {
            Some(t) => self.renderer.render(t, &self.data),
            None => Ok(String::new()),
        }
    }

    /// Clear per-run state: template, specs, groups, data, the no-results
    /// flag, the data processor and external getters. Collaborators, custom
    /// fetchers and description overrides are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.template = None;
        self.specs.clear();
        self.groups.clear();
        self.data = Value::Object(Map::new());
        self.has_no_results = false;
        self.processor = None;
        self.fetchers.clear_external();
        self
    }
}

/// A count column as a row count. Floats truncate; negative or
/// non-numeric values count as 0.
fn count_value(v: &Value) -> u64 {
    let float = match v {
        Value::Number(n) => match n.as_u64() {
            Some(count) => return count,
            None => n.as_f64(),
        },
        Value::String(s) => match s.trim().parse::<u64>() {
            Ok(count) => return count,
            Err(_) => s.trim().parse::<f64>().ok(),
        },
        _ => None,
    };
    match float {
        Some(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

fn is_empty_input(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(m) => m.is_empty(),
        _ => true,
    }
}
