//! Data-param groups: which specs are fetched together, and how.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::spec::request::one_or_many;
use crate::spec::{Postprocess, SpecSet};

/// WHERE conditions for a group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WhereClause {
    /// One condition for the whole query.
    All(String),
    /// A condition per alias, added in the order aliases join the query.
    PerAlias(BTreeMap<String, String>),
}

/// One unit of fetching: a set of spec aliases whose data is fetched
/// together and stored under one key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataParamGroup {
    #[serde(deserialize_with = "one_or_many")]
    pub key_aliases: Vec<String>,
    /// Key the result is stored under. Defaults to the only surviving alias.
    pub key_alias: Option<String>,
    #[serde(rename = "where")]
    pub where_clause: Option<WhereClause>,
    /// Join condition per alias.
    pub on: BTreeMap<String, String>,
    /// Aliases an `on` condition depends on; the condition is dropped when
    /// any of them has no spec.
    pub on_pred: BTreeMap<String, Vec<String>>,
    /// LEFT JOIN chain instead of a comma join.
    pub is_join: bool,
    pub order_by: Option<String>,
    /// Literal LIMIT, e.g. `10` or `"20, 10"`.
    #[serde(deserialize_with = "string_or_number")]
    pub limit: Option<String>,
    /// Field transforms that win over the specs' own.
    #[serde(skip)]
    pub postprocess: HashMap<String, Postprocess>,
    /// Free-form parameters for custom and external fetchers.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataParamGroup {
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_aliases: aliases.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn key_alias(mut self, alias: &str) -> Self {
        self.key_alias = Some(alias.to_string());
        self
    }

    pub fn where_all(mut self, condition: &str) -> Self {
        self.where_clause = Some(WhereClause::All(condition.to_string()));
        self
    }

    /// Add a per-alias condition. Replaces a whole-query condition.
    pub fn where_for(mut self, alias: &str, condition: &str) -> Self {
        let mut map = match self.where_clause.take() {
            Some(WhereClause::PerAlias(m)) => m,
            _ => BTreeMap::new(),
        };
        map.insert(alias.to_string(), condition.to_string());
        self.where_clause = Some(WhereClause::PerAlias(map));
        self
    }

    pub fn on(mut self, alias: &str, condition: &str) -> Self {
        self.on.insert(alias.to_string(), condition.to_string());
        self
    }

    pub fn on_pred<I, S>(mut self, alias: &str, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on_pred.insert(
            alias.to_string(),
            depends_on.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn join(mut self, is_join: bool) -> Self {
        self.is_join = is_join;
        self
    }

    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = Some(order_by.to_string());
        self
    }

    pub fn limit(mut self, limit: impl ToString) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn postprocess(mut self, field: &str, transform: impl Into<Postprocess>) -> Self {
        self.postprocess.insert(field.to_string(), transform.into());
        self
    }

    pub fn extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Condition for `alias` from a per-alias WHERE map.
    pub fn where_for_alias(&self, alias: &str) -> Option<&str> {
        match &self.where_clause {
            Some(WhereClause::PerAlias(m)) => m.get(alias).map(String::as_str),
            _ => None,
        }
    }

    /// The whole-query WHERE condition, if any.
    pub fn where_all_condition(&self) -> Option<&str> {
        match &self.where_clause {
            Some(WhereClause::All(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// The `on` condition for `alias`, unless a predecessor it depends on
    /// has no spec.
    pub fn on_condition(&self, alias: &str, specs: &SpecSet) -> Option<&str> {
        let on = self.on.get(alias).filter(|s| !s.is_empty())?;
        if let Some(preds) = self.on_pred.get(alias) {
            if let Some(missing) = preds.iter().find(|p| !specs.contains(p)) {
                tracing::trace!(alias, missing = %missing, "dropping on condition");
                return None;
            }
        }
        Some(on.as_str())
    }

    /// Resolve the group against the declared specs.
    ///
    /// Aliases without a spec are dropped. The result key is the explicit
    /// `key_alias`, else the single surviving alias; `None` means the group
    /// is skipped.
    pub fn resolve(&self, specs: &SpecSet) -> Option<ResolvedGroup> {
        let aliases: Vec<String> = self
            .key_aliases
            .iter()
            .filter(|a| specs.contains(a))
            .cloned()
            .collect();
        if aliases.is_empty() {
            return None;
        }
        let key = match &self.key_alias {
            Some(k) if !k.is_empty() => k.clone(),
            _ if aliases.len() == 1 => aliases[0].clone(),
            _ => return None,
        };
        let plural = specs
            .get(&aliases[0])
            .map(|s| s.plural().to_string())
            .unwrap_or_default();
        Some(ResolvedGroup {
            key,
            aliases,
            plural,
        })
    }
}

/// A group after alias resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroup {
    /// Key the data is stored under and fetchers are registered for.
    pub key: String,
    /// Aliases that have a spec, in declaration order.
    pub aliases: Vec<String>,
    /// Plural path of the first surviving alias.
    pub plural: String,
}

impl ResolvedGroup {
    pub fn is_plural(&self) -> bool {
        !self.plural.is_empty()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Limit {
        Number(u64),
        Text(String),
    }

    Ok(Option::<Limit>::deserialize(deserializer)?.map(|l| match l {
        Limit::Number(n) => n.to_string(),
        Limit::Text(s) => s,
    }))
}
