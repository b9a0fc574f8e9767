//! Per-alias fetch strategies.
//!
//! Data for a group normally comes from generated SQL. A group key can
//! instead be served by a custom fetcher (installed once, survives
//! `reset`) or an external getter (supplied per run, cleared by `reset`).
//! External getters win over custom fetchers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::group::DataParamGroup;
use crate::error::ShortcodeResult;

/// What a fetch produced for one group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupData {
    /// Keys merged into the top level of the result.
    Single(Map<String, Value>),
    /// Rows appended at the group's plural path.
    Rows(Vec<Value>),
}

impl GroupData {
    pub fn empty() -> Self {
        GroupData::Single(Map::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GroupData::Single(m) => m.is_empty(),
            GroupData::Rows(r) => r.is_empty(),
        }
    }

    /// Interpret a JSON value: arrays are row sets, objects single rows,
    /// anything else is empty.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(rows) => GroupData::Rows(rows),
            Value::Object(map) => GroupData::Single(map),
            _ => GroupData::empty(),
        }
    }

    /// As rows; a non-empty single map becomes one row.
    pub fn into_rows(self) -> Vec<Value> {
        match self {
            GroupData::Rows(rows) => rows,
            GroupData::Single(m) if m.is_empty() => Vec::new(),
            GroupData::Single(m) => vec![Value::Object(m)],
        }
    }

    /// As a single map; for row sets, every object row is merged in order.
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            GroupData::Single(m) => m,
            GroupData::Rows(rows) => {
                let mut out = Map::new();
                for row in rows {
                    if let Value::Object(m) = row {
                        out.extend(m);
                    }
                }
                out
            }
        }
    }
}

impl From<Map<String, Value>> for GroupData {
    fn from(m: Map<String, Value>) -> Self {
        GroupData::Single(m)
    }
}

impl From<Vec<Value>> for GroupData {
    fn from(rows: Vec<Value>) -> Self {
        GroupData::Rows(rows)
    }
}

/// Fetches a group's data. Receives the group and whether its data is
/// plural.
pub type FetchFn = dyn Fn(&DataParamGroup, bool) -> ShortcodeResult<GroupData> + Send + Sync;

#[derive(Clone)]
pub struct FetchHandler(Arc<FetchFn>);

impl FetchHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&DataParamGroup, bool) -> ShortcodeResult<GroupData> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, group: &DataParamGroup, plural: bool) -> ShortcodeResult<GroupData> {
        (self.0)(group, plural)
    }
}

impl fmt::Debug for FetchHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FetchHandler(<fn>)")
    }
}

/// How a group key is fetched.
#[derive(Debug, Clone)]
pub enum FetchStrategy {
    /// Caller-supplied input rows, else generated SQL.
    Default,
    Custom(FetchHandler),
    External(FetchHandler),
}

#[derive(Debug, Clone, Default)]
pub struct FetcherRegistry {
    custom: HashMap<String, FetchHandler>,
    external: HashMap<String, FetchHandler>,
}

impl FetcherRegistry {
    pub fn register_custom(&mut self, key: &str, handler: FetchHandler) {
        self.custom.insert(key.to_string(), handler);
    }

    pub fn register_external(&mut self, key: &str, handler: FetchHandler) {
        self.external.insert(key.to_string(), handler);
    }

    pub fn clear_external(&mut self) {
        self.external.clear();
    }

    pub fn strategy(&self, key: &str) -> FetchStrategy {
        if let Some(h) = self.external.get(key) {
            FetchStrategy::External(h.clone())
        } else if let Some(h) = self.custom.get(key) {
            FetchStrategy::Custom(h.clone())
        } else {
            FetchStrategy::Default
        }
    }
}
