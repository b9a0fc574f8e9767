//! Field descriptions shaped like the data tree.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::tree::{split_path, ResultTree};
use crate::spec::SpecSet;

/// Marks a description node whose data is a list.
pub const IS_ARRAY_KEY: &str = "__is_array";

/// Replaces the descriptions of one alias.
pub type DescriptionOverride = Arc<dyn Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync>;

/// Post-processes the whole description tree.
pub type DescriptionHook = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Build the description tree: non-plural specs at `out[alias]`, plural ones
/// under their path node, which is flagged with `__is_array: true`.
pub fn field_descriptions(
    specs: &SpecSet,
    overrides: &HashMap<String, DescriptionOverride>,
    hook: Option<&DescriptionHook>,
) -> Value {
    let mut tree = ResultTree::new();

    for spec in specs {
        let alias = spec.key_alias();
        let mut fields = spec.descriptions();
        if let Some(f) = overrides.get(alias) {
            fields = f(fields);
        }

        if spec.is_plural() {
            let path = split_path(spec.plural());
            if let Some(node) = tree.ensure_map(&path) {
                tree.insert(node, IS_ARRAY_KEY, Value::Bool(true));
                tree.insert(node, alias, Value::Object(fields));
            }
        } else {
            tree.insert(ResultTree::ROOT, alias, Value::Object(fields));
        }
    }

    let out = tree.into_value();
    match hook {
        Some(h) => h(out),
        None => out,
    }
}
