//! Template-field reconciliation.
//!
//! Field references found in a template (`customer.name`, `customers`,
//! `separator`) are checked against the declared specs, and specs or fields
//! the template never uses are pruned before anything is fetched.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::spec::SpecSet;
use crate::template::TemplateToken;

static FIELD_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.]*").unwrap());

/// Always accepted as a template reference.
pub const RESERVED_SEPARATOR: &str = "separator";

/// Data references from `tokens`, cut to their leading `[\w.]` run and
/// de-duplicated in first-seen order.
pub fn extract_fields(tokens: &[TemplateToken]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in tokens.iter().filter(|t| t.is_data_reference()) {
        let name = FIELD_NAME_RE
            .find(&token.name)
            .map(|m| m.as_str())
            .unwrap_or_default();
        if !name.is_empty() && !out.iter().any(|f| f == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// References that match nothing declared, in input order; per-spec
/// unknown fields follow, as `alias.field`, in spec order.
pub fn check_fields<S: AsRef<str>>(fields: &[S], specs: &SpecSet) -> Vec<String> {
    let mut unknown = Vec::new();
    let mut by_alias: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for field in fields.iter().map(AsRef::as_ref) {
        if field == RESERVED_SEPARATOR || specs.is_plural_path(field) || specs.contains(field) {
            continue;
        }
        match field.split_once('.') {
            Some((alias, name)) if !name.contains('.') && specs.contains(alias) => {
                by_alias.entry(alias).or_default().push(name);
            }
            _ => unknown.push(field.to_string()),
        }
    }

    for spec in specs {
        if let Some(names) = by_alias.get(spec.key_alias()) {
            unknown.extend(
                spec.check_fields(names)
                    .into_iter()
                    .map(|f| format!("{}.{}", spec.key_alias(), f)),
            );
        }
    }
    unknown
}

/// Keep only specs referenced by `fields`, each restricted to the fields
/// referenced through it. A bare alias keeps its spec with no fields.
pub fn prune_to_fields<S: AsRef<str>>(fields: &[S], specs: &mut SpecSet, do_check: bool) {
    let unknown = if do_check {
        check_fields(fields, specs)
    } else {
        Vec::new()
    };

    let mut by_alias: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for field in fields.iter().map(AsRef::as_ref) {
        if unknown.iter().any(|u| u == field) {
            continue;
        }
        let mut parts = field.split('.');
        let Some(alias) = parts.next() else {
            continue;
        };
        if !specs.contains(alias) {
            continue;
        }
        let names = by_alias.entry(alias.to_string()).or_default();
        if let Some(name) = parts.next() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }

    specs.retain(|spec| {
        let keep = by_alias.contains_key(spec.key_alias());
        if !keep {
            tracing::trace!(alias = spec.key_alias(), "spec not referenced, dropped");
        }
        keep
    });
    for spec in specs.iter_mut() {
        if let Some(names) = by_alias.get(spec.key_alias()) {
            spec.set_include_only(names);
        }
    }
}
