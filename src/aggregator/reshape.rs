//! Raw rows to aliased field maps.
//!
//! A column named `<alias>___<field>` lands at `row[alias][field]` after
//! postprocessing, provided the alias belongs to the group and the field is
//! still selected. Every other column is dropped.

use serde_json::{Map, Value};

use super::fetch::GroupData;
use super::group::DataParamGroup;
use crate::spec::{SpecSet, FIELD_ALIAS_SEPARATOR};

/// Reshape fetched rows for `aliases`. Plural groups produce
/// [`GroupData::Rows`], others a single map.
pub fn reshape(
    data: GroupData,
    aliases: &[String],
    specs: &SpecSet,
    group: &DataParamGroup,
    plural: bool,
) -> GroupData {
    if data.is_empty() {
        return if plural {
            GroupData::Rows(Vec::new())
        } else {
            GroupData::empty()
        };
    }

    if plural {
        let rows = data
            .into_rows()
            .iter()
            .filter_map(Value::as_object)
            .map(|row| Value::Object(reshape_row(row, aliases, specs, group)))
            .collect();
        GroupData::Rows(rows)
    } else {
        let row = match data {
            GroupData::Single(m) => m,
            GroupData::Rows(rows) => rows
                .into_iter()
                .find_map(|r| match r {
                    Value::Object(m) => Some(m),
                    _ => None,
                })
                .unwrap_or_default(),
        };
        GroupData::Single(reshape_row(&row, aliases, specs, group))
    }
}

/// Reshape one row. Each alias starts as an empty object.
pub fn reshape_row(
    row: &Map<String, Value>,
    aliases: &[String],
    specs: &SpecSet,
    group: &DataParamGroup,
) -> Map<String, Value> {
    let mut out: Map<String, Value> = aliases
        .iter()
        .map(|a| (a.clone(), Value::Object(Map::new())))
        .collect();

    for (column, value) in row {
        let mut parts = column.split(FIELD_ALIAS_SEPARATOR);
        let (Some(alias), Some(field)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some(spec) = specs.get(alias) else {
            continue;
        };
        if !spec.is_selected(field) {
            continue;
        }
        let Some(Value::Object(target)) = out.get_mut(alias) else {
            continue;
        };

        let value = match group.postprocess.get(field).or_else(|| spec.postprocess_for(field)) {
            Some(p) => p.apply(value.clone()),
            None => value.clone(),
        };
        target.insert(field.to_string(), value);
    }

    out
}
