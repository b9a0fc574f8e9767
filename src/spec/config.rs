//! Declarative spec configuration, as stored in `<spec_dir>/<key>.toml`.
//!
//! ```toml
//! table = "customer"
//! table_alias = "c"
//!
//! [[joins]]
//! table = "address"
//! table_alias = "a"
//! on = "a.customer_id = <TABLE>.id"
//!
//! [[fields]]
//! name = "id"
//!
//! [[fields]]
//! name = "full_name"
//! sql = "CONCAT(<TABLE>.first_name, ' ', <TABLE>.last_name)"
//! description = "First and last name"
//! postprocess = "trim"
//!
//! [[fields]]
//! name = "city"
//! table_alias = "a"
//! ```

use serde::{Deserialize, Serialize};

/// Table, joins and fields of one named entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpecConfig {
    /// Never fetched through SQL.
    pub nosql: bool,
    pub table: String,
    pub table_alias: String,
    pub joins: Vec<JoinConfig>,
    /// Ordered field list.
    pub fields: Vec<FieldConfig>,
}

impl FieldSpecConfig {
    pub fn new(table: &str, table_alias: &str) -> Self {
        Self {
            table: table.to_string(),
            table_alias: table_alias.to_string(),
            ..Default::default()
        }
    }

    /// A config that is never queried; data arrives through fetchers.
    pub fn nosql() -> Self {
        Self {
            nosql: true,
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(FieldConfig::new));
        self
    }

    pub fn with_join(mut self, join: JoinConfig) -> Self {
        self.joins.push(join);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Put `extra` ahead of the configured fields. A configured field with
    /// the same name replaces the extra entry in place.
    pub fn prepend_fields(&mut self, extra: &[FieldConfig]) {
        if extra.is_empty() {
            return;
        }
        let mut merged: Vec<FieldConfig> = Vec::with_capacity(extra.len() + self.fields.len());
        for f in extra.iter().chain(self.fields.iter()) {
            match merged.iter_mut().find(|m| m.name == f.name) {
                Some(existing) => *existing = f.clone(),
                None => merged.push(f.clone()),
            }
        }
        self.fields = merged;
    }
}

/// An additional table joined when one of its fields is projected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinConfig {
    pub table: String,
    pub table_alias: String,
    /// Join condition; `<TABLE>` expands to the spec's table alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,
}

impl JoinConfig {
    pub fn new(table: &str, table_alias: &str) -> Self {
        Self {
            table: table.to_string(),
            table_alias: table_alias.to_string(),
            on: None,
        }
    }

    pub fn on(mut self, condition: &str) -> Self {
        self.on = Some(condition.to_string());
        self
    }
}

/// Per-field metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub name: String,
    /// SQL expression template. `<TABLE>` and request vars are substituted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    /// Table alias override, usually pointing at one of the joins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_alias: Option<String>,
    /// Real column name when it differs from `name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    /// Left out of field descriptions.
    pub hidden: bool,
    /// Never projected.
    pub nosql: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of a registered postprocess transform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postprocess: Option<String>,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn sql(mut self, sql: &str) -> Self {
        self.sql = Some(sql.to_string());
        self
    }

    pub fn table_alias(mut self, alias: &str) -> Self {
        self.table_alias = Some(alias.to_string());
        self
    }

    pub fn alias_of(mut self, column: &str) -> Self {
        self.alias_of = Some(column.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn nosql(mut self) -> Self {
        self.nosql = true;
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn postprocess(mut self, name: &str) -> Self {
        self.postprocess = Some(name.to_string());
        self
    }
}
