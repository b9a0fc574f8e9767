//! Field specs: declarative field sets and how they are built.
//!
//! - [`config`] - on-disk configuration types
//! - [`request`] - per-spec request parameters
//! - [`loader`] - configuration loaders (directory, memory)
//! - [`field_spec`] - filtering, projection and descriptions
//! - [`postprocess`] - field value transforms

pub mod config;
pub mod field_spec;
pub mod loader;
pub mod postprocess;
pub mod request;
pub mod set;

pub use config::{FieldConfig, FieldSpecConfig, JoinConfig};
pub use field_spec::{column_alias, FieldSpec, ProjectedField, Projection};
pub use loader::{DirLoader, LoadError, LoadResult, MemoryLoader, SpecLoader};
pub use postprocess::{Postprocess, PostprocessRegistry};
pub use request::SpecRequest;
pub use set::SpecSet;

/// Separates the spec alias from the field name in column aliases.
pub const FIELD_ALIAS_SEPARATOR: &str = "___";

/// Placeholder for the table alias in field SQL and join conditions,
/// written as `<TABLE>`.
pub const TABLE_PLACEHOLDER: &str = "TABLE";
