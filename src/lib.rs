//! # Shortcode
//!
//! Spec-driven query composition and data merging for logic-less templates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           SpecRequest + FieldSpecConfig (TOML/JSON)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [spec]
//! ┌─────────────────────────────────────────────────────────┐
//! │     FieldSpec (filtered fields, projection, joins)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [aggregator: reconcile with template]
//! ┌─────────────────────────────────────────────────────────┐
//! │   DataParamGroups → SQL / custom / external fetchers     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [reshape + merge]
//! ┌─────────────────────────────────────────────────────────┐
//! │            Result tree → template renderer               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use shortcode::prelude::*;
//!
//! let mut agg = Aggregator::new(loader, executor, Mustache::new());
//! agg.init_specs(vec!["customer".into(), "customer_group".into()], None)?
//!     .set_template("{{customer.name}} ({{customer_group.name}})")
//!     .extract_fields_from_template(&[] as &[&str], true)?
//!     .set_data_params(vec![DataParamGroup::new(["customer", "customer_group"])
//!         .key_alias("customer")
//!         .where_all("c.id = 1")
//!         .on("customer_group", "cg.id = c.group_id")]);
//! agg.fetch()?;
//! println!("{}", agg.render()?);
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod executor;
pub mod spec;
pub mod sql;
pub mod template;

pub use error::{ShortcodeError, ShortcodeResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::aggregator::{
        Aggregator, DataParamGroup, FetchStrategy, GroupData, WhereClause,
    };
    pub use crate::config::{JobFile, Settings};
    pub use crate::error::{ShortcodeError, ShortcodeResult};
    pub use crate::executor::{QueryResult, RecordingExecutor, SqlExecutor};
    pub use crate::spec::{
        DirLoader, FieldConfig, FieldSpec, FieldSpecConfig, JoinConfig, MemoryLoader, Postprocess,
        PostprocessRegistry, SpecLoader, SpecRequest,
    };
    pub use crate::sql::{Dialect, SqlDialect};
    pub use crate::template::{Mustache, TemplateRenderer};
}
