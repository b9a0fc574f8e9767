//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible for everything the engine emits.

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn emit_limit(&self, limit: &str) -> TokenStream {
        helpers::emit_limit_standard(limit)
    }
}
