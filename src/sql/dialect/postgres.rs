//! PostgreSQL SQL dialect.

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn emit_limit(&self, limit: &str) -> TokenStream {
        helpers::emit_limit_standard(limit)
    }
}
