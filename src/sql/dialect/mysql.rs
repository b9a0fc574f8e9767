//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI that matter here:
//! - Backtick identifier quoting (`` `name` ``)
//! - `LIMIT offset, count` shorthand

use super::helpers;
use super::SqlDialect;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    // Uses default emit_limit (LIMIT passthrough)
}
