//! SQL dialect definitions and formatting rules.
//!
//! Spec queries are composed from raw SQL fragments taken from configuration,
//! so the dialect only controls the parts the engine emits itself:
//!
//! - Identifier quoting: `` ` `` (MySQL), `"` (PostgreSQL/DuckDB)
//! - The literal LIMIT clause (`LIMIT 10`, `LIMIT 20, 10`)
//!
//! # Usage
//!
//! ```ignore
//! use shortcode::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::MySql;
//! let quoted = dialect.quote_identifier("customer");  // `customer`
//! ```

mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;

pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;

use std::str::FromStr;

use super::token::{Token, TokenStream};

/// SQL dialect trait - defines how engine-emitted SQL is rendered.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, table alias, column alias).
    ///
    /// - MySQL: `` `identifier` ``
    /// - PostgreSQL/DuckDB: `"identifier"`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Emit the LIMIT clause for a literal limit expression.
    ///
    /// The expression is passed through as written by the caller. MySQL
    /// accepts both `n` and `offset, n`.
    fn emit_limit(&self, limit: &str) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Limit)
            .space()
            .push(Token::Raw(limit.trim().to_string()));
        ts
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    MySql,
    Postgres,
    DuckDb,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::MySql => &MySql,
            Dialect::Postgres => &Postgres,
            Dialect::DuckDb => &DuckDb,
        }
    }
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn emit_limit(&self, limit: &str) -> TokenStream {
        self.dialect().emit_limit(limit)
    }
}

/// Error returned when a dialect name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown SQL dialect: {0}")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "duckdb" => Ok(Dialect::DuckDb),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}
