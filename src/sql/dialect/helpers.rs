//! Shared helper functions for SQL dialect implementations.

use super::super::token::{Token, TokenStream};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, DuckDB
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

// =============================================================================
// Pagination
// =============================================================================

/// Emit `LIMIT n OFFSET m` from a MySQL-style literal (`n` or `m, n`).
/// Used by: Postgres, DuckDB
pub fn emit_limit_standard(limit: &str) -> TokenStream {
    let mut ts = TokenStream::new();
    match limit.split_once(',') {
        Some((offset, count)) => {
            ts.push(Token::Limit)
                .space()
                .push(Token::Raw(count.trim().to_string()))
                .space()
                .push(Token::Offset)
                .space()
                .push(Token::Raw(offset.trim().to_string()));
        }
        None => {
            ts.push(Token::Limit)
                .space()
                .push(Token::Raw(limit.trim().to_string()));
        }
    }
    ts
}
