//! Query builder - construct SELECT queries with a fluent API.
//!
//! Only the two shapes spec queries need are supported: a comma join with
//! every condition in WHERE, or a chain of LEFT JOINs with ON clauses.

use super::dialect::{Dialect, SqlDialect};
use super::token::{Token, TokenStream};

// =============================================================================
// Select Expression (column with optional alias)
// =============================================================================

/// A SELECT list item: expression with optional alias.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectExpr {
    pub expr: TokenStream,
    pub alias: Option<String>,
}

impl SelectExpr {
    /// A raw SQL expression, e.g. `c.name` or `CONCAT(c.first, ' ', c.last)`.
    pub fn raw(sql: &str) -> Self {
        let mut expr = TokenStream::new();
        expr.push(Token::Raw(sql.into()));
        Self { expr, alias: None }
    }

    /// `COUNT(*)`
    pub fn count_star() -> Self {
        let mut expr = TokenStream::new();
        expr.push(Token::FunctionName("count".into()))
            .lparen()
            .push(Token::Star)
            .rparen();
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = self.expr.clone();
        if let Some(alias) = &self.alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.clone()));
        }
        ts
    }
}

// =============================================================================
// Table Reference
// =============================================================================

/// A table reference with optional alias, rendered as `` `table` `alias` ``.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(self.table.clone()));
        if let Some(alias) = &self.alias {
            ts.space().push(Token::Ident(alias.clone()));
        }
        ts
    }
}

// =============================================================================
// Joins
// =============================================================================

/// How an additional table enters the FROM clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// `FROM a, b` - conditions live in WHERE.
    Comma,
    /// `FROM a LEFT JOIN b ON (...)`
    Left,
}

/// An additional FROM entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    pub on: Option<String>,
}

impl Join {
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        match self.join_type {
            JoinType::Comma => {
                ts.comma().space();
                ts.append(&self.table.to_tokens());
            }
            JoinType::Left => {
                ts.space()
                    .push(Token::Left)
                    .space()
                    .push(Token::Join)
                    .space();
                ts.append(&self.table.to_tokens());
                if let Some(on) = &self.on {
                    ts.space()
                        .push(Token::On)
                        .space()
                        .lparen()
                        .push(Token::Raw(on.clone()))
                        .rparen();
                }
            }
        }

        ts
    }
}

// =============================================================================
// Query Builder
// =============================================================================

/// A SELECT query.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "Query has no effect until converted to SQL with to_sql() or to_tokens()"]
pub struct Query {
    pub select: Vec<SelectExpr>,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    /// WHERE conditions, ANDed in order.
    pub where_clause: Vec<String>,
    pub order_by: Option<String>,
    pub limit: Option<String>,
}

impl Query {
    /// Create a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SELECT list.
    pub fn select(mut self, exprs: Vec<SelectExpr>) -> Self {
        self.select = exprs;
        self
    }

    /// Set the FROM table.
    pub fn from(mut self, table: TableRef) -> Self {
        self.from = Some(table);
        self
    }

    /// Add a table to a comma join.
    pub fn comma_join(mut self, table: TableRef) -> Self {
        self.joins.push(Join {
            join_type: JoinType::Comma,
            table,
            on: None,
        });
        self
    }

    /// Add a LEFT JOIN. `on` is wrapped in parentheses when rendered.
    pub fn left_join(mut self, table: TableRef, on: Option<String>) -> Self {
        self.joins.push(Join {
            join_type: JoinType::Left,
            table,
            on,
        });
        self
    }

    /// Add a WHERE condition (ANDed with existing conditions).
    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.where_clause.push(condition.into());
        self
    }

    /// Set the ORDER BY clause (raw expression list).
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Set LIMIT (literal, e.g. `10` or `20, 10`).
    pub fn limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Convert to token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        // SELECT
        ts.push(Token::Select);
        for (i, select_expr) in self.select.iter().enumerate() {
            if i == 0 {
                ts.space();
            } else {
                ts.comma().space();
            }
            ts.append(&select_expr.to_tokens());
        }

        // FROM
        if let Some(from) = &self.from {
            ts.space().push(Token::From).space();
            ts.append(&from.to_tokens());
        }

        // JOINs
        for join in &self.joins {
            ts.append(&join.to_tokens());
        }

        // WHERE
        for (i, condition) in self.where_clause.iter().enumerate() {
            if i == 0 {
                ts.space().push(Token::Where).space();
            } else {
                ts.space().push(Token::And).space();
            }
            ts.push(Token::Raw(condition.clone()));
        }

        // ORDER BY
        if let Some(order_by) = &self.order_by {
            ts.space()
                .push(Token::OrderBy)
                .space()
                .push(Token::Raw(order_by.clone()));
        }

        // LIMIT
        if let Some(limit) = &self.limit {
            ts.space();
            ts.append(&dialect.emit_limit(limit));
        }

        ts
    }

    /// Generate SQL string for a specific dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }
}

impl std::fmt::Display for Query {
    /// Formats the query using the default dialect (MySQL).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql(Dialect::default()))
    }
}

// =============================================================================
// Tests
// =============================================================================
