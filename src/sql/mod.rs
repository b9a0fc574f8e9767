//! SQL generation module.
//!
//! A small type-safe SELECT builder used to render spec queries:
//!
//! - [`query`] - SELECT query builder (comma joins and LEFT JOIN chains)
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod query;
pub mod token;


pub use dialect::{Dialect, SqlDialect, UnknownDialect};
pub use query::{Join, JoinType, Query, SelectExpr, TableRef};
pub use token::{Token, TokenStream};
