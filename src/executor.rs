//! Database executor interface.
//!
//! The engine only ever needs to run a SELECT and read back one row or a
//! row set. [`RecordingExecutor`] records every statement and replays
//! queued results; it backs dry runs and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use thiserror::Error;

pub type Row = Map<String, Value>;

/// Result of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub num_rows: usize,
    /// First row, empty when there are none.
    pub row: Row,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            num_rows: rows.len(),
            row: rows.first().cloned().unwrap_or_default(),
            rows,
        }
    }

    /// Build from JSON objects; anything else is skipped.
    pub fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Self::from_rows(
            values
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(m) => Some(m),
                    _ => None,
                })
                .collect(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Query failed: {message}\nSQL: {sql}")]
    Query { sql: String, message: String },

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Runs SQL and returns rows.
pub trait SqlExecutor: Send + Sync {
    fn query(&self, sql: &str) -> Result<QueryResult, ExecutorError>;
}

impl<F> SqlExecutor for F
where
    F: Fn(&str) -> Result<QueryResult, ExecutorError> + Send + Sync,
{
    fn query(&self, sql: &str) -> Result<QueryResult, ExecutorError> {
        self(sql)
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    queries: Vec<String>,
    responses: VecDeque<QueryResult>,
}

/// Records SQL and answers with queued results (empty once the queue runs
/// dry). Clones share state, so a test can keep a handle after moving one
/// into an aggregator.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next query.
    pub fn push_response(&self, result: QueryResult) -> &Self {
        self.lock().responses.push_back(result);
        self
    }

    pub fn with_response(self, result: QueryResult) -> Self {
        self.push_response(result);
        self
    }

    /// Every statement run so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.lock().queries.clone()
    }

    pub fn last_query(&self) -> Option<String> {
        self.lock().queries.last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SqlExecutor for RecordingExecutor {
    fn query(&self, sql: &str) -> Result<QueryResult, ExecutorError> {
        let mut state = self.lock();
        state.queries.push(sql.to_string());
        Ok(state.responses.pop_front().unwrap_or_default())
    }
}
