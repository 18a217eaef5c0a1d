//! Persistence collaborator.
//!
//! # Data Flow
//! ```text
//! model (User, Post)
//!     → Database::query(sql)        prepare a statement template
//!     → Statement::bind(":name", v) bind named placeholders
//!     → execute / single / result_set
//!     → row_count                   rows returned or changed
//! ```
//!
//! # Design Decisions
//! - Handlers and models only see the `Database`/`Statement` traits
//! - Values and rows are JSON values so they flow straight into views
//! - Failures are typed (`DbError`) and propagate, never abort the process

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteDatabase;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single result row, column name → value.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database connection lock poisoned")]
    Poisoned,
    #[error("row decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("statement failed: {0}")]
    Failed(String),
}

/// A prepared statement template with bound values.
pub trait Statement {
    /// Bind a value to a named placeholder (e.g. `:email`). Rebinding replaces.
    fn bind(&mut self, placeholder: &str, value: Value);

    /// Run a statement that returns no rows.
    fn execute(&mut self) -> Result<(), DbError>;

    /// Run a query and return every row.
    fn result_set(&mut self) -> Result<Vec<Row>, DbError>;

    /// Run a query and return the first row.
    fn single(&mut self) -> Result<Option<Row>, DbError> {
        Ok(self.result_set()?.into_iter().next())
    }

    /// Rows returned by the last query or changed by the last execute.
    fn row_count(&self) -> usize;

    /// Rowid generated by the last execute, if it inserted.
    fn last_insert_id(&self) -> Option<i64>;
}

/// A data store reachable through statement templates.
pub trait Database: Send + Sync {
    fn query<'a>(&'a self, sql: &str) -> Box<dyn Statement + 'a>;
}

/// Decode a row into a typed record.
pub fn decode<T: DeserializeOwned>(row: Row) -> Result<T, DbError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}
