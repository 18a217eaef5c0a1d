//! SQLite-backed `Database`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::{ToSql, Value as SqlValue, ValueRef};
use rusqlite::Connection;
use serde_json::Value;

use crate::persistence::schema::create_tables;
use crate::persistence::{Database, DbError, Row, Statement};

/// A single SQLite connection shared behind a mutex.
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Open (or create) the database file and apply the schema.
    /// `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let conn = if path == Path::new(":memory:") {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        tracing::info!(path = %path.display(), "Database opened");
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        create_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }
}

impl Database for SqliteDatabase {
    fn query<'a>(&'a self, sql: &str) -> Box<dyn Statement + 'a> {
        Box::new(SqliteStatement {
            db: self,
            sql: sql.to_string(),
            binds: Vec::new(),
            row_count: 0,
            last_insert_id: None,
        })
    }
}

struct SqliteStatement<'a> {
    db: &'a SqliteDatabase,
    sql: String,
    binds: Vec<(String, SqlValue)>,
    row_count: usize,
    last_insert_id: Option<i64>,
}

impl SqliteStatement<'_> {
    fn params(&self) -> Vec<(&str, &dyn ToSql)> {
        self.binds
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

impl Statement for SqliteStatement<'_> {
    fn bind(&mut self, placeholder: &str, value: Value) {
        let value = to_sql_value(value);
        match self.binds.iter_mut().find(|(name, _)| name == placeholder) {
            Some(slot) => slot.1 = value,
            None => self.binds.push((placeholder.to_string(), value)),
        }
    }

    fn execute(&mut self) -> Result<(), DbError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&self.sql)?;
        let params = self.params();
        let changed = stmt.execute(params.as_slice())?;

        let inserted = changed > 0
            && self
                .sql
                .trim_start()
                .get(..6)
                .is_some_and(|verb| verb.eq_ignore_ascii_case("insert"));
        self.row_count = changed;
        self.last_insert_id = inserted.then(|| conn.last_insert_rowid());
        tracing::trace!(sql = %self.sql, changed, "Statement executed");
        Ok(())
    }

    fn result_set(&mut self) -> Result<Vec<Row>, DbError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&self.sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let params = self.params();

        let mut rows = stmt.query(params.as_slice())?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, column) in columns.iter().enumerate() {
                record.insert(column.clone(), from_sql_value(row.get_ref(i)?));
            }
            out.push(record);
        }

        self.row_count = out.len();
        tracing::trace!(sql = %self.sql, rows = out.len(), "Query executed");
        Ok(out)
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}

fn to_sql_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::String(hex::encode(blob)),
    }
}
