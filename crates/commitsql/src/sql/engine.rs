//! SQL query engine over the `commits` virtual table.

use crate::config::ModuleOptions;
use crate::error::Result;
use crate::vtab;
use rusqlite::{Connection, Row};
use serde::Serialize;
use serde_json::{Map, Value};

/// The SQL query engine that executes queries against Git commit history.
///
/// `SqlEngine` owns an in-memory SQLite connection with the `commits`
/// module registered. Nothing is copied into SQLite up front; every query
/// reads the repository through the virtual table.
///
/// # Example
///
/// ```no_run
/// use commitsql::{ModuleOptions, SqlEngine};
///
/// let engine = SqlEngine::new(ModuleOptions::new().with_default_repository("."))?;
/// let result = engine.execute("SELECT hash, message FROM commits LIMIT 10")?;
/// println!("Columns: {:?}", result.columns);
/// # Ok::<(), commitsql::CommitsqlError>(())
/// ```
pub struct SqlEngine {
    conn: Connection,
}

impl SqlEngine {
    /// Creates an engine with the `commits` module configured by `options`.
    pub fn new(options: ModuleOptions) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        vtab::register(&conn, options)?;
        Ok(Self { conn })
    }

    /// Creates an engine whose default repository is `path`.
    pub fn for_repository(path: impl Into<String>) -> Result<Self> {
        Self::new(ModuleOptions::new().with_default_repository(path))
    }

    /// Returns the underlying connection, e.g. to prepare statements directly.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Executes a SQL query and returns the results.
    ///
    /// The query can use any SQL features supported by SQLite, including JOINs,
    /// CTEs, window functions, and aggregations. An error raised while reading
    /// the repository fails the whole query.
    pub fn execute(&self, query: &str) -> Result<QueryResult> {
        let mut stmt = self.conn.prepare(query)?;

        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let rows: Vec<Vec<Value>> = stmt
            .query_map([], |row| Ok(row_to_values(row, column_names.len())))?
            .collect::<rusqlite::Result<_>>()?;

        Ok(QueryResult {
            columns: column_names,
            rows,
        })
    }

    /// Returns the `detail` lines of `EXPLAIN QUERY PLAN` for `query`.
    pub fn explain(&self, query: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!("EXPLAIN QUERY PLAN {query}"))?;
        let details = stmt
            .query_map([], |row| row.get::<_, String>(3))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(details)
    }
}

fn row_to_values(row: &Row, col_count: usize) -> Vec<Value> {
    (0..col_count)
        .map(|i| {
            if let Ok(v) = row.get::<_, Option<i64>>(i) {
                match v {
                    Some(n) => Value::Number(n.into()),
                    None => Value::Null,
                }
            } else if let Ok(v) = row.get::<_, Option<f64>>(i) {
                match v {
                    Some(n) => {
                        if let Some(num) = serde_json::Number::from_f64(n) {
                            Value::Number(num)
                        } else {
                            Value::String(n.to_string())
                        }
                    }
                    None => Value::Null,
                }
            } else if let Ok(v) = row.get::<_, Option<String>>(i) {
                match v {
                    Some(s) => Value::String(s),
                    None => Value::Null,
                }
            } else {
                Value::Null
            }
        })
        .collect()
}

/// The result of a SQL query execution.
#[derive(Debug, Serialize)]
pub struct QueryResult {
    /// Column names from the query.
    pub columns: Vec<String>,
    /// Row data as JSON values.
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Returns true if the result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Values of one column by name, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }

    /// Converts the result to a JSON array of objects.
    ///
    /// Each row becomes a JSON object with column names as keys.
    pub fn to_json_array(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (i, col) in self.columns.iter().enumerate() {
                    obj.insert(col.clone(), row.get(i).cloned().unwrap_or(Value::Null));
                }
                Value::Object(obj)
            })
            .collect()
    }
}
