//! The `commits` virtual table.
//!
//! Submodules, leaves first:
//! - `schema`: declared columns and their indexes
//! - `codec`: plan token shared by `best_index` and `filter`
//! - `planner`: constraint pushdown and sort elision
//! - `cursor`: filter/advance/column/close over a commit traversal
//! - `commits`: the `rusqlite` virtual table implementation

pub mod codec;
pub mod commits;
pub mod cursor;
pub mod planner;
pub mod schema;

pub use commits::{CommitsCursor, CommitsTable};
pub use cursor::CommitCursor;
pub use schema::{ColumnInfo, COLUMNS, SCHEMA, TABLE_NAME};

use crate::config::ModuleOptions;
use crate::error::Result;
use rusqlite::vtab::read_only_module;
use rusqlite::Connection;
use std::sync::Arc;

/// Registers the `commits` module on `conn`.
///
/// ```no_run
/// use commitsql::{vtab, ModuleOptions};
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory()?;
/// vtab::register(&conn, ModuleOptions::new().with_default_repository("."))?;
/// let count: i64 = conn.query_row("SELECT COUNT(*) FROM commits", [], |r| r.get(0))?;
/// println!("{count} commits");
/// # Ok::<(), commitsql::CommitsqlError>(())
/// ```
pub fn register(conn: &Connection, options: ModuleOptions) -> Result<()> {
    conn.create_module(
        TABLE_NAME,
        read_only_module::<CommitsTable>(),
        Some(Arc::new(options)),
    )?;
    Ok(())
}
