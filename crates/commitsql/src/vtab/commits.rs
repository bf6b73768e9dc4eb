//! SQLite virtual table glue for [`CommitCursor`].

use super::cursor::CommitCursor;
use super::planner::{self, ConstraintInfo, Operator, OrderInfo};
use super::schema::SCHEMA;
use crate::config::ModuleOptions;
use rusqlite::ffi;
use rusqlite::types::ValueRef;
use rusqlite::vtab::{
    Context, CreateVTab, IndexConstraintOp, IndexFlags, IndexInfo, VTab, VTabConnection,
    VTabCursor, VTabKind, Values,
};
use std::marker::PhantomData;
use std::os::raw::c_int;
use std::sync::Arc;

/// The `commits` table. Eponymous, so it needs no `CREATE VIRTUAL TABLE`.
#[repr(C)]
pub struct CommitsTable {
    /// Base class. Must be first
    base: ffi::sqlite3_vtab,
    options: Arc<ModuleOptions>,
}

fn operator(op: IndexConstraintOp) -> Operator {
    match op {
        IndexConstraintOp::SQLITE_INDEX_CONSTRAINT_EQ => Operator::Eq,
        IndexConstraintOp::SQLITE_INDEX_CONSTRAINT_LT => Operator::Lt,
        IndexConstraintOp::SQLITE_INDEX_CONSTRAINT_LE => Operator::Le,
        IndexConstraintOp::SQLITE_INDEX_CONSTRAINT_GT => Operator::Gt,
        IndexConstraintOp::SQLITE_INDEX_CONSTRAINT_GE => Operator::Ge,
        _ => Operator::Other,
    }
}

// negative column numbers refer to the rowid
fn column_index(column: c_int) -> usize {
    usize::try_from(column).unwrap_or(usize::MAX)
}

unsafe impl<'vtab> VTab<'vtab> for CommitsTable {
    type Aux = Arc<ModuleOptions>;
    type Cursor = CommitsCursor<'vtab>;

    fn connect(
        _db: &mut VTabConnection,
        aux: Option<&Arc<ModuleOptions>>,
        _args: &[&[u8]],
    ) -> rusqlite::Result<(String, CommitsTable)> {
        let table = CommitsTable {
            base: ffi::sqlite3_vtab::default(),
            options: aux.cloned().unwrap_or_default(),
        };
        Ok((SCHEMA.to_owned(), table))
    }

    fn best_index(&self, info: &mut IndexInfo) -> rusqlite::Result<()> {
        let constraints: Vec<ConstraintInfo> = info
            .constraints()
            .map(|c| ConstraintInfo {
                column: column_index(c.column()),
                op: operator(c.operator()),
                usable: c.is_usable(),
            })
            .collect();
        let order_by: Vec<OrderInfo> = info
            .order_bys()
            .map(|o| OrderInfo {
                column: column_index(o.column()),
                desc: o.is_order_by_desc(),
            })
            .collect();

        let plan = planner::plan(&constraints, &order_by)?;

        for (i, usage) in plan.usages.iter().enumerate() {
            if let Some(usage) = usage {
                let mut constraint_usage = info.constraint_usage(i);
                constraint_usage.set_argv_index(usage.argv_index as c_int);
                constraint_usage.set_omit(usage.omit);
            }
        }

        info.set_idx_str(&plan.token());
        info.set_order_by_consumed(plan.order_by_consumed);
        if plan.unique {
            info.set_idx_flags(IndexFlags::SQLITE_INDEX_SCAN_UNIQUE);
        }
        if let Some((cost, rows)) = plan.estimate {
            info.set_estimated_cost(cost);
            info.set_estimated_rows(rows);
        }
        Ok(())
    }

    fn open(&'vtab mut self) -> rusqlite::Result<CommitsCursor<'vtab>> {
        Ok(CommitsCursor::new(Arc::clone(&self.options)))
    }
}

impl<'vtab> CreateVTab<'vtab> for CommitsTable {
    const KIND: VTabKind = VTabKind::Eponymous;
}

/// Cursor handed to SQLite; all work happens in the wrapped [`CommitCursor`].
#[repr(C)]
pub struct CommitsCursor<'vtab> {
    /// Base class. Must be first
    base: ffi::sqlite3_vtab_cursor,
    inner: CommitCursor,
    phantom: PhantomData<&'vtab CommitsTable>,
}

impl<'vtab> CommitsCursor<'vtab> {
    fn new(options: Arc<ModuleOptions>) -> Self {
        CommitsCursor {
            base: ffi::sqlite3_vtab_cursor::default(),
            inner: CommitCursor::new(options),
            phantom: PhantomData,
        }
    }
}

impl Drop for CommitsCursor<'_> {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// Filter arguments as text; `NULL` stays `None`.
fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

unsafe impl VTabCursor for CommitsCursor<'_> {
    fn filter(
        &mut self,
        _idx_num: c_int,
        idx_str: Option<&str>,
        args: &Values<'_>,
    ) -> rusqlite::Result<()> {
        let values: Vec<Option<String>> = args.iter().map(value_text).collect();
        self.inner.filter(idx_str.unwrap_or_default(), &values)?;
        Ok(())
    }

    fn next(&mut self) -> rusqlite::Result<()> {
        self.inner.advance()?;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.inner.eof()
    }

    fn column(&self, ctx: &mut Context, i: c_int) -> rusqlite::Result<()> {
        ctx.set_result(&self.inner.column(column_index(i)))
    }

    // declared WITHOUT ROWID; SQLite identifies rows by hash
    fn rowid(&self) -> rusqlite::Result<i64> {
        Ok(0)
    }
}
