//! Declared schema of the `commits` virtual table.

use super::codec::MAX_COLUMNS;
use serde::Serialize;

pub const TABLE_NAME: &str = "commits";

pub const SCHEMA: &str = "CREATE TABLE commits (
    hash            TEXT,
    message         TEXT,
    author_name     TEXT,
    author_email    TEXT,
    author_when     DATETIME,
    committer_name  TEXT,
    committer_email TEXT,
    committer_when  DATETIME,
    parents         INT,

    repository      HIDDEN,
    ref             HIDDEN,
    PRIMARY KEY (hash)
) WITHOUT ROWID";

pub const COL_HASH: usize = 0;
pub const COL_MESSAGE: usize = 1;
pub const COL_AUTHOR_NAME: usize = 2;
pub const COL_AUTHOR_EMAIL: usize = 3;
pub const COL_AUTHOR_WHEN: usize = 4;
pub const COL_COMMITTER_NAME: usize = 5;
pub const COL_COMMITTER_EMAIL: usize = 6;
pub const COL_COMMITTER_WHEN: usize = 7;
pub const COL_PARENTS: usize = 8;
pub const COL_REPOSITORY: usize = 9;
pub const COL_REF: usize = 10;

/// Describes one column of the `commits` table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub hidden: bool,
    pub description: &'static str,
}

const fn column(name: &'static str, sql_type: &'static str, description: &'static str) -> ColumnInfo {
    ColumnInfo {
        name,
        sql_type,
        hidden: false,
        description,
    }
}

const fn hidden(name: &'static str, description: &'static str) -> ColumnInfo {
    ColumnInfo {
        name,
        sql_type: "TEXT",
        hidden: true,
        description,
    }
}

/// Columns in declaration order; the index is the column number SQLite uses.
pub const COLUMNS: &[ColumnInfo] = &[
    column("hash", "TEXT", "Full 40 character commit hash (primary key)"),
    column("message", "TEXT", "Full commit message"),
    column("author_name", "TEXT", "Author name after .mailmap resolution"),
    column("author_email", "TEXT", "Author email after .mailmap resolution"),
    column("author_when", "DATETIME", "Author timestamp, RFC 3339"),
    column("committer_name", "TEXT", "Committer name after .mailmap resolution"),
    column("committer_email", "TEXT", "Committer email after .mailmap resolution"),
    column("committer_when", "DATETIME", "Committer timestamp, RFC 3339"),
    column("parents", "INT", "Number of parent commits"),
    hidden("repository", "Repository path to read (defaults to the configured repository)"),
    hidden("ref", "Revision to start from (defaults to HEAD)"),
];

// plan tags store the column number in four bits
const _: () = assert!(COLUMNS.len() <= MAX_COLUMNS);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_indexes_match_declaration() {
        assert_eq!(COLUMNS[COL_HASH].name, "hash");
        assert_eq!(COLUMNS[COL_MESSAGE].name, "message");
        assert_eq!(COLUMNS[COL_AUTHOR_NAME].name, "author_name");
        assert_eq!(COLUMNS[COL_AUTHOR_EMAIL].name, "author_email");
        assert_eq!(COLUMNS[COL_AUTHOR_WHEN].name, "author_when");
        assert_eq!(COLUMNS[COL_COMMITTER_NAME].name, "committer_name");
        assert_eq!(COLUMNS[COL_COMMITTER_EMAIL].name, "committer_email");
        assert_eq!(COLUMNS[COL_COMMITTER_WHEN].name, "committer_when");
        assert_eq!(COLUMNS[COL_PARENTS].name, "parents");
        assert_eq!(COLUMNS[COL_REPOSITORY].name, "repository");
        assert_eq!(COLUMNS[COL_REF].name, "ref");
    }

    #[test]
    fn test_schema_declares_every_column_in_order() {
        let mut last = 0;
        for col in COLUMNS {
            let pos = SCHEMA[last..]
                .find(&format!(" {} ", col.name))
                .map(|p| p + last)
                .unwrap_or_else(|| panic!("{} missing from schema", col.name));
            last = pos;
        }
    }
}
