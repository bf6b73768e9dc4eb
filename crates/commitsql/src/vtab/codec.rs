//! Plan token encoding.
//!
//! `best_index` and `filter` run in separate calls and can only share an
//! index string that SQLite carries between them. The token is a sequence of
//! tags, one per argument SQLite will pass to `filter`, in argument order.
//! Each tag is one byte:
//!
//! ```text
//!     |    role     |   column    |
//!     7   6   5   4   3   2   1   0
//! ```
//!
//! The column nibble limits the table to [`MAX_COLUMNS`] columns. Growing the
//! schema past that needs a new encoding, not a bigger constant.
//!
//! The bytes are hex encoded so the index string is always valid UTF-8.

use crate::error::{CommitsqlError, Result};

/// Highest column count a tag can address.
pub const MAX_COLUMNS: usize = 16;

/// What a pushed-down constraint means to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Role {
    /// Equality on the primary key; fetch a single commit.
    Lookup = 1,
    /// `<` bound on a timestamp.
    Upper = 2,
    /// `>` bound on a timestamp.
    Lower = 3,
    /// Selects what to scan rather than filtering rows.
    PassThrough = 4,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Lookup, Role::Upper, Role::Lower, Role::PassThrough];

    fn from_nibble(nibble: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|role| *role as u8 == nibble)
    }
}

/// A (role, column) pair for one filter argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub role: Role,
    pub column: u8,
}

impl Tag {
    pub fn new(role: Role, column: usize) -> Self {
        debug_assert!(column < MAX_COLUMNS, "column {column} does not fit in a tag");
        Self {
            role,
            column: column as u8,
        }
    }

    pub fn column(&self) -> usize {
        usize::from(self.column)
    }

    fn to_byte(self) -> u8 {
        (self.role as u8) << 4 | (self.column & 0x0f)
    }

    fn from_byte(byte: u8) -> Result<Self> {
        let role = Role::from_nibble(byte >> 4).ok_or_else(|| {
            CommitsqlError::PlanToken(format!("unknown role in tag {byte:#04x}"))
        })?;
        Ok(Self {
            role,
            column: byte & 0x0f,
        })
    }
}

pub fn encode(tags: &[Tag]) -> String {
    let bytes: Vec<u8> = tags.iter().map(|tag| tag.to_byte()).collect();
    hex::encode(bytes)
}

pub fn decode(token: &str) -> Result<Vec<Tag>> {
    let bytes = hex::decode(token)
        .map_err(|e| CommitsqlError::PlanToken(format!("{token:?}: {e}")))?;
    bytes.into_iter().map(Tag::from_byte).collect()
}
