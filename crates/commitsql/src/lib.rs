//! # commitsql
//!
//! Query Git commit history using SQL.
//!
//! commitsql registers an eponymous SQLite virtual table, `commits`, that
//! reads a repository on demand. WHERE clauses on the commit hash, the
//! hidden `repository`/`ref` columns and `committer_when` ranges are pushed
//! down into the history walk, and `ORDER BY committer_when DESC` is served
//! without a sort.
//!
//! ## Quick Start
//!
//! ```no_run
//! use commitsql::{ModuleOptions, Result, SqlEngine};
//!
//! fn main() -> Result<()> {
//!     let engine = SqlEngine::new(ModuleOptions::new().with_default_repository("."))?;
//!     let result = engine.execute(
//!         "SELECT hash, author_name FROM commits ORDER BY committer_when DESC LIMIT 5",
//!     )?;
//!
//!     println!("Found {} commits", result.row_count());
//!     Ok(())
//! }
//! ```
//!
//! ## The `commits` table
//!
//! | column | notes |
//! |---|---|
//! | `hash` | primary key, `hash = ?` is a point lookup |
//! | `message`, `author_*`, `committer_*` | names and emails pass through `.mailmap` |
//! | `author_when`, `committer_when` | RFC 3339 text |
//! | `parents` | parent count |
//! | `repository`, `ref` | hidden; `commits('/path', 'main')` selects what to read |
//!
//! See [`vtab::COLUMNS`] for the full column list.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod mailmap;
pub mod sql;
pub mod vtab;

pub use cli::{Args, Command, OutputFormat};
pub use config::{DiscoverLocator, ModuleOptions, QueryContext, RepoLocator};
pub use error::{CommitsqlError, Result};
pub use git::GitRepo;
pub use mailmap::Mailmap;
pub use sql::{QueryResult, SqlEngine};
