//! Git plumbing used by the `commits` table.
//!
//! Submodules:
//! - `repository`: repository wrapper, revision resolution and tree reads
//! - `log`: owned commit records and the history walks built on them

pub mod log;
pub mod repository;

pub use log::{CommitLog, CommitLookup, CommitRecord, CommitSource, LogOptions, Signature};
pub use repository::GitRepo;
