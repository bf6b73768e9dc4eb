//! SQL engine wrapping an in-memory SQLite connection.

pub mod engine;

pub use engine::{QueryResult, SqlEngine};
