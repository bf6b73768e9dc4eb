//! Cursor engine for the `commits` table.
//!
//! [`CommitCursor`] is driven through the same steps SQLite uses for a
//! virtual table cursor: `filter` once per scan, then `column`/`advance`
//! until `eof`, then `close` (or drop). It knows nothing about the SQLite
//! ABI; `vtab::commits` adapts it.

use super::codec::{self, Role, Tag};
use super::schema::*;
use crate::config::{ModuleOptions, SKIP_MAILMAP_KEY};
use crate::error::{CommitsqlError, Result};
use crate::git::log::parse_time;
use crate::git::{CommitRecord, CommitSource, GitRepo, LogOptions};
use crate::mailmap::Mailmap;
use chrono::{DateTime, FixedOffset};
use git2::Oid;
use rusqlite::types::Value;
use std::sync::Arc;

/// Filter arguments routed by their plan tags.
#[derive(Debug, Default, PartialEq, Eq)]
struct FilterArgs {
    hash: Option<String>,
    repository: Option<String>,
    reference: Option<String>,
    since: Option<String>,
    until: Option<String>,
}

impl FilterArgs {
    fn route(tags: &[Tag], values: &[Option<String>]) -> Result<Self> {
        if tags.len() != values.len() {
            return Err(CommitsqlError::PlanToken(format!(
                "plan has {} tags but filter received {} arguments",
                tags.len(),
                values.len()
            )));
        }

        let mut args = FilterArgs::default();
        for (tag, value) in tags.iter().zip(values) {
            let slot = match (tag.role, tag.column()) {
                // NULL never equals a hash, so it must not widen to a scan
                (Role::Lookup, COL_HASH) => {
                    args.hash = Some(value.clone().unwrap_or_default());
                    continue;
                }
                (Role::PassThrough, COL_REPOSITORY) => &mut args.repository,
                (Role::PassThrough, COL_REF) => &mut args.reference,
                (Role::Lower, COL_COMMITTER_WHEN) => &mut args.since,
                (Role::Upper, COL_COMMITTER_WHEN) => &mut args.until,
                _ => {
                    return Err(CommitsqlError::PlanToken(format!(
                        "unexpected tag {tag:?}"
                    )))
                }
            };
            *slot = value.clone();
        }
        Ok(args)
    }
}

/// Parses an optional range bound, dropping values that are not RFC 3339.
fn parse_bound(name: &str, value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let value = value?;
    let parsed = parse_time(value);
    if parsed.is_none() {
        tracing::debug!(bound = name, value, "ignoring unparsable range bound");
    }
    parsed
}

fn load_mailmap(repo: &GitRepo, commit: Oid) -> Result<Option<Mailmap>> {
    let wrap = |e| CommitsqlError::MailmapLoad {
        path: repo.path().to_string(),
        revision: commit.to_string(),
        source: Box::new(e),
    };
    let Some(text) = repo.read_file(commit, ".mailmap").map_err(wrap)? else {
        return Ok(None);
    };
    let mailmap = Mailmap::parse(&text).map_err(wrap)?;
    tracing::info!(revision = %commit, "found and parsed .mailmap file");
    Ok(Some(mailmap))
}

/// A forward-only scan over commits of one repository.
///
/// The cursor owns the traversal, the repository handle inside it and the
/// identity map; none of them outlive a `close` or a new `filter`.
pub struct CommitCursor {
    options: Arc<ModuleOptions>,
    source: Option<CommitSource>,
    current: Option<CommitRecord>,
    mailmap: Mailmap,
    repository: Option<String>,
    reference: Option<String>,
}

impl CommitCursor {
    pub fn new(options: Arc<ModuleOptions>) -> Self {
        Self {
            options,
            source: None,
            current: None,
            mailmap: Mailmap::new(),
            repository: None,
            reference: None,
        }
    }

    /// Starts a scan for the plan `token` with its bound `values`, then
    /// positions the cursor on the first row.
    pub fn filter(&mut self, token: &str, values: &[Option<String>]) -> Result<()> {
        self.close();

        let tags = codec::decode(token)?;
        let args = FilterArgs::route(&tags, values)?;
        let ctx = &self.options.context;

        let path = match args.repository.as_deref() {
            Some(path) => path.to_string(),
            None => ctx.default_repository()?.to_string(),
        };
        let repo = self
            .options
            .locator
            .open(ctx, &path)
            .map_err(|e| CommitsqlError::RepoOpen {
                path: path.clone(),
                source: Box::new(e),
            })?;

        self.repository = args.repository;
        self.reference = args.reference;

        if let Some(hash) = args.hash {
            tracing::debug!(repository = %path, %hash, "running git log filter (point lookup)");
            self.source = Some(CommitSource::Lookup(repo.lookup(&hash)));
            return self.advance();
        }

        let from = match self.reference.as_deref() {
            Some(reference) => repo.resolve_revision(reference)?,
            None => repo.head_commit_id()?,
        };

        if !ctx.get_bool(SKIP_MAILMAP_KEY) {
            self.mailmap = load_mailmap(&repo, from)?.unwrap_or_default();
        }

        let options = LogOptions {
            since: parse_bound("since", args.since.as_deref()),
            until: parse_bound("until", args.until.as_deref()),
        };
        tracing::debug!(
            repository = %path,
            revision = %from,
            since = ?options.since,
            until = ?options.until,
            "running git log filter"
        );

        self.source = Some(CommitSource::Log(repo.log(from, options)?));
        self.advance()
    }

    /// Moves to the next commit. Running out of commits, or a commit that
    /// does not exist, ends the scan without an error.
    pub fn advance(&mut self) -> Result<()> {
        let Some(source) = self.source.as_mut() else {
            self.current = None;
            return Ok(());
        };

        match source.next() {
            Some(Ok(record)) => {
                self.current = Some(record);
                Ok(())
            }
            Some(Err(e)) if !e.is_not_found() => {
                self.current = None;
                Err(e)
            }
            _ => {
                self.current = None;
                self.source = None;
                Ok(())
            }
        }
    }

    pub fn eof(&self) -> bool {
        self.current.is_none()
    }

    pub fn current(&self) -> Option<&CommitRecord> {
        self.current.as_ref()
    }

    /// Releases the traversal and repository handle. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.source = None;
        self.current = None;
        self.mailmap = Mailmap::new();
        self.repository = None;
        self.reference = None;
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none() && self.current.is_none()
    }

    /// Value of column `col` for the current row, `NULL` past the end.
    pub fn column(&self, col: usize) -> Value {
        let Some(commit) = self.current.as_ref() else {
            return Value::Null;
        };

        match col {
            COL_HASH => Value::Text(commit.hash()),
            COL_MESSAGE => Value::Text(commit.message.clone()),
            COL_AUTHOR_NAME | COL_AUTHOR_EMAIL => {
                let (name, email) = self
                    .mailmap
                    .resolve(&commit.author.name, &commit.author.email);
                let text = if col == COL_AUTHOR_NAME { name } else { email };
                Value::Text(text.to_string())
            }
            COL_AUTHOR_WHEN => Value::Text(commit.author.when_rfc3339()),
            COL_COMMITTER_NAME | COL_COMMITTER_EMAIL => {
                let (name, email) = self
                    .mailmap
                    .resolve(&commit.committer.name, &commit.committer.email);
                let text = if col == COL_COMMITTER_NAME { name } else { email };
                Value::Text(text.to_string())
            }
            COL_COMMITTER_WHEN => Value::Text(commit.committer.when_rfc3339()),
            COL_PARENTS => Value::Integer(commit.parent_count() as i64),
            COL_REPOSITORY => self.repository.clone().map_or(Value::Null, Value::Text),
            COL_REF => self.reference.clone().map_or(Value::Null, Value::Text),
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryContext;

    fn text(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_route_follows_tag_order() {
        let tags = [
            Tag::new(Role::Upper, COL_COMMITTER_WHEN),
            Tag::new(Role::PassThrough, COL_REF),
            Tag::new(Role::Lower, COL_COMMITTER_WHEN),
            Tag::new(Role::PassThrough, COL_REPOSITORY),
        ];
        let values = [text("2021-01-02T00:00:00Z"), text("main"), text("2021-01-01T00:00:00Z"), text("/repo")];
        let args = FilterArgs::route(&tags, &values).unwrap();
        assert_eq!(
            args,
            FilterArgs {
                hash: None,
                repository: text("/repo"),
                reference: text("main"),
                since: text("2021-01-01T00:00:00Z"),
                until: text("2021-01-02T00:00:00Z"),
            }
        );
    }

    #[test]
    fn test_route_null_hash_is_empty_lookup() {
        let args = FilterArgs::route(&[Tag::new(Role::Lookup, COL_HASH)], &[None]).unwrap();
        assert_eq!(args.hash, Some(String::new()));
    }

    #[test]
    fn test_route_rejects_mismatched_arguments() {
        let err = FilterArgs::route(&[Tag::new(Role::Lookup, COL_HASH)], &[]).unwrap_err();
        assert!(matches!(err, CommitsqlError::PlanToken(_)));

        let err = FilterArgs::route(&[Tag::new(Role::Lookup, COL_MESSAGE)], &[text("x")]).unwrap_err();
        assert!(matches!(err, CommitsqlError::PlanToken(_)));
    }

    #[test]
    fn test_parse_bound_drops_garbage() {
        assert!(parse_bound("since", Some("2021-01-01T00:00:00Z")).is_some());
        assert!(parse_bound("since", Some("yesterday")).is_none());
        assert!(parse_bound("since", None).is_none());
    }

    #[test]
    fn test_filter_without_repository_fails() {
        let mut cursor = CommitCursor::new(Arc::new(ModuleOptions::new()));
        let err = cursor.filter("", &[]).unwrap_err();
        assert!(matches!(err, CommitsqlError::NoDefaultRepository));
        assert!(cursor.eof());
    }

    #[test]
    fn test_filter_wraps_open_failure_with_path() {
        let options = ModuleOptions::new()
            .with_default_repository("/no/such/repo")
            .with_locator(|_: &QueryContext, path: &str| -> Result<GitRepo> {
                Err(CommitsqlError::RepoNotFound(path.to_string()))
            });
        let mut cursor = CommitCursor::new(Arc::new(options));
        let err = cursor.filter("", &[]).unwrap_err();
        assert!(matches!(&err, CommitsqlError::RepoOpen { path, .. } if path == "/no/such/repo"));
        assert!(err.to_string().contains("Repository not found"));
    }

    #[test]
    fn test_close_is_idempotent_on_fresh_cursor() {
        let mut cursor = CommitCursor::new(Arc::new(ModuleOptions::new()));
        assert!(cursor.is_closed());
        cursor.close();
        cursor.close();
        assert!(cursor.is_closed());
        assert!(cursor.eof());
        assert_eq!(cursor.column(COL_HASH), Value::Null);
    }
}
