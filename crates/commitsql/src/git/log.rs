//! Commit history iteration.
//!
//! Both sources here own their [`GitRepo`], so a cursor can hold one
//! without borrowing from anything else. Items are owned [`CommitRecord`]s
//! materialized when the source reaches them.

use crate::error::Result;
use crate::git::GitRepo;
use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};
use git2::{Commit, Oid, Revwalk, Sort};
use self_cell::self_cell;

/// Name, email and timestamp of an author or committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: DateTime<FixedOffset>,
}

impl Signature {
    fn from_git(sig: &git2::Signature<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
            when: to_datetime(sig.when()),
        }
    }

    /// RFC 3339 timestamp in the signature's own offset.
    pub fn when_rfc3339(&self) -> String {
        format_time(&self.when)
    }
}

/// An owned snapshot of one commit.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub id: Oid,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
    pub parent_ids: Vec<Oid>,
}

impl CommitRecord {
    pub fn from_commit(commit: &Commit<'_>) -> Self {
        Self {
            id: commit.id(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author: Signature::from_git(&commit.author()),
            committer: Signature::from_git(&commit.committer()),
            parent_ids: commit.parent_ids().collect(),
        }
    }

    pub fn hash(&self) -> String {
        self.id.to_string()
    }

    pub fn parent_count(&self) -> usize {
        self.parent_ids.len()
    }
}

/// Formats a timestamp the way the `commits` table exposes it.
pub fn format_time(when: &DateTime<FixedOffset>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a timestamp in the format produced by [`format_time`].
pub fn parse_time(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}

fn to_datetime(time: git2::Time) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .with_timezone(&offset)
}

/// Committer-time window for a history walk. Both ends are inclusive.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub since: Option<DateTime<FixedOffset>>,
    pub until: Option<DateTime<FixedOffset>>,
}

impl LogOptions {
    pub fn contains(&self, when: &DateTime<FixedOffset>) -> bool {
        if matches!(self.since, Some(since) if *when < since) {
            return false;
        }
        if matches!(self.until, Some(until) if *when > until) {
            return false;
        }
        true
    }
}

self_cell!(
    /// A repository together with a revwalk borrowing it.
    struct OwnedWalk {
        owner: GitRepo,

        #[covariant]
        dependent: Revwalk,
    }
);

/// History reachable from a start commit in `git2::Sort::TIME` order.
/// Every commit is produced at most once, and a commit is loaded only when
/// the walk reaches it.
///
/// Parents are discovered only once their child is produced, so the order
/// is committer time descending only when committer times never increase
/// from a child to its parent. With clock skew a parent that is newer than
/// its child still comes after it.
///
/// The window in [`LogOptions`] filters but does not stop the walk for the
/// same reason.
pub struct CommitLog {
    walk: OwnedWalk,
    options: LogOptions,
}

impl CommitLog {
    pub(crate) fn new(repo: GitRepo, from: Oid, options: LogOptions) -> Result<Self> {
        let walk = OwnedWalk::try_new(repo, |repo| time_sorted_walk(repo, from))?;
        Ok(Self { walk, options })
    }

    pub fn repo(&self) -> &GitRepo {
        self.walk.borrow_owner()
    }
}

fn time_sorted_walk(repo: &GitRepo, from: Oid) -> std::result::Result<Revwalk<'_>, git2::Error> {
    let mut revwalk = repo.inner().revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    revwalk.push(from)?;
    Ok(revwalk)
}

impl Iterator for CommitLog {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let options = &self.options;
        self.walk.with_dependent_mut(|repo, revwalk| loop {
            let record = match revwalk.next()? {
                Ok(id) => repo.commit_record(id),
                Err(e) => Err(e.into()),
            };
            match record {
                Ok(record) if !options.contains(&record.committer.when) => continue,
                other => return Some(other),
            }
        })
    }
}

/// Zero or one commit fetched by hash.
pub struct CommitLookup {
    repo: GitRepo,
    target: Option<Oid>,
}

impl CommitLookup {
    pub(crate) fn new(repo: GitRepo, target: Option<Oid>) -> Self {
        Self { repo, target }
    }
}

impl Iterator for CommitLookup {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.target.take()?;
        Some(self.repo.commit_record(id))
    }
}

/// The traversal strategy chosen for one cursor.
pub enum CommitSource {
    Lookup(CommitLookup),
    Log(CommitLog),
}

impl Iterator for CommitSource {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            CommitSource::Lookup(lookup) => lookup.next(),
            CommitSource::Log(log) => log.next(),
        }
    }
}
