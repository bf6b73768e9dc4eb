//! Git repository wrapper for commitsql.

use crate::error::{CommitsqlError, Result};
use crate::git::log::{CommitLog, CommitLookup, CommitRecord, LogOptions};
use git2::{ErrorCode, Oid, Repository};
use std::path::Path;

/// A wrapper around a Git repository providing the plumbing the `commits`
/// table needs: revision resolution, commit lookup, tree file reads and
/// committer-time ordered history walks.
///
/// # Example
///
/// ```no_run
/// use commitsql::GitRepo;
///
/// let repo = GitRepo::open(".")?;
/// println!("Repository at: {}", repo.path());
/// # Ok::<(), commitsql::CommitsqlError>(())
/// ```
pub struct GitRepo {
    repo: Repository,
    path: String,
}

impl GitRepo {
    /// Opens a Git repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// supporting nested directories within a repository.
    ///
    /// # Errors
    ///
    /// Returns `CommitsqlError::RepoNotFound` if no Git repository is found.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let repo = Repository::discover(path_ref).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                CommitsqlError::RepoNotFound(path_ref.display().to_string())
            } else {
                CommitsqlError::Git(e)
            }
        })?;
        Ok(Self::from_repository(repo))
    }

    /// Wraps an already opened repository.
    pub fn from_repository(repo: Repository) -> Self {
        let path = repo
            .workdir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| repo.path().display().to_string());
        Self { repo, path }
    }

    /// Returns the working directory path of the repository.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a reference to the underlying `git2::Repository`.
    pub fn inner(&self) -> &Repository {
        &self.repo
    }

    /// Resolves `HEAD` to the commit it points at.
    pub fn head_commit_id(&self) -> Result<Oid> {
        self.repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map(|commit| commit.id())
            .map_err(|source| CommitsqlError::Revision {
                revision: "HEAD".to_string(),
                source,
            })
    }

    /// Resolves a revision expression (branch, tag, `HEAD~2`, hash prefix)
    /// to a commit.
    pub fn resolve_revision(&self, revision: &str) -> Result<Oid> {
        self.repo
            .revparse_single(revision)
            .and_then(|object| object.peel_to_commit())
            .map(|commit| commit.id())
            .map_err(|source| CommitsqlError::Revision {
                revision: revision.to_string(),
                source,
            })
    }

    pub fn commit_record(&self, id: Oid) -> Result<CommitRecord> {
        let commit = self.repo.find_commit(id)?;
        Ok(CommitRecord::from_commit(&commit))
    }

    /// Reads a file from the tree of `commit`.
    ///
    /// Returns `Ok(None)` when the path does not exist in that tree.
    pub fn read_file(&self, commit: Oid, path: &str) -> Result<Option<String>> {
        let tree = self.repo.find_commit(commit)?.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()))
    }

    /// Walks history reachable from `from`, newest committer time first.
    ///
    /// The returned log owns the repository handle.
    pub fn log(self, from: Oid, options: LogOptions) -> Result<CommitLog> {
        CommitLog::new(self, from, options)
    }

    /// Looks up a single commit by its hex hash.
    ///
    /// A hash that does not parse yields an empty lookup.
    pub fn lookup(self, hash: &str) -> CommitLookup {
        let target = Oid::from_str(hash).ok();
        CommitLookup::new(self, target)
    }
}
