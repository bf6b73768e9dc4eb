//! Options handed to the `commits` module when it is registered.
//!
//! [`ModuleOptions`] carries the repository locator used to open a
//! repository for each query and a small key/value [`QueryContext`] that
//! holds process-wide settings such as the default repository path.

use crate::error::{CommitsqlError, Result};
use crate::git::GitRepo;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Context key holding the repository used when a query binds none.
pub const DEFAULT_REPO_KEY: &str = "defaultRepoPath";

/// Context key that disables `.mailmap` identity resolution when true.
pub const SKIP_MAILMAP_KEY: &str = "skipMailmap";

/// Opens repositories on behalf of the virtual table.
///
/// Every cursor opens its own handle. Implementations that cache handles
/// are responsible for their own synchronization.
pub trait RepoLocator: Send + Sync {
    fn open(&self, ctx: &QueryContext, path: &str) -> Result<GitRepo>;
}

impl<F> RepoLocator for F
where
    F: Fn(&QueryContext, &str) -> Result<GitRepo> + Send + Sync,
{
    fn open(&self, ctx: &QueryContext, path: &str) -> Result<GitRepo> {
        self(ctx, path)
    }
}

/// Locator that discovers the repository containing `path` on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoverLocator;

impl RepoLocator for DiscoverLocator {
    fn open(&self, _ctx: &QueryContext, path: &str) -> Result<GitRepo> {
        GitRepo::open(path)
    }
}

/// String key/value settings visible to every query.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    values: HashMap<String, String>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Reads a boolean flag. Missing or unrecognised values read as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key).map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) => matches!(v.as_str(), "1" | "t" | "true" | "yes" | "on"),
            None => false,
        }
    }

    /// Overrides any existing value under the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn default_repository(&self) -> Result<&str> {
        self.get(DEFAULT_REPO_KEY)
            .filter(|p| !p.is_empty())
            .ok_or(CommitsqlError::NoDefaultRepository)
    }
}

/// Configuration for the `commits` virtual table module.
#[derive(Clone)]
pub struct ModuleOptions {
    pub locator: Arc<dyn RepoLocator>,
    pub context: QueryContext,
}

impl ModuleOptions {
    pub fn new() -> Self {
        Self {
            locator: Arc::new(DiscoverLocator),
            context: QueryContext::new(),
        }
    }

    /// Uses the provided locator for opening repositories.
    pub fn with_locator(mut self, locator: impl RepoLocator + 'static) -> Self {
        self.locator = Arc::new(locator);
        self
    }

    pub fn with_context_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.set(key, value);
        self
    }

    pub fn with_default_repository(self, path: impl Into<String>) -> Self {
        self.with_context_value(DEFAULT_REPO_KEY, path)
    }

    pub fn with_skip_mailmap(self, skip: bool) -> Self {
        self.with_context_value(SKIP_MAILMAP_KEY, skip.to_string())
    }
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleOptions")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
