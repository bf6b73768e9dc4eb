//! `.mailmap` parsing and identity resolution.
//!
//! Supports the four entry forms git understands:
//!
//! ```text
//! Proper Name <commit@email>
//! <proper@email> <commit@email>
//! Proper Name <proper@email> <commit@email>
//! Proper Name <proper@email> Commit Name <commit@email>
//! ```
//!
//! Emails and commit names match case-insensitively. A [`Mailmap`] is built
//! once per query and never changes afterwards.

use crate::error::{CommitsqlError, Result};
use regex::Regex;
use std::collections::HashMap;

const LINE_PATTERN: &str = r"^([^<>]*)<([^<>]*)>(?:([^<>]*)<([^<>]*)>)?\s*(?:#.*)?$";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Replacement {
    name: Option<String>,
    email: Option<String>,
}

impl Replacement {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    fn merge(&mut self, other: Replacement) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.email.is_some() {
            self.email = other.email;
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    // applies to any commit name under this email
    fallback: Replacement,
    by_name: HashMap<String, Replacement>,
}

/// Canonical identities keyed by the (name, email) recorded in commits.
#[derive(Debug, Clone, Default)]
pub struct Mailmap {
    entries: HashMap<String, Entry>,
}

fn non_empty(s: Option<regex::Match<'_>>) -> Option<String> {
    s.map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Mailmap {
    /// An empty map; every identity resolves to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the contents of a `.mailmap` file.
    ///
    /// # Errors
    ///
    /// Returns `CommitsqlError::Mailmap` with the 1-based line number for
    /// lines that are neither blank, comments, nor a valid entry.
    pub fn parse(text: &str) -> Result<Self> {
        let line_re = Regex::new(LINE_PATTERN)?;
        let mut map = Mailmap::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let caps = line_re.captures(line).ok_or_else(|| CommitsqlError::Mailmap {
                line: idx + 1,
                reason: format!("unrecognised entry {line:?}"),
            })?;

            let first_name = non_empty(caps.get(1));
            let first_email = non_empty(caps.get(2));

            let (replacement, commit_name, commit_email) = match caps.get(4) {
                Some(_) => (
                    Replacement {
                        name: first_name,
                        email: first_email,
                    },
                    non_empty(caps.get(3)),
                    non_empty(caps.get(4)),
                ),
                None => (
                    Replacement {
                        name: first_name,
                        email: None,
                    },
                    None,
                    first_email,
                ),
            };

            let Some(commit_email) = commit_email else {
                return Err(CommitsqlError::Mailmap {
                    line: idx + 1,
                    reason: "missing commit email".to_string(),
                });
            };

            // "<a@x>" alone names nothing to replace; git ignores it too
            if replacement.is_empty() {
                continue;
            }

            map.insert(commit_name, commit_email, replacement);
        }

        Ok(map)
    }

    fn insert(&mut self, commit_name: Option<String>, commit_email: String, replacement: Replacement) {
        let entry = self.entries.entry(commit_email.to_lowercase()).or_default();
        match commit_name {
            Some(name) => entry
                .by_name
                .entry(name.to_lowercase())
                .or_default()
                .merge(replacement),
            None => entry.fallback.merge(replacement),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maps a recorded identity to its canonical form.
    ///
    /// Identities with no entry are returned unchanged.
    pub fn resolve<'a>(&'a self, name: &'a str, email: &'a str) -> (&'a str, &'a str) {
        let Some(entry) = self.entries.get(&email.to_lowercase()) else {
            return (name, email);
        };

        let replacement = match entry.by_name.get(&name.to_lowercase()) {
            Some(r) => r,
            None if !entry.fallback.is_empty() => &entry.fallback,
            None => return (name, email),
        };

        (
            replacement.name.as_deref().unwrap_or(name),
            replacement.email.as_deref().unwrap_or(email),
        )
    }
}
