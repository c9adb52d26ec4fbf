//! Provider-neutral value types.
//!
//! Unlike the references in [`crate::identifiers`], these types describe the
//! *state* of a resource as last observed, or the input to a write. None of
//! them carries a backend-native object; those are reachable only through the
//! entities' `api_object()` accessors.

use serde::{Deserialize, Serialize};

use crate::errors::{ProviderError, ProviderResult};
use crate::identifiers::{CommitSha, PullRequestNumber};

// ---------------------------------------------------------------------------
// Repository metadata
// ---------------------------------------------------------------------------

/// Repository visibility, for backends that report one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Internal,
    Private,
}

/// Projection of a repository's metadata.
///
/// Every field is optional: a backend that does not report a field leaves it
/// `None` (Azure DevOps repositories have no description, for instance). When
/// used as *desired* state for `reconcile`, `None` means "don't care".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub description: Option<String>,
    pub default_branch: Option<String>,
    pub visibility: Option<Visibility>,
}

impl RepositoryInfo {
    /// Returns `true` when every field set in `desired` equals the field in
    /// `self`. Fields left `None` in `desired` are ignored.
    pub fn satisfies(&self, desired: &RepositoryInfo) -> bool {
        fn matches<T: PartialEq>(actual: &Option<T>, wanted: &Option<T>) -> bool {
            wanted.is_none() || actual == wanted
        }

        matches(&self.description, &desired.description)
            && matches(&self.default_branch, &desired.default_branch)
            && matches(&self.visibility, &desired.visibility)
    }
}

// ---------------------------------------------------------------------------
// Organization metadata
// ---------------------------------------------------------------------------

/// Organization metadata. None of the backends in scope report it through
/// the organization adapter, so both fields are currently always `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub name: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Commits
// ---------------------------------------------------------------------------

/// The neutral part of a commit view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: CommitSha,
}

/// One file change for a composite commit.
///
/// Both fields are optional so that a missing path or content is caught as a
/// validation error before any request is made, rather than being impossible
/// to express.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    pub path: Option<String>,
    pub content: Option<String>,
}

impl CommitFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            content: Some(content.into()),
        }
    }

    /// Returns `(path, content)` or a validation error naming the file's
    /// position in the batch.
    pub(crate) fn validated(&self, index: usize) -> ProviderResult<(&str, &str)> {
        let path = match self.path.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => {
                return Err(ProviderError::Validation {
                    message: format!("commit file #{index} has no path"),
                })
            }
        };
        let content = self.content.as_deref().ok_or_else(|| ProviderError::Validation {
            message: format!("commit file #{index} ({path}) has no content"),
        })?;
        Ok((path, content))
    }
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

/// Provider-neutral pull request state.
///
/// `merged` is only accurate as of the fetch that produced this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub number: PullRequestNumber,
    pub web_url: String,
    pub merged: bool,
    pub title: String,
    /// Branch the changes come from.
    pub head: String,
    /// Branch the changes are merged into.
    pub base: String,
}

/// How a pull request is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMethod {
    /// A merge commit.
    Merge,
    /// Squash all commits into one.
    Squash,
    /// Replay the commits on top of the base branch.
    Rebase,
}

// ---------------------------------------------------------------------------
// Token permissions
// ---------------------------------------------------------------------------

/// A permission a caller may ask the client about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPermission {
    /// Read and write access to repository contents.
    ReadWriteRepository,
}
