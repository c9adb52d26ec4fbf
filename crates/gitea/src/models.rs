//! Wire types for the subset of the Gitea API the driver uses.
//!
//! Only the fields the driver reads are declared; everything else in the
//! response is ignored. These are the native objects callers receive from
//! `api_object()`.

use gitprovider::{NativeCommitPointer, NativePullRequest, NativeRepository, Visibility};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiteaRepository {
    pub id: u64,
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub html_url: String,
}

impl NativeRepository for GiteaRepository {
    fn name(&self) -> &str {
        &self.name
    }

    /// The owner prefix of `full_name`.
    fn owner_path(&self) -> Option<&str> {
        self.full_name.rsplit_once('/').map(|(owner, _)| owner)
    }

    fn description(&self) -> Option<&str> {
        Some(self.description.as_str())
    }

    fn default_branch(&self) -> Option<&str> {
        (!self.default_branch.is_empty()).then_some(self.default_branch.as_str())
    }

    fn visibility(&self) -> Option<Visibility> {
        Some(if self.internal {
            Visibility::Internal
        } else if self.private {
            Visibility::Private
        } else {
            Visibility::Public
        })
    }
}

/// The authenticated account, from `GET user`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GiteaUser {
    pub login: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateRepositoryBody<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EditRepositoryBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
}

// ---------------------------------------------------------------------------
// Git objects
// ---------------------------------------------------------------------------

/// A branch with the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiteaBranch {
    pub name: String,
    pub commit: Option<GiteaPayloadCommit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiteaPayloadCommit {
    pub id: String,
    #[serde(default)]
    pub message: String,
}

impl NativeCommitPointer for GiteaBranch {
    fn commit_sha(&self) -> Option<&str> {
        self.commit.as_ref().map(|c| c.id.as_str())
    }
}

/// A commit, as returned by `git/commits/{sha}` and inside a file write
/// response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiteaCommit {
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub parents: Vec<GiteaCommitParent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiteaCommitParent {
    pub sha: String,
}

impl NativeCommitPointer for GiteaCommit {
    fn commit_sha(&self) -> Option<&str> {
        self.sha.as_deref()
    }
}

/// Gitea exposes no directory listing through this driver; the type exists
/// to satisfy the driver's native type set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiteaContentEntry {
    pub path: String,
    pub last_commit_sha: Option<String>,
}

impl NativeCommitPointer for GiteaContentEntry {
    fn commit_sha(&self) -> Option<&str> {
        self.last_commit_sha.as_deref()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateFileBody<'a> {
    /// Base64 of the file content.
    pub content: String,
    pub message: &'a str,
    pub branch: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileResponse {
    pub commit: Option<GiteaCommit>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateBranchBody<'a> {
    pub new_branch_name: &'a str,
    pub old_ref_name: &'a str,
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiteaPullRequest {
    pub number: u64,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub title: String,
    pub head: GiteaPrBranch,
    pub base: GiteaPrBranch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiteaPrBranch {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub sha: Option<String>,
}

impl NativePullRequest for GiteaPullRequest {
    fn number(&self) -> u64 {
        self.number
    }

    fn web_url(&self) -> &str {
        &self.html_url
    }

    fn merged(&self) -> bool {
        self.merged
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn head(&self) -> &str {
        &self.head.reference
    }

    fn base(&self) -> &str {
        &self.base.reference
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreatePullRequestBody<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MergePullRequestBody<'a> {
    #[serde(rename = "Do")]
    pub merge_style: &'static str,
    #[serde(rename = "MergeMessageField", skip_serializing_if = "str::is_empty")]
    pub message: &'a str,
}
