//! Wire types for the Bitbucket Cloud 2.0 API.

use gitprovider::{NativeCommitPointer, NativePullRequest, NativeRepository, Visibility};
use serde::{Deserialize, Serialize};

/// One page of a paginated collection. `next` is an absolute URL.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub html: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl Links {
    fn html_href(&self) -> &str {
        self.html.as_ref().map_or("", |l| l.href.as_str())
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitbucketRepository {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    /// `workspace/slug`.
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub mainbranch: Option<NamedBranch>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedBranch {
    pub name: String,
}

impl NativeRepository for BitbucketRepository {
    /// The slug, which is what repository references carry. Falls back to the
    /// display name when the backend omits it.
    fn name(&self) -> &str {
        if self.slug.is_empty() {
            &self.name
        } else {
            &self.slug
        }
    }

    /// The owner prefix of `full_name`.
    fn owner_path(&self) -> Option<&str> {
        self.full_name.rsplit_once('/').map(|(owner, _)| owner)
    }

    fn description(&self) -> Option<&str> {
        Some(self.description.as_str())
    }

    fn default_branch(&self) -> Option<&str> {
        self.mainbranch.as_ref().map(|b| b.name.as_str())
    }

    fn visibility(&self) -> Option<Visibility> {
        Some(if self.is_private {
            Visibility::Private
        } else {
            Visibility::Public
        })
    }
}

// ---------------------------------------------------------------------------
// Source listing, branches, commits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitHash {
    pub hash: String,
}

/// One entry of a `src/{revision}/` listing. `commit` is the commit the
/// revision resolved to, identical for every entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitbucketSrcEntry {
    pub path: String,
    /// `commit_file` or `commit_directory`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub commit: Option<CommitHash>,
}

impl NativeCommitPointer for BitbucketSrcEntry {
    fn commit_sha(&self) -> Option<&str> {
        self.commit.as_ref().map(|c| c.hash.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitbucketBranch {
    pub name: String,
    #[serde(default)]
    pub target: Option<CommitHash>,
}

impl NativeCommitPointer for BitbucketBranch {
    fn commit_sha(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.hash.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitbucketCommit {
    pub hash: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub links: Links,
}

impl NativeCommitPointer for BitbucketCommit {
    fn commit_sha(&self) -> Option<&str> {
        Some(self.hash.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateBranchBody<'a> {
    pub name: &'a str,
    pub target: CreateBranchTarget<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateBranchTarget<'a> {
    pub hash: &'a str,
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitbucketPullRequest {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// `OPEN`, `MERGED`, `DECLINED` or `SUPERSEDED`.
    #[serde(default)]
    pub state: String,
    pub source: Endpoint,
    pub destination: Endpoint,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub branch: NamedBranch,
}

impl NativePullRequest for BitbucketPullRequest {
    fn number(&self) -> u64 {
        self.id
    }

    fn web_url(&self) -> &str {
        self.links.html_href()
    }

    fn merged(&self) -> bool {
        self.state == "MERGED"
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn head(&self) -> &str {
        &self.source.branch.name
    }

    fn base(&self) -> &str {
        &self.destination.branch.name
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreatePullRequestBody<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub source: EndpointBody<'a>,
    pub destination: EndpointBody<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EndpointBody<'a> {
    pub branch: BranchNameBody<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BranchNameBody<'a> {
    pub name: &'a str,
}

impl<'a> EndpointBody<'a> {
    pub fn branch(name: &'a str) -> Self {
        Self {
            branch: BranchNameBody { name },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MergePullRequestBody<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub message: &'a str,
    pub merge_strategy: &'static str,
    pub close_source_branch: bool,
}
