//! Wire types for the Azure DevOps Git REST API.

use gitprovider::{NativeCommitPointer, NativePullRequest, NativeRepository, Visibility};
use serde::{Deserialize, Serialize};

const HEADS_PREFIX: &str = "refs/heads/";

/// `refs/heads/main` → `main`. Names without the prefix pass through.
pub(crate) fn short_ref(name: &str) -> &str {
    name.strip_prefix(HEADS_PREFIX).unwrap_or(name)
}

/// `main` → `refs/heads/main`.
pub(crate) fn full_ref(name: &str) -> String {
    if name.starts_with(HEADS_PREFIX) {
        name.to_string()
    } else {
        format!("{HEADS_PREFIX}{name}")
    }
}

/// The `{count, value}` envelope Azure DevOps wraps collections in.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Collection<T> {
    pub value: Vec<T>,
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureRepository {
    pub id: String,
    pub name: String,
    /// `refs/heads/...`; absent for an empty repository.
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub project: Option<AzureProject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureProject {
    pub name: String,
    #[serde(default)]
    pub visibility: Option<String>,
}

impl NativeRepository for AzureRepository {
    fn name(&self) -> &str {
        &self.name
    }

    /// The payload names only the project; the driver scopes ownership.
    fn owner_path(&self) -> Option<&str> {
        None
    }

    /// Azure DevOps repositories carry no description.
    fn description(&self) -> Option<&str> {
        None
    }

    fn default_branch(&self) -> Option<&str> {
        self.default_branch.as_deref().map(short_ref)
    }

    /// Visibility belongs to the project.
    fn visibility(&self) -> Option<Visibility> {
        match self.project.as_ref()?.visibility.as_deref()? {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Items, pushes, refs, commits
// ---------------------------------------------------------------------------

/// One entry of an `items` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureItem {
    pub path: String,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub git_object_type: Option<String>,
    /// The commit the listing was taken at: the branch head.
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub is_folder: bool,
}

impl NativeCommitPointer for AzureItem {
    fn commit_sha(&self) -> Option<&str> {
        self.commit_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureRef {
    pub name: String,
    pub object_id: String,
}

impl NativeCommitPointer for AzureRef {
    fn commit_sha(&self) -> Option<&str> {
        Some(self.object_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCommit {
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl NativeCommitPointer for AzureCommit {
    fn commit_sha(&self) -> Option<&str> {
        self.commit_id.as_deref()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PushBody<'a> {
    pub ref_updates: [RefUpdate<'a>; 1],
    pub commits: [PushCommit<'a>; 1],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefUpdate<'a> {
    pub name: String,
    pub old_object_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PushCommit<'a> {
    pub comment: &'a str,
    pub changes: [Change<'a>; 1],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Change<'a> {
    pub change_type: &'static str,
    pub item: ChangeItem<'a>,
    pub new_content: NewContent,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChangeItem<'a> {
    pub path: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewContent {
    pub content: String,
    pub content_type: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PushResponse {
    #[serde(default)]
    pub commits: Vec<AzureCommit>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefUpdateBody<'a> {
    pub name: String,
    pub old_object_id: &'static str,
    pub new_object_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefUpdateResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub update_status: Option<String>,
    #[serde(default)]
    pub custom_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzurePullRequest {
    pub pull_request_id: u64,
    #[serde(default)]
    pub title: String,
    /// `active`, `completed` or `abandoned`.
    #[serde(default)]
    pub status: String,
    pub source_ref_name: String,
    pub target_ref_name: String,
    #[serde(default)]
    pub last_merge_source_commit: Option<AzureCommit>,
    #[serde(default)]
    pub repository: Option<AzurePullRequestRepository>,
    /// Web link built from the repository's web URL; not part of the wire
    /// format.
    #[serde(skip)]
    pub web_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzurePullRequestRepository {
    #[serde(default)]
    pub web_url: String,
}

impl AzurePullRequest {
    pub(crate) fn with_web_url(mut self) -> Self {
        if let Some(repository) = &self.repository {
            self.web_url = format!(
                "{}/pullrequest/{}",
                repository.web_url.trim_end_matches('/'),
                self.pull_request_id
            );
        }
        self
    }
}

impl NativePullRequest for AzurePullRequest {
    fn number(&self) -> u64 {
        self.pull_request_id
    }

    fn web_url(&self) -> &str {
        &self.web_url
    }

    fn merged(&self) -> bool {
        self.status == "completed"
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn head(&self) -> &str {
        short_ref(&self.source_ref_name)
    }

    fn base(&self) -> &str {
        short_ref(&self.target_ref_name)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePullRequestBody<'a> {
    pub source_ref_name: String,
    pub target_ref_name: String,
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletePullRequestBody<'a> {
    pub status: &'static str,
    pub last_merge_source_commit: LastMergeSourceCommit<'a>,
    pub completion_options: CompletionOptions<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LastMergeSourceCommit<'a> {
    pub commit_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionOptions<'a> {
    pub merge_strategy: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub merge_commit_message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_names() {
        assert_eq!(short_ref("refs/heads/main"), "main");
        assert_eq!(short_ref("main"), "main");
        assert_eq!(full_ref("feature/x"), "refs/heads/feature/x");
        assert_eq!(full_ref("refs/heads/x"), "refs/heads/x");
    }

    #[test]
    fn test_repository_projection() {
        let repo: AzureRepository = serde_json::from_str(
            r#"{"id":"r1","name":"infra","defaultBranch":"refs/heads/main",
                "webUrl":"https://dev.azure.com/acme/ops/_git/infra",
                "project":{"name":"ops","visibility":"private"}}"#,
        )
        .unwrap();

        assert_eq!(repo.default_branch(), Some("main"));
        assert_eq!(repo.visibility(), Some(Visibility::Private));
        assert_eq!(repo.description(), None);
    }

    #[test]
    fn test_pull_request_projection() {
        let pr: AzurePullRequest = serde_json::from_str(
            r#"{"pullRequestId":5,"title":"t","status":"completed",
                "sourceRefName":"refs/heads/feat","targetRefName":"refs/heads/main",
                "repository":{"webUrl":"https://dev.azure.com/acme/ops/_git/infra"}}"#,
        )
        .unwrap();
        let pr = pr.with_web_url();

        assert!(pr.merged());
        assert_eq!((pr.head(), pr.base()), ("feat", "main"));
        assert_eq!(pr.web_url(), "https://dev.azure.com/acme/ops/_git/infra/pullrequest/5");
    }
}
