//! Driver capability set.
//!
//! A *driver* is a backend-specific REST client. Backends disagree about what
//! they can do, so the driver surface is split into one trait per resource
//! family. A driver implements [`Driver`] (repository lookup, identity) and
//! then any subset of the capability traits, advertising each one through the
//! matching accessor on [`Driver`]:
//!
//! | Capability | Accessor | Used by |
//! |------------|----------|---------|
//! | [`RepositoryAdmin`] | [`Driver::repository_admin`] | `list`, `create`, `reconcile`, `set`, `delete` |
//! | [`DirectoryListing`] | [`Driver::directory_listing`] | head resolution, `list_page` |
//! | [`ContentWriter`] | [`Driver::content_writer`] | commit emulation |
//! | [`BranchRefs`] | [`Driver::branch_refs`] | head resolution, branch creation |
//! | [`CommitLookup`] | [`Driver::commit_lookup`] | head resolution |
//! | [`PullRequestApi`] | [`Driver::pull_request_api`] | pull request adapter |
//!
//! Accessors default to `None`. The adapters check for presence explicitly and
//! return [`ProviderError::Unsupported`] when a capability is missing.
//!
//! ## Native objects
//!
//! Each driver names its wire types as associated types. The adapters read
//! them only through the small projection traits below ([`NativeRepository`],
//! [`NativeCommitPointer`], [`NativePullRequest`]) and otherwise hand them back
//! to callers untouched through `api_object()`.
//!
//! ## Status codes
//!
//! Calls whose success is decided by a status code return a
//! [`DriverResponse`]; the adapter, not the driver, compares the status
//! against the documented success status. Lookup calls instead map `404` to
//! [`ProviderError::NotFound`] and any other failure to
//! [`ProviderError::Backend`] themselves.

use async_trait::async_trait;

use crate::errors::{ProviderError, ProviderResult};
use crate::identifiers::{CommitSha, OwnerKind, ProviderId, PullRequestNumber, RepositoryRef};
use crate::types::{MergeMethod, RepositoryInfo, Visibility};

/// HTTP status codes the adapters compare against.
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const NO_CONTENT: u16 = 204;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
}

// ---------------------------------------------------------------------------
// Native object projections
// ---------------------------------------------------------------------------

/// Read access to a backend repository object.
pub trait NativeRepository: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// The repository's own name (not the full path).
    fn name(&self) -> &str;
    /// The owner path (`owner`, or `org/sub`) as the backend reports it.
    /// `None` when the object carries no owner; such a driver checks
    /// ownership in [`Driver::repository_key`] instead.
    fn owner_path(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
    fn default_branch(&self) -> Option<&str>;
    fn visibility(&self) -> Option<Visibility>;
}

/// A backend object that points at a commit: a file entry, a git reference,
/// or a commit object.
pub trait NativeCommitPointer: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// The commit SHA this object points at, if the backend reported one.
    fn commit_sha(&self) -> Option<&str>;
}

/// Read access to a backend pull request object.
pub trait NativePullRequest: Clone + std::fmt::Debug + Send + Sync + 'static {
    fn number(&self) -> u64;
    fn web_url(&self) -> &str;
    fn merged(&self) -> bool;
    fn title(&self) -> &str;
    /// Source branch, without `refs/heads/`.
    fn head(&self) -> &str;
    /// Target branch, without `refs/heads/`.
    fn base(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Status-carrying responses
// ---------------------------------------------------------------------------

/// Outcome of a driver call whose success is decided by status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverResponse<T> {
    /// HTTP status returned by the backend.
    pub status: u16,
    /// Decoded body, when the backend returned one the driver understands.
    pub body: Option<T>,
    /// Backend error message, for non-success statuses.
    pub message: Option<String>,
}

impl<T> DriverResponse<T> {
    pub fn new(status: u16, body: Option<T>) -> Self {
        Self {
            status,
            body,
            message: None,
        }
    }

    /// A response without a decoded body, carrying the backend's message.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: None,
            message: Some(message.into()),
        }
    }

    /// Returns the body when `status == expected`, otherwise a
    /// [`ProviderError::Backend`] carrying the actual status.
    pub fn require_status(self, expected: u16) -> ProviderResult<Option<T>> {
        if self.status == expected {
            Ok(self.body)
        } else {
            Err(ProviderError::Backend {
                status: self.status,
                message: self
                    .message
                    .unwrap_or_else(|| format!("expected status {expected}")),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Request inputs
// ---------------------------------------------------------------------------

/// Parameters for a single-file content write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFileParams {
    pub message: String,
    pub data: Vec<u8>,
    pub branch: String,
    /// The head the write is built on. Backends that validate it reject a
    /// stale value.
    pub base_sha: CommitSha,
}

/// Which field names a backend uses for the two branches of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullRequestFieldNaming {
    /// `head` (source) / `base` (target): Gitea, GitHub-style APIs.
    HeadBase,
    /// `source` / `target` (or `destination`): Azure DevOps, Bitbucket.
    SourceTarget,
}

impl PullRequestFieldNaming {
    /// Maps the neutral `(branch, base_branch)` pair onto this naming.
    pub fn translate(
        self,
        title: &str,
        branch: &str,
        base_branch: &str,
        description: &str,
    ) -> PullRequestInput {
        match self {
            PullRequestFieldNaming::HeadBase => PullRequestInput::HeadBase {
                title: title.to_string(),
                body: description.to_string(),
                head: branch.to_string(),
                base: base_branch.to_string(),
            },
            PullRequestFieldNaming::SourceTarget => PullRequestInput::SourceTarget {
                title: title.to_string(),
                body: description.to_string(),
                source: branch.to_string(),
                target: base_branch.to_string(),
            },
        }
    }
}

/// A pull request creation request, already translated into the backend's
/// field naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestInput {
    HeadBase {
        title: String,
        body: String,
        head: String,
        base: String,
    },
    SourceTarget {
        title: String,
        body: String,
        source: String,
        target: String,
    },
}

impl PullRequestInput {
    pub fn title(&self) -> &str {
        match self {
            Self::HeadBase { title, .. } | Self::SourceTarget { title, .. } => title,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Self::HeadBase { body, .. } | Self::SourceTarget { body, .. } => body,
        }
    }

    /// `(from, into)` regardless of naming.
    pub fn branches(&self) -> (&str, &str) {
        match self {
            Self::HeadBase { head, base, .. } => (head, base),
            Self::SourceTarget { source, target, .. } => (source, target),
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// A backend driver: identity, repository lookup, and capability accessors.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    type Repository: NativeRepository;
    type FileEntry: NativeCommitPointer;
    type Reference: NativeCommitPointer;
    type Commit: NativeCommitPointer;
    type PullRequest: NativePullRequest;

    fn provider_id(&self) -> ProviderId;

    /// Endpoint this driver was constructed for, e.g. `"dev.azure.com"`.
    fn domain(&self) -> &str;

    /// Backend lookup key for a repository. Defaults to the full name.
    ///
    /// A driver bound to a single owner returns [`ProviderError::NotFound`]
    /// for a reference to any other owner.
    fn repository_key(&self, reference: &RepositoryRef) -> ProviderResult<String> {
        Ok(reference.full_name())
    }

    /// Resolves a repository by the key from [`Driver::repository_key`].
    async fn find_repository(&self, key: &str) -> ProviderResult<Self::Repository>;

    fn repository_admin(&self) -> Option<&dyn RepositoryAdmin<Self>> {
        None
    }

    fn directory_listing(&self) -> Option<&dyn DirectoryListing<Self>> {
        None
    }

    fn content_writer(&self) -> Option<&dyn ContentWriter<Self>> {
        None
    }

    fn branch_refs(&self) -> Option<&dyn BranchRefs<Self>> {
        None
    }

    fn commit_lookup(&self) -> Option<&dyn CommitLookup<Self>> {
        None
    }

    fn pull_request_api(&self) -> Option<&dyn PullRequestApi<Self>> {
        None
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Repository listing, creation, update and deletion.
#[async_trait]
pub trait RepositoryAdmin<D: Driver + ?Sized>: Send + Sync {
    /// Every repository of the owner, following pagination.
    async fn list_repositories(
        &self,
        owner_kind: OwnerKind,
        owner: &str,
    ) -> ProviderResult<Vec<D::Repository>>;

    async fn create_repository(
        &self,
        reference: &RepositoryRef,
        info: &RepositoryInfo,
    ) -> ProviderResult<D::Repository>;

    async fn update_repository(
        &self,
        repository: &D::Repository,
        info: &RepositoryInfo,
    ) -> ProviderResult<D::Repository>;

    async fn delete_repository(&self, repository: &D::Repository) -> ProviderResult<()>;
}

/// Directory listing at a ref. The first entry must carry the pointer to the
/// ref's latest commit.
#[async_trait]
pub trait DirectoryListing<D: Driver + ?Sized>: Send + Sync {
    async fn list_directory(
        &self,
        repository: &D::Repository,
        path: &str,
        reference: &str,
    ) -> ProviderResult<Vec<D::FileEntry>>;

    /// The first entry of the listing, which is all head resolution needs.
    /// Drivers whose listing is paginated override this to skip the
    /// remaining pages.
    async fn first_entry(
        &self,
        repository: &D::Repository,
        path: &str,
        reference: &str,
    ) -> ProviderResult<Option<D::FileEntry>> {
        Ok(self
            .list_directory(repository, path, reference)
            .await?
            .into_iter()
            .next())
    }
}

/// Single-file content write. Success is `201 Created`.
#[async_trait]
pub trait ContentWriter<D: Driver + ?Sized>: Send + Sync {
    /// Writes one file. The body carries the new commit when the backend
    /// reports it inline; `None` means the caller must re-resolve the head.
    async fn write_file(
        &self,
        repository: &D::Repository,
        path: &str,
        params: &WriteFileParams,
    ) -> ProviderResult<DriverResponse<D::Commit>>;
}

/// Branch reference lookup and creation.
#[async_trait]
pub trait BranchRefs<D: Driver + ?Sized>: Send + Sync {
    /// The status the backend documents for a successful ref creation.
    fn branch_created_status(&self) -> u16 {
        status::CREATED
    }

    async fn find_branch(&self, repository: &D::Repository, name: &str)
        -> ProviderResult<D::Reference>;

    async fn create_branch_ref(
        &self,
        repository: &D::Repository,
        name: &str,
        sha: &str,
    ) -> ProviderResult<DriverResponse<()>>;
}

/// Commit lookup by SHA or branch name.
#[async_trait]
pub trait CommitLookup<D: Driver + ?Sized>: Send + Sync {
    async fn find_commit(&self, repository: &D::Repository, reference: &str)
        -> ProviderResult<D::Commit>;
}

/// Pull request operations. Creation is mandatory for a driver that exposes
/// this capability; the rest default to [`ProviderError::Unsupported`].
#[async_trait]
pub trait PullRequestApi<D: Driver + ?Sized>: Send + Sync {
    /// The field naming this backend uses. Every driver must declare one.
    fn field_naming(&self) -> PullRequestFieldNaming;

    /// The status the backend documents for a successful merge.
    fn merged_status(&self) -> u16 {
        status::OK
    }

    /// Success is `201 Created`.
    async fn create_pull_request(
        &self,
        repository: &D::Repository,
        input: &PullRequestInput,
    ) -> ProviderResult<DriverResponse<D::PullRequest>>;

    async fn list_pull_requests(
        &self,
        _repository: &D::Repository,
    ) -> ProviderResult<Vec<D::PullRequest>> {
        Err(ProviderError::unsupported("list pull requests"))
    }

    async fn get_pull_request(
        &self,
        _repository: &D::Repository,
        _number: PullRequestNumber,
    ) -> ProviderResult<D::PullRequest> {
        Err(ProviderError::unsupported("get pull request"))
    }

    async fn merge_pull_request(
        &self,
        _repository: &D::Repository,
        _number: PullRequestNumber,
        _method: MergeMethod,
        _message: &str,
    ) -> ProviderResult<DriverResponse<()>> {
        Err(ProviderError::unsupported("merge pull request"))
    }
}
