//! In-memory driver for exercising the adapters without a backend.
//!
//! [`FakeDriver`] models a single repository host: repositories keyed by
//! `owner/name`, branches holding a head SHA and a flat list of file paths,
//! and pull requests. Every driver call is recorded in order so tests can
//! assert exactly which requests an adapter issued. Capabilities are toggled
//! per instance through [`Capabilities`].

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gitprovider::driver::status;
use gitprovider::{
    BranchRefs, CommitLookup, ContentWriter, DirectoryListing, Driver, DriverResponse,
    MergeMethod, NativeCommitPointer, NativePullRequest, NativeRepository, OwnerKind,
    ProviderError, ProviderId, ProviderResult, PullRequestApi, PullRequestFieldNaming,
    PullRequestInput, PullRequestNumber, RepositoryAdmin, RepositoryInfo, RepositoryRef,
    Visibility, WriteFileParams,
};

pub const DOMAIN: &str = "git.example.com";

// ---------------------------------------------------------------------------
// Native objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeRepo {
    pub name: String,
    /// Filled from the key by `with_repository` when left `None`.
    pub owner: Option<String>,
    pub description: Option<String>,
    pub default_branch: Option<String>,
    pub visibility: Option<Visibility>,
}

impl FakeRepo {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: None,
            description: Some(format!("{name} repository")),
            default_branch: Some("main".to_string()),
            visibility: Some(Visibility::Private),
        }
    }

    pub fn owned_by(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }
}

impl NativeRepository for FakeRepo {
    fn name(&self) -> &str {
        &self.name
    }

    fn owner_path(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn default_branch(&self) -> Option<&str> {
        self.default_branch.as_deref()
    }

    fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeEntry {
    pub path: String,
    pub last_commit: Option<String>,
}

impl NativeCommitPointer for FakeEntry {
    fn commit_sha(&self) -> Option<&str> {
        self.last_commit.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeRef {
    pub name: String,
    pub sha: Option<String>,
}

impl NativeCommitPointer for FakeRef {
    fn commit_sha(&self) -> Option<&str> {
        self.sha.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCommit {
    pub sha: Option<String>,
}

impl NativeCommitPointer for FakeCommit {
    fn commit_sha(&self) -> Option<&str> {
        self.sha.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePullRequest {
    pub number: u64,
    pub title: String,
    pub head: String,
    pub base: String,
    pub merged: bool,
}

impl NativePullRequest for FakePullRequest {
    fn number(&self) -> u64 {
        self.number
    }

    fn web_url(&self) -> &str {
        "https://git.example.com/pulls"
    }

    fn merged(&self) -> bool {
        self.merged
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn head(&self) -> &str {
        &self.head
    }

    fn base(&self) -> &str {
        &self.base
    }
}

// ---------------------------------------------------------------------------
// Call log and configuration
// ---------------------------------------------------------------------------

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindRepository(String),
    ListRepositories(OwnerKind, String),
    CreateRepository(String),
    UpdateRepository(String),
    DeleteRepository(String),
    ListDirectory(String),
    WriteFile { path: String, base_sha: String },
    FindBranch(String),
    CreateBranch { name: String, sha: String },
    FindCommit(String),
    CreatePullRequest(PullRequestInput),
    ListPullRequests,
    GetPullRequest(u64),
    MergePullRequest(u64),
}

/// Which capability accessors return `Some`.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub admin: bool,
    pub listing: bool,
    pub writer: bool,
    pub refs: bool,
    pub lookup: bool,
    pub pulls: Option<PullRequestFieldNaming>,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            admin: true,
            listing: true,
            writer: true,
            refs: true,
            lookup: true,
            pulls: Some(PullRequestFieldNaming::HeadBase),
        }
    }

    pub fn none() -> Self {
        Self {
            admin: false,
            listing: false,
            writer: false,
            refs: false,
            lookup: false,
            pulls: None,
        }
    }
}

#[derive(Debug, Default)]
struct Branch {
    head: String,
    files: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    repositories: BTreeMap<String, FakeRepo>,
    branches: BTreeMap<String, Branch>,
    known_shas: Vec<String>,
    pull_requests: Vec<FakePullRequest>,
    scripted_write_statuses: Vec<u16>,
    commit_counter: u32,
    calls: Vec<Call>,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct FakeDriver {
    capabilities: Capabilities,
    inline_commits: bool,
    branch_created_status: u16,
    create_owner: Option<String>,
    state: Mutex<State>,
}

impl FakeDriver {
    /// Every capability, `HeadBase` naming, commits reported inline.
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::all())
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            inline_commits: true,
            branch_created_status: status::CREATED,
            create_owner: None,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_repository(self, key: &str, mut repository: FakeRepo) -> Self {
        if repository.owner.is_none() {
            repository.owner = key.rsplit_once('/').map(|(owner, _)| owner.to_string());
        }
        self.lock().repositories.insert(key.to_string(), repository);
        self
    }

    /// Created repositories land under `owner` whatever the reference says,
    /// like an API that always creates for the authenticated account.
    pub fn creates_under(mut self, owner: &str) -> Self {
        self.create_owner = Some(owner.to_string());
        self
    }

    /// Adds `name` with an initial commit containing `files`.
    pub fn with_branch(self, name: &str, files: &[&str]) -> Self {
        {
            let mut state = self.lock();
            let head = format!("base-{name}");
            state.known_shas.push(head.clone());
            state.branches.insert(
                name.to_string(),
                Branch {
                    head,
                    files: files.iter().map(|f| f.to_string()).collect(),
                },
            );
        }
        self
    }

    /// When `false`, writes return `201` without a body and the engine has
    /// to re-resolve the head.
    pub fn inline_commits(mut self, inline: bool) -> Self {
        self.inline_commits = inline;
        self
    }

    pub fn branch_created_status(mut self, status: u16) -> Self {
        self.branch_created_status = status;
        self
    }

    /// Statuses returned by successive writes; once exhausted, writes
    /// succeed with `201`.
    pub fn script_write_statuses(self, statuses: &[u16]) -> Self {
        self.lock().scripted_write_statuses = statuses.to_vec();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// `(path, base_sha)` of every write issued, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::WriteFile { path, base_sha } => Some((path.clone(), base_sha.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn head(&self, branch: &str) -> Option<String> {
        self.lock().branches.get(branch).map(|b| b.head.clone())
    }

    pub fn repository(&self, key: &str) -> Option<FakeRepo> {
        self.lock().repositories.get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake driver state poisoned")
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn key_of(&self, repository: &FakeRepo) -> String {
        self.lock()
            .repositories
            .iter()
            .find(|(_, r)| r.name == repository.name)
            .map(|(k, _)| k.clone())
            .unwrap_or_else(|| repository.name.clone())
    }
}

#[async_trait]
impl Driver for FakeDriver {
    type Repository = FakeRepo;
    type FileEntry = FakeEntry;
    type Reference = FakeRef;
    type Commit = FakeCommit;
    type PullRequest = FakePullRequest;

    fn provider_id(&self) -> ProviderId {
        ProviderId::new("fake")
    }

    fn domain(&self) -> &str {
        DOMAIN
    }

    async fn find_repository(&self, key: &str) -> ProviderResult<FakeRepo> {
        self.record(Call::FindRepository(key.to_string()));
        self.lock()
            .repositories
            .get(key)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("repository {key}")))
    }

    fn repository_admin(&self) -> Option<&dyn RepositoryAdmin<Self>> {
        self.capabilities.admin.then_some(self as &dyn RepositoryAdmin<Self>)
    }

    fn directory_listing(&self) -> Option<&dyn DirectoryListing<Self>> {
        self.capabilities.listing.then_some(self as &dyn DirectoryListing<Self>)
    }

    fn content_writer(&self) -> Option<&dyn ContentWriter<Self>> {
        self.capabilities.writer.then_some(self as &dyn ContentWriter<Self>)
    }

    fn branch_refs(&self) -> Option<&dyn BranchRefs<Self>> {
        self.capabilities.refs.then_some(self as &dyn BranchRefs<Self>)
    }

    fn commit_lookup(&self) -> Option<&dyn CommitLookup<Self>> {
        self.capabilities.lookup.then_some(self as &dyn CommitLookup<Self>)
    }

    fn pull_request_api(&self) -> Option<&dyn PullRequestApi<Self>> {
        self.capabilities
            .pulls
            .is_some()
            .then_some(self as &dyn PullRequestApi<Self>)
    }
}

#[async_trait]
impl RepositoryAdmin<FakeDriver> for FakeDriver {
    async fn list_repositories(
        &self,
        owner_kind: OwnerKind,
        owner: &str,
    ) -> ProviderResult<Vec<FakeRepo>> {
        self.record(Call::ListRepositories(owner_kind, owner.to_string()));
        let prefix = format!("{owner}/");
        Ok(self
            .lock()
            .repositories
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, repo)| repo.clone())
            .collect())
    }

    async fn create_repository(
        &self,
        reference: &RepositoryRef,
        info: &RepositoryInfo,
    ) -> ProviderResult<FakeRepo> {
        self.record(Call::CreateRepository(reference.full_name()));
        let owner = self
            .create_owner
            .clone()
            .unwrap_or_else(|| reference.owner_path());
        let key = format!("{owner}/{}", reference.repository_name());
        let repo = FakeRepo {
            name: reference.repository_name().to_string(),
            owner: Some(owner),
            description: info.description.clone(),
            default_branch: info.default_branch.clone().or_else(|| Some("main".into())),
            visibility: info.visibility.or(Some(Visibility::Private)),
        };
        self.lock().repositories.insert(key, repo.clone());
        Ok(repo)
    }

    async fn update_repository(
        &self,
        repository: &FakeRepo,
        info: &RepositoryInfo,
    ) -> ProviderResult<FakeRepo> {
        let key = self.key_of(repository);
        self.record(Call::UpdateRepository(key.clone()));
        let mut state = self.lock();
        let stored = state
            .repositories
            .get_mut(&key)
            .ok_or_else(|| ProviderError::not_found(format!("repository {key}")))?;
        if info.description.is_some() {
            stored.description = info.description.clone();
        }
        if info.default_branch.is_some() {
            stored.default_branch = info.default_branch.clone();
        }
        if info.visibility.is_some() {
            stored.visibility = info.visibility;
        }
        Ok(stored.clone())
    }

    async fn delete_repository(&self, repository: &FakeRepo) -> ProviderResult<()> {
        let key = self.key_of(repository);
        self.record(Call::DeleteRepository(key.clone()));
        self.lock().repositories.remove(&key);
        Ok(())
    }
}

#[async_trait]
impl DirectoryListing<FakeDriver> for FakeDriver {
    async fn list_directory(
        &self,
        _repository: &FakeRepo,
        _path: &str,
        reference: &str,
    ) -> ProviderResult<Vec<FakeEntry>> {
        self.record(Call::ListDirectory(reference.to_string()));
        let state = self.lock();
        let branch = state
            .branches
            .get(reference)
            .ok_or_else(|| ProviderError::not_found(format!("branch {reference}")))?;
        Ok(branch
            .files
            .iter()
            .map(|path| FakeEntry {
                path: path.clone(),
                last_commit: Some(branch.head.clone()),
            })
            .collect())
    }
}

#[async_trait]
impl ContentWriter<FakeDriver> for FakeDriver {
    async fn write_file(
        &self,
        _repository: &FakeRepo,
        path: &str,
        params: &WriteFileParams,
    ) -> ProviderResult<DriverResponse<FakeCommit>> {
        self.record(Call::WriteFile {
            path: path.to_string(),
            base_sha: params.base_sha.to_string(),
        });

        let mut state = self.lock();
        if !state.scripted_write_statuses.is_empty() {
            let scripted = state.scripted_write_statuses.remove(0);
            if scripted != status::CREATED {
                return Ok(DriverResponse::rejected(scripted, "scripted rejection"));
            }
        }

        state.commit_counter += 1;
        let sha = format!("sha-{}", state.commit_counter);
        let Some(branch) = state.branches.get_mut(&params.branch) else {
            return Ok(DriverResponse::rejected(status::NOT_FOUND, "branch does not exist"));
        };
        if branch.head != params.base_sha.as_str() {
            return Ok(DriverResponse::rejected(status::CONFLICT, "base sha is not the branch head"));
        }
        branch.head = sha.clone();
        if !branch.files.iter().any(|f| f == path) {
            branch.files.push(path.to_string());
        }
        state.known_shas.push(sha.clone());

        let body = self.inline_commits.then(|| FakeCommit { sha: Some(sha) });
        Ok(DriverResponse::new(status::CREATED, body))
    }
}

#[async_trait]
impl BranchRefs<FakeDriver> for FakeDriver {
    fn branch_created_status(&self) -> u16 {
        self.branch_created_status
    }

    async fn find_branch(&self, _repository: &FakeRepo, name: &str) -> ProviderResult<FakeRef> {
        self.record(Call::FindBranch(name.to_string()));
        self.lock()
            .branches
            .get(name)
            .map(|b| FakeRef {
                name: format!("refs/heads/{name}"),
                sha: Some(b.head.clone()),
            })
            .ok_or_else(|| ProviderError::not_found(format!("branch {name}")))
    }

    async fn create_branch_ref(
        &self,
        _repository: &FakeRepo,
        name: &str,
        sha: &str,
    ) -> ProviderResult<DriverResponse<()>> {
        self.record(Call::CreateBranch {
            name: name.to_string(),
            sha: sha.to_string(),
        });
        let mut state = self.lock();
        if !state.known_shas.iter().any(|s| s == sha) {
            return Ok(DriverResponse::rejected(422, format!("object {sha} does not exist")));
        }
        if state.branches.contains_key(name) {
            return Ok(DriverResponse::rejected(status::CONFLICT, "branch already exists"));
        }
        let files = state
            .branches
            .values()
            .find(|b| b.head == sha)
            .map(|b| b.files.clone())
            .unwrap_or_default();
        state.branches.insert(
            name.to_string(),
            Branch {
                head: sha.to_string(),
                files,
            },
        );
        Ok(DriverResponse::new(self.branch_created_status, None))
    }
}

#[async_trait]
impl CommitLookup<FakeDriver> for FakeDriver {
    async fn find_commit(&self, _repository: &FakeRepo, reference: &str) -> ProviderResult<FakeCommit> {
        self.record(Call::FindCommit(reference.to_string()));
        let state = self.lock();
        if let Some(branch) = state.branches.get(reference) {
            return Ok(FakeCommit {
                sha: Some(branch.head.clone()),
            });
        }
        if state.known_shas.iter().any(|s| s == reference) {
            return Ok(FakeCommit {
                sha: Some(reference.to_string()),
            });
        }
        Err(ProviderError::not_found(format!("commit {reference}")))
    }
}

#[async_trait]
impl PullRequestApi<FakeDriver> for FakeDriver {
    fn field_naming(&self) -> PullRequestFieldNaming {
        self.capabilities
            .pulls
            .unwrap_or(PullRequestFieldNaming::HeadBase)
    }

    async fn create_pull_request(
        &self,
        _repository: &FakeRepo,
        input: &PullRequestInput,
    ) -> ProviderResult<DriverResponse<FakePullRequest>> {
        self.record(Call::CreatePullRequest(input.clone()));
        let (head, base) = input.branches();
        let mut state = self.lock();
        let pr = FakePullRequest {
            number: state.pull_requests.len() as u64 + 1,
            title: input.title().to_string(),
            head: head.to_string(),
            base: base.to_string(),
            merged: false,
        };
        state.pull_requests.push(pr.clone());
        Ok(DriverResponse::new(status::CREATED, Some(pr)))
    }

    async fn list_pull_requests(&self, _repository: &FakeRepo) -> ProviderResult<Vec<FakePullRequest>> {
        self.record(Call::ListPullRequests);
        Ok(self.lock().pull_requests.clone())
    }

    async fn get_pull_request(
        &self,
        _repository: &FakeRepo,
        number: PullRequestNumber,
    ) -> ProviderResult<FakePullRequest> {
        self.record(Call::GetPullRequest(number.as_u64()));
        self.lock()
            .pull_requests
            .iter()
            .find(|pr| pr.number == number.as_u64())
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("pull request {number}")))
    }

    async fn merge_pull_request(
        &self,
        _repository: &FakeRepo,
        number: PullRequestNumber,
        _method: MergeMethod,
        _message: &str,
    ) -> ProviderResult<DriverResponse<()>> {
        self.record(Call::MergePullRequest(number.as_u64()));
        let mut state = self.lock();
        match state
            .pull_requests
            .iter_mut()
            .find(|pr| pr.number == number.as_u64())
        {
            Some(pr) if pr.merged => Ok(DriverResponse::rejected(405, "already merged")),
            Some(pr) => {
                pr.merged = true;
                Ok(DriverResponse::new(status::OK, None))
            }
            None => Ok(DriverResponse::rejected(status::NOT_FOUND, "no such pull request")),
        }
    }
}

// ---------------------------------------------------------------------------
// A driver that only knows how to find repositories and open pull requests
// ---------------------------------------------------------------------------

/// Exercises the capability defaults: only `create_pull_request` is provided.
pub struct CreateOnlyDriver;

#[async_trait]
impl Driver for CreateOnlyDriver {
    type Repository = FakeRepo;
    type FileEntry = FakeEntry;
    type Reference = FakeRef;
    type Commit = FakeCommit;
    type PullRequest = FakePullRequest;

    fn provider_id(&self) -> ProviderId {
        ProviderId::new("create-only")
    }

    fn domain(&self) -> &str {
        ""
    }

    async fn find_repository(&self, key: &str) -> ProviderResult<FakeRepo> {
        let (owner, name) = key.rsplit_once('/').unwrap_or(("", key));
        Ok(FakeRepo::named(name).owned_by(owner))
    }

    fn pull_request_api(&self) -> Option<&dyn PullRequestApi<Self>> {
        Some(self)
    }
}

#[async_trait]
impl PullRequestApi<CreateOnlyDriver> for CreateOnlyDriver {
    fn field_naming(&self) -> PullRequestFieldNaming {
        PullRequestFieldNaming::SourceTarget
    }

    async fn create_pull_request(
        &self,
        _repository: &FakeRepo,
        input: &PullRequestInput,
    ) -> ProviderResult<DriverResponse<FakePullRequest>> {
        let (head, base) = input.branches();
        Ok(DriverResponse::new(
            status::CREATED,
            Some(FakePullRequest {
                number: 1,
                title: input.title().to_string(),
                head: head.to_string(),
                base: base.to_string(),
                merged: false,
            }),
        ))
    }
}

pub fn org_ref(name: &str) -> RepositoryRef {
    RepositoryRef::organization(DOMAIN, "acme", name)
}
