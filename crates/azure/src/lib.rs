//! Azure DevOps driver.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Implements [`gitprovider::Driver`] over the Azure
//! DevOps Git REST API, version `7.0`, scoped to one organization and one
//! project: `{server}/{organization}/{project}/_apis/git/`.
//!
//! ## Backend specifics
//!
//! - Repositories are looked up by bare name within the project, so the
//!   driver overrides [`Driver::repository_key`]. Only organization
//!   references owned by `{organization}` or `{organization}/{project}`
//!   resolve; anything else is not found without a request.
//! - A file write is a *push* whose ref update names the expected old head.
//!   A stale head is rejected by the backend, which is what anchors each write
//!   of a multi-file commit on the previous one.
//! - Creating a branch answers `200 OK` with a per-ref result; a ref update
//!   that was not applied is reported as a `409` rejection.
//! - Pull request merge is a completion `PATCH` that must name the source
//!   commit, so it fetches the pull request first.
//! - There is no repository administration capability.

mod git;
pub mod models;
mod pulls;

use async_trait::async_trait;
use gitprovider::driver::status;
use gitprovider::{
    BranchRefs, CommitLookup, ContentWriter, DirectoryListing, Driver, OwnerKind, ProviderError,
    ProviderId, ProviderResult, PullRequestApi, RepositoryRef,
};
use tracing::instrument;
use transport::{Authorization, HttpTransport, TransportResult};
use url::Url;

pub use models::{AzureCommit, AzureItem, AzurePullRequest, AzureRef, AzureRepository};

/// The REST API version every request pins.
pub const API_VERSION: &str = "7.0";

/// Azure DevOps Services.
pub const DEFAULT_SERVER: &str = "https://dev.azure.com";

#[derive(Debug, Clone)]
pub struct AzureDriver {
    transport: HttpTransport,
    domain: String,
    organization: String,
    project: String,
}

impl AzureDriver {
    /// `token` is a personal access token, sent as Basic `:<token>`.
    pub fn new(
        server: &str,
        organization: &str,
        project: &str,
        token: Option<&str>,
    ) -> TransportResult<Self> {
        let root = HttpTransport::new(server)?;
        let base = root.endpoint(&[organization, project, "_apis", "git", ""])?;

        let mut transport = HttpTransport::new(base.as_str())?;
        if let Some(token) = token {
            transport = transport.with_hook(Authorization::basic("", token));
        }

        let domain = match (base.host_str(), base.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        Ok(Self {
            transport,
            domain,
            organization: organization.to_string(),
            project: project.to_string(),
        })
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// An API URL with `api-version` set.
    fn api_url(&self, segments: &[&str]) -> ProviderResult<Url> {
        let mut url = self.transport.endpoint(segments)?;
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    /// `repositories/{id}` followed by `tail`, with `api-version` set.
    fn repo_url(&self, repository: &AzureRepository, tail: &[&str]) -> ProviderResult<Url> {
        let segments: Vec<&str> = ["repositories", repository.id.as_str()]
            .into_iter()
            .chain(tail.iter().copied())
            .collect();
        self.api_url(&segments)
    }
}

#[async_trait]
impl Driver for AzureDriver {
    type Repository = AzureRepository;
    type FileEntry = AzureItem;
    type Reference = AzureRef;
    type Commit = AzureCommit;
    type PullRequest = AzurePullRequest;

    fn provider_id(&self) -> ProviderId {
        ProviderId::AZURE_DEVOPS
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    /// The bare repository name; the project is part of the base URL.
    fn repository_key(&self, reference: &RepositoryRef) -> ProviderResult<String> {
        let owner = reference.owner_path();
        let in_scope = reference.owner_kind() == OwnerKind::Organization
            && (owner.eq_ignore_ascii_case(&self.organization)
                || owner.eq_ignore_ascii_case(&format!("{}/{}", self.organization, self.project)));
        if !in_scope {
            return Err(ProviderError::not_found(format!(
                "repository {reference} (driver is scoped to {}/{})",
                self.organization, self.project
            )));
        }
        Ok(reference.repository_name().to_string())
    }

    #[instrument(skip(self), fields(provider = "azure-devops"))]
    async fn find_repository(&self, key: &str) -> ProviderResult<AzureRepository> {
        let url = self.api_url(&["repositories", key])?;
        let response = self.transport.get(url).await?;
        response.expect_json(status::OK, || format!("repository {key}"))
    }

    fn directory_listing(&self) -> Option<&dyn DirectoryListing<Self>> {
        Some(self)
    }

    fn content_writer(&self) -> Option<&dyn ContentWriter<Self>> {
        Some(self)
    }

    fn branch_refs(&self) -> Option<&dyn BranchRefs<Self>> {
        Some(self)
    }

    fn commit_lookup(&self) -> Option<&dyn CommitLookup<Self>> {
        Some(self)
    }

    fn pull_request_api(&self) -> Option<&dyn PullRequestApi<Self>> {
        Some(self)
    }
}
