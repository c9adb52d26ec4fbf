//! Gitea driver.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Implements [`gitprovider::Driver`] over the Gitea REST
//! API (`/api/v1`). Request building, JSON marshaling and pagination live
//! here; the adapters in [`gitprovider`] see only the capability traits.
//!
//! ## Capabilities
//!
//! | Capability | Endpoint(s) |
//! |------------|-------------|
//! | repository lookup | `GET repos/{owner}/{repo}` |
//! | administration | `users/{login}/repos`, `orgs/{org}/repos`, `user/repos` or `admin/users/{login}/repos`, `PATCH`/`DELETE repos/{owner}/{repo}` |
//! | content write | `POST repos/{owner}/{repo}/contents/{path}` (`201`, commit inline) |
//! | branch refs | `GET`/`POST repos/{owner}/{repo}/branches` (`201`) |
//! | commit lookup | `GET repos/{owner}/{repo}/git/commits/{ref}` |
//! | pull requests | `repos/{owner}/{repo}/pulls`, `HeadBase` naming, merge `200` |
//!
//! Directory listing is deliberately not exposed: a Gitea contents listing
//! reports each entry's *last* commit, which is not the branch head, so head
//! resolution goes through the branch reference instead.
//!
//! The create-file endpoint takes no parent commit, so a file write lands on
//! whatever the branch head is. The driver compares the inline commit's first
//! parent with the base SHA afterwards and reports a mismatch as a `409`
//! rejection; the write itself has already happened by then.

mod admin;
mod git;
pub mod models;
mod pulls;

use async_trait::async_trait;
use gitprovider::driver::status;
use gitprovider::{
    BranchRefs, CommitLookup, ContentWriter, Driver, ProviderId, ProviderResult, PullRequestApi,
    RepositoryAdmin,
};
use tracing::instrument;
use transport::{Authorization, HttpTransport, TransportResult};

pub use models::{GiteaBranch, GiteaCommit, GiteaContentEntry, GiteaPullRequest, GiteaRepository};

/// Page size for paginated list endpoints.
const PAGE_LIMIT: usize = 50;

/// A Gitea instance, reached at `{server}/api/v1`.
#[derive(Debug, Clone)]
pub struct GiteaDriver {
    transport: HttpTransport,
    domain: String,
}

impl GiteaDriver {
    /// `server` is the instance root, e.g. `https://gitea.example.com`.
    /// `token` is sent as `Authorization: token <token>`.
    pub fn new(server: &str, token: Option<&str>) -> TransportResult<Self> {
        let base = format!("{}/api/v1", server.trim_end_matches('/'));
        let mut transport = HttpTransport::new(&base)?;
        if let Some(token) = token {
            transport = transport.with_hook(Authorization::token(token));
        }
        Ok(Self::with_transport(transport))
    }

    /// Uses a preconfigured transport whose base URL already ends in `/api/v1`.
    pub fn with_transport(transport: HttpTransport) -> Self {
        let base = transport.base_url();
        let domain = match (base.host_str(), base.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        Self { transport, domain }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// `repos/{owner}/{name}` followed by `tail`.
    fn repo_url(&self, full_name: &str, tail: &[&str]) -> ProviderResult<url::Url> {
        let segments: Vec<&str> = std::iter::once("repos")
            .chain(full_name.split('/'))
            .chain(tail.iter().copied())
            .collect();
        Ok(self.transport.endpoint(&segments)?)
    }
}

#[async_trait]
impl Driver for GiteaDriver {
    type Repository = GiteaRepository;
    type FileEntry = GiteaContentEntry;
    type Reference = GiteaBranch;
    type Commit = GiteaCommit;
    type PullRequest = GiteaPullRequest;

    fn provider_id(&self) -> ProviderId {
        ProviderId::GITEA
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    #[instrument(skip(self), fields(provider = "gitea"))]
    async fn find_repository(&self, key: &str) -> ProviderResult<GiteaRepository> {
        let url = self.repo_url(key, &[])?;
        let response = self.transport.get(url).await?;
        response.expect_json(status::OK, || format!("repository {key}"))
    }

    fn repository_admin(&self) -> Option<&dyn RepositoryAdmin<Self>> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_includes_port() {
        let driver = GiteaDriver::new("http://127.0.0.1:3000/", None).unwrap();
        assert_eq!(driver.domain(), "127.0.0.1:3000");
        assert_eq!(
            driver.transport().base_url().as_str(),
            "http://127.0.0.1:3000/api/v1/"
        );
    }

    #[test]
    fn test_repo_url_splits_the_full_name() {
        let driver = GiteaDriver::new("https://gitea.example.com", None).unwrap();

        let url = driver.repo_url("acme/infra", &["branches", "release/1.0"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://gitea.example.com/api/v1/repos/acme/infra/branches/release%2F1.0"
        );
        assert!(driver.directory_listing().is_none());
    }
}
