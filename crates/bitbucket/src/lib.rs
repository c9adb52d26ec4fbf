//! Bitbucket Cloud driver.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Implements [`gitprovider::Driver`] over the Bitbucket
//! Cloud REST API 2.0. Repositories live under a workspace, so the default
//! `workspace/slug` repository key is used as-is.
//!
//! ## Capabilities
//!
//! | Capability | Endpoint(s) |
//! |------------|-------------|
//! | repository lookup | `GET repositories/{workspace}/{slug}` |
//! | directory listing | `GET repositories/{workspace}/{slug}/src/{revision}/` |
//! | content write | `POST repositories/{workspace}/{slug}/src` (form, `201`, no body) |
//! | branch refs | `GET`/`POST repositories/{workspace}/{slug}/refs/branches` (`201`) |
//! | commit lookup | `GET repositories/{workspace}/{slug}/commit/{revision}` |
//! | pull requests | `repositories/{workspace}/{slug}/pullrequests`, `SourceTarget` naming, merge `200` |
//!
//! A content write answers without the new commit, so the commit engine
//! re-resolves the head after every write. The write names its parent
//! through the `parents` field and is refused when the branch has moved.
//!
//! Collections are paginated with an absolute `next` link, which is followed
//! until absent.

mod git;
pub mod models;
mod pulls;

use async_trait::async_trait;
use gitprovider::driver::status;
use gitprovider::{
    BranchRefs, CommitLookup, ContentWriter, DirectoryListing, Driver, ProviderError, ProviderId,
    ProviderResult, PullRequestApi,
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use transport::{Authorization, HttpTransport, TransportResult};
use url::Url;

use crate::models::Page;

pub use models::{BitbucketBranch, BitbucketCommit, BitbucketPullRequest, BitbucketRepository, BitbucketSrcEntry};

/// Bitbucket Cloud's API root.
pub const DEFAULT_SERVER: &str = "https://api.bitbucket.org/2.0";

#[derive(Debug, Clone)]
pub struct BitbucketDriver {
    transport: HttpTransport,
    domain: String,
}

impl BitbucketDriver {
    /// `server` is the API root, normally [`DEFAULT_SERVER`].
    ///
    /// With a `username` the `secret` is an app password sent as Basic
    /// credentials; without one it is an access token sent as a Bearer token.
    pub fn new(server: &str, username: Option<&str>, secret: Option<&str>) -> TransportResult<Self> {
        let mut transport = HttpTransport::new(server)?;
        transport = match (username, secret) {
            (Some(username), Some(secret)) => {
                transport.with_hook(Authorization::basic(username, secret))
            }
            (None, Some(secret)) => transport.with_hook(Authorization::bearer(secret)),
            (_, None) => transport,
        };

        // api.bitbucket.org serves repositories that live on bitbucket.org.
        let base = transport.base_url();
        let domain = match (base.host_str(), base.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.strip_prefix("api.").unwrap_or(host).to_string(),
            (None, _) => String::new(),
        };
        Ok(Self { transport, domain })
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// `repositories/{workspace}/{slug}` followed by `tail`.
    fn repo_url(&self, full_name: &str, tail: &[&str]) -> ProviderResult<Url> {
        let segments: Vec<&str> = std::iter::once("repositories")
            .chain(full_name.split('/'))
            .chain(tail.iter().copied())
            .collect();
        Ok(self.transport.endpoint(&segments)?)
    }

    /// Every value of a paginated collection, starting at `first`.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        first: Url,
        resource: impl Fn() -> String,
    ) -> ProviderResult<Vec<T>> {
        let mut values = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next.take() {
            let response = self.transport.get(url).await?;
            let page: Page<T> = response.expect_json(status::OK, &resource)?;
            values.extend(page.values);

            if let Some(link) = page.next {
                debug!(next = %link, "following page link");
                next = Some(Url::parse(&link).map_err(|e| ProviderError::Transport {
                    message: format!("invalid page link '{link}'"),
                    source: Some(Box::new(e)),
                })?);
            }
        }
        Ok(values)
    }
}

#[async_trait]
impl Driver for BitbucketDriver {
    type Repository = BitbucketRepository;
    type FileEntry = BitbucketSrcEntry;
    type Reference = BitbucketBranch;
    type Commit = BitbucketCommit;
    type PullRequest = BitbucketPullRequest;

    fn provider_id(&self) -> ProviderId {
        ProviderId::BITBUCKET
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    #[instrument(skip(self), fields(provider = "bitbucket"))]
    async fn find_repository(&self, key: &str) -> ProviderResult<BitbucketRepository> {
        let url = self.repo_url(key, &[])?;
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
