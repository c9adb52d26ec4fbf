//! Pull request adapter.
//!
//! Every call has the same shape: translate the neutral arguments into the
//! driver's field naming, call the driver, check the status, and wrap the
//! backend object in a [`PullRequest`].

use tracing::{debug, instrument, warn};

use crate::driver::{status, Driver, NativePullRequest, PullRequestApi};
use crate::errors::{ProviderError, ProviderResult};
use crate::identifiers::PullRequestNumber;
use crate::repositories::Repository;
use crate::types::{MergeMethod, PullRequestInfo};

/// A pull request as last fetched.
pub struct PullRequest<D: Driver> {
    native: D::PullRequest,
}

impl<D: Driver> PullRequest<D> {
    fn new(native: D::PullRequest) -> Self {
        Self { native }
    }

    /// Neutral projection. `merged` reflects the state at fetch time.
    pub fn get(&self) -> PullRequestInfo {
        PullRequestInfo {
            number: PullRequestNumber::new(self.native.number()),
            web_url: self.native.web_url().to_string(),
            merged: self.native.merged(),
            title: self.native.title().to_string(),
            head: self.native.head().to_string(),
            base: self.native.base().to_string(),
        }
    }

    /// The unmodified backend object.
    pub fn api_object(&self) -> &D::PullRequest {
        &self.native
    }
}

impl<D: Driver> Clone for PullRequest<D> {
    fn clone(&self) -> Self {
        Self::new(self.native.clone())
    }
}

impl<D: Driver> std::fmt::Debug for PullRequest<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PullRequest").field(&self.native).finish()
    }
}

/// Pull request operations scoped to one repository.
pub struct PullRequestClient<'r, D: Driver> {
    repository: &'r Repository<D>,
}

impl<'r, D: Driver> PullRequestClient<'r, D> {
    pub(crate) fn new(repository: &'r Repository<D>) -> Self {
        Self { repository }
    }

    /// Opens a pull request from `branch` into `base_branch`.
    #[instrument(skip_all, fields(repository = %self.repository.repository(), branch = %branch, base = %base_branch))]
    pub async fn create(
        &self,
        title: &str,
        branch: &str,
        base_branch: &str,
        description: &str,
    ) -> ProviderResult<PullRequest<D>> {
        let api = self.api("create pull request")?;
        let input = api
            .field_naming()
            .translate(title, branch, base_branch, description);

        let native = api
            .create_pull_request(self.repository.api_object(), &input)
            .await?
            .require_status(status::CREATED)
            .inspect_err(|e| warn!(error = %e, "pull request creation rejected"))?
            .ok_or_else(|| {
                ProviderError::backend(
                    status::CREATED,
                    "pull request created but the response carried no pull request",
                )
            })?;

        debug!(number = native.number(), "pull request created");
        Ok(PullRequest::new(native))
    }

    #[instrument(skip_all, fields(repository = %self.repository.repository()))]
    pub async fn list(&self) -> ProviderResult<Vec<PullRequest<D>>> {
        let api = self.api("list pull requests")?;
        let natives = api.list_pull_requests(self.repository.api_object()).await?;
        Ok(natives.into_iter().map(PullRequest::new).collect())
    }

    #[instrument(skip_all, fields(repository = %self.repository.repository(), number = number))]
    pub async fn get(&self, number: u64) -> ProviderResult<PullRequest<D>> {
        let api = self.api("get pull request")?;
        let native = api
            .get_pull_request(self.repository.api_object(), PullRequestNumber::new(number))
            .await?;
        Ok(PullRequest::new(native))
    }

    /// Merges the pull request. Fetch it again to observe `merged`.
    #[instrument(skip_all, fields(repository = %self.repository.repository(), number = number, method = ?method))]
    pub async fn merge(&self, number: u64, method: MergeMethod, message: &str) -> ProviderResult<()> {
        let api = self.api("merge pull request")?;
        api.merge_pull_request(
            self.repository.api_object(),
            PullRequestNumber::new(number),
            method,
            message,
        )
        .await?
        .require_status(api.merged_status())
        .inspect_err(|e| warn!(error = %e, "merge rejected"))?;

        debug!("pull request merged");
        Ok(())
    }

    fn api(&self, operation: &'static str) -> ProviderResult<&'r dyn PullRequestApi<D>> {
        self.repository
            .driver()
            .pull_request_api()
            .ok_or_else(|| ProviderError::unsupported(operation))
    }
}
