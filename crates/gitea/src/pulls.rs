//! Pull requests.

use async_trait::async_trait;
use gitprovider::driver::status;
use gitprovider::{
    DriverResponse, MergeMethod, ProviderResult, PullRequestApi, PullRequestFieldNaming,
    PullRequestInput, PullRequestNumber,
};
use tracing::instrument;

use crate::models::{CreatePullRequestBody, GiteaPullRequest, GiteaRepository, MergePullRequestBody};
use crate::{GiteaDriver, PAGE_LIMIT};

fn merge_style(method: MergeMethod) -> &'static str {
    match method {
        MergeMethod::Merge => "merge",
        MergeMethod::Squash => "squash",
        MergeMethod::Rebase => "rebase",
    }
}

#[async_trait]
impl PullRequestApi<GiteaDriver> for GiteaDriver {
    fn field_naming(&self) -> PullRequestFieldNaming {
        PullRequestFieldNaming::HeadBase
    }

    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name))]
    async fn create_pull_request(
        &self,
        repository: &GiteaRepository,
        input: &PullRequestInput,
    ) -> ProviderResult<DriverResponse<GiteaPullRequest>> {
        let (head, base) = input.branches();
        let url = self.repo_url(&repository.full_name, &["pulls"])?;
        let body = CreatePullRequestBody {
            title: input.title(),
            body: input.body(),
            head,
            base,
        };
        let response = self.transport.post_json(url, &body).await?;
        Ok(response.driver_response(status::CREATED)?)
    }

    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name))]
    async fn list_pull_requests(&self, repository: &GiteaRepository) -> ProviderResult<Vec<GiteaPullRequest>> {
        let limit = PAGE_LIMIT.to_string();
        let mut pull_requests = Vec::new();
        for page in 1.. {
            let mut url = self.repo_url(&repository.full_name, &["pulls"])?;
            url.query_pairs_mut()
                .append_pair("state", "all")
                .append_pair("page", &page.to_string())
                .append_pair("limit", &limit);

            let response = self.transport.get(url).await?;
            let batch: Vec<GiteaPullRequest> = response
                .expect_json(status::OK, || format!("repository {}", repository.full_name))?;
            let done = batch.len() < PAGE_LIMIT;
            pull_requests.extend(batch);
            if done {
                break;
            }
        }
        Ok(pull_requests)
    }

    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name, number = %number))]
    async fn get_pull_request(
        &self,
        repository: &GiteaRepository,
        number: PullRequestNumber,
    ) -> ProviderResult<GiteaPullRequest> {
        let number = number.to_string();
        let url = self.repo_url(&repository.full_name, &["pulls", &number])?;
        let response = self.transport.get(url).await?;
        response.expect_json(status::OK, || format!("pull request {number}"))
    }

    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name, number = %number))]
    async fn merge_pull_request(
        &self,
        repository: &GiteaRepository,
        number: PullRequestNumber,
        method: MergeMethod,
        message: &str,
    ) -> ProviderResult<DriverResponse<()>> {
        let number = number.to_string();
        let url = self.repo_url(&repository.full_name, &["pulls", &number, "merge"])?;
        let body = MergePullRequestBody {
            merge_style: merge_style(method),
            message,
        };
        let response = self.transport.post_json(url, &body).await?;
        Ok(response.status_response(status::OK))
    }
}
