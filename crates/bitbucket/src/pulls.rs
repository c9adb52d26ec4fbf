//! Pull requests.

use async_trait::async_trait;
use gitprovider::driver::status;
use gitprovider::{
    DriverResponse, MergeMethod, ProviderResult, PullRequestApi, PullRequestFieldNaming,
    PullRequestInput, PullRequestNumber,
};
use tracing::instrument;

use crate::models::{
    BitbucketPullRequest, BitbucketRepository, CreatePullRequestBody, EndpointBody,
    MergePullRequestBody,
};
use crate::BitbucketDriver;

/// Without an explicit filter only open pull requests are listed.
const ALL_STATES: [&str; 4] = ["OPEN", "MERGED", "DECLINED", "SUPERSEDED"];

fn merge_strategy(method: MergeMethod) -> &'static str {
    match method {
        MergeMethod::Merge => "merge_commit",
        MergeMethod::Squash => "squash",
        MergeMethod::Rebase => "fast_forward",
    }
}

#[async_trait]
impl PullRequestApi<BitbucketDriver> for BitbucketDriver {
    fn field_naming(&self) -> PullRequestFieldNaming {
        PullRequestFieldNaming::SourceTarget
    }

    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name))]
    async fn create_pull_request(
        &self,
        repository: &BitbucketRepository,
        input: &PullRequestInput,
    ) -> ProviderResult<DriverResponse<BitbucketPullRequest>> {
        let (source, destination) = input.branches();
        let body = CreatePullRequestBody {
            title: input.title(),
            description: input.body(),
            source: EndpointBody::branch(source),
            destination: EndpointBody::branch(destination),
        };
        let url = self.repo_url(&repository.full_name, &["pullrequests"])?;
        let response = self.transport.post_json(url, &body).await?;
        Ok(response.driver_response(status::CREATED)?)
    }

    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name))]
    async fn list_pull_requests(
        &self,
        repository: &BitbucketRepository,
    ) -> ProviderResult<Vec<BitbucketPullRequest>> {
        let mut url = self.repo_url(&repository.full_name, &["pullrequests"])?;
        {
            let mut query = url.query_pairs_mut();
            for state in ALL_STATES {
                query.append_pair("state", state);
            }
        }
        self.fetch_all(url, || format!("repository {}", repository.full_name))
            .await
    }

    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name, number = %number))]
    async fn get_pull_request(
        &self,
        repository: &BitbucketRepository,
        number: PullRequestNumber,
    ) -> ProviderResult<BitbucketPullRequest> {
        let id = number.to_string();
        let url = self.repo_url(&repository.full_name, &["pullrequests", &id])?;
        let response = self.transport.get(url).await?;
        response.expect_json(status::OK, || format!("pull request {id}"))
    }

    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name, number = %number))]
    async fn merge_pull_request(
        &self,
        repository: &BitbucketRepository,
        number: PullRequestNumber,
        method: MergeMethod,
        message: &str,
    ) -> ProviderResult<DriverResponse<()>> {
        let id = number.to_string();
        let url = self.repo_url(&repository.full_name, &["pullrequests", &id, "merge"])?;
        let body = MergePullRequestBody {
            kind: "pullrequest",
            message,
            merge_strategy: merge_strategy(method),
            close_source_branch: false,
        };
        let response = self.transport.post_json(url, &body).await?;
        Ok(response.status_response(status::OK))
    }
}
