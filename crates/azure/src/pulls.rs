//! Pull requests.

use async_trait::async_trait;
use gitprovider::driver::status;
use gitprovider::{
    DriverResponse, MergeMethod, ProviderResult, PullRequestApi, PullRequestFieldNaming,
    PullRequestInput, PullRequestNumber,
};
use tracing::{instrument, warn};

use crate::models::{
    full_ref, AzurePullRequest, AzureRepository, Collection, CompletePullRequestBody,
    CompletionOptions, CreatePullRequestBody, LastMergeSourceCommit,
};
use crate::AzureDriver;

const PAGE_SIZE: usize = 100;

fn merge_strategy(method: MergeMethod) -> &'static str {
    match method {
        MergeMethod::Merge => "noFastForward",
        MergeMethod::Squash => "squash",
        MergeMethod::Rebase => "rebase",
    }
}

#[async_trait]
impl PullRequestApi<AzureDriver> for AzureDriver {
    fn field_naming(&self) -> PullRequestFieldNaming {
        PullRequestFieldNaming::SourceTarget
    }

    #[instrument(skip_all, fields(provider = "azure-devops", repository = %repository.name))]
    async fn create_pull_request(
        &self,
        repository: &AzureRepository,
        input: &PullRequestInput,
    ) -> ProviderResult<DriverResponse<AzurePullRequest>> {
        let (source, target) = input.branches();
        let body = CreatePullRequestBody {
            source_ref_name: full_ref(source),
            target_ref_name: full_ref(target),
            title: input.title(),
            description: input.body(),
        };

        let url = self.repo_url(repository, &["pullrequests"])?;
        let response = self.transport.post_json(url, &body).await?;
        let created: DriverResponse<AzurePullRequest> = response.driver_response(status::CREATED)?;
        Ok(DriverResponse {
            status: created.status,
            body: created.body.map(AzurePullRequest::with_web_url),
            message: created.message,
        })
    }

    #[instrument(skip_all, fields(provider = "azure-devops", repository = %repository.name))]
    async fn list_pull_requests(&self, repository: &AzureRepository) -> ProviderResult<Vec<AzurePullRequest>> {
        let top = PAGE_SIZE.to_string();
        let mut pull_requests = Vec::new();
        loop {
            let mut url = self.repo_url(repository, &["pullrequests"])?;
            url.query_pairs_mut()
                .append_pair("searchCriteria.status", "all")
                .append_pair("$top", &top)
                .append_pair("$skip", &pull_requests.len().to_string());

            let response = self.transport.get(url).await?;
            let batch: Collection<AzurePullRequest> = response
                .expect_json(status::OK, || format!("repository {}", repository.name))?;
            let done = batch.value.len() < PAGE_SIZE;
            pull_requests.extend(batch.value.into_iter().map(AzurePullRequest::with_web_url));
            if done {
                break;
            }
        }
        Ok(pull_requests)
    }

    #[instrument(skip_all, fields(provider = "azure-devops", repository = %repository.name, number = %number))]
    async fn get_pull_request(
        &self,
        repository: &AzureRepository,
        number: PullRequestNumber,
    ) -> ProviderResult<AzurePullRequest> {
        let id = number.to_string();
        let url = self.repo_url(repository, &["pullrequests", &id])?;
        let response = self.transport.get(url).await?;
        let pr: AzurePullRequest =
            response.expect_json(status::OK, || format!("pull request {id}"))?;
        Ok(pr.with_web_url())
    }

    /// Completes the pull request. Azure DevOps requires the source commit the
    /// caller expects to merge, so the pull request is fetched first.
    #[instrument(skip_all, fields(provider = "azure-devops", repository = %repository.name, number = %number))]
    async fn merge_pull_request(
        &self,
        repository: &AzureRepository,
        number: PullRequestNumber,
        method: MergeMethod,
        message: &str,
    ) -> ProviderResult<DriverResponse<()>> {
        let current = self.get_pull_request(repository, number).await?;
        let Some(source_commit) = current
            .last_merge_source_commit
            .as_ref()
            .and_then(|c| c.commit_id.as_deref())
        else {
            warn!("pull request has no merge source commit");
            return Ok(DriverResponse::rejected(
                status::CONFLICT,
                "pull request has no merge source commit",
            ));
        };

        let body = CompletePullRequestBody {
            status: "completed",
            last_merge_source_commit: LastMergeSourceCommit {
                commit_id: source_commit,
            },
            completion_options: CompletionOptions {
                merge_strategy: merge_strategy(method),
                merge_commit_message: message,
            },
        };

        let id = number.to_string();
        let url = self.repo_url(repository, &["pullrequests", &id])?;
        let response = self.transport.patch_json(url, &body).await?;
        Ok(response.status_response(status::OK))
    }
}
