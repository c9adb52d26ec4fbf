//! Content writes, branch references and commit lookup.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use gitprovider::driver::status;
use gitprovider::{
    BranchRefs, CommitLookup, ContentWriter, DriverResponse, ProviderResult, WriteFileParams,
};
use tracing::{instrument, warn};

use crate::models::{
    CreateBranchBody, CreateFileBody, FileResponse, GiteaBranch, GiteaCommit, GiteaRepository,
};
use crate::GiteaDriver;

#[async_trait]
impl ContentWriter<GiteaDriver> for GiteaDriver {
    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name, path = %path))]
    async fn write_file(
        &self,
        repository: &GiteaRepository,
        path: &str,
        params: &WriteFileParams,
    ) -> ProviderResult<DriverResponse<GiteaCommit>> {
        let mut tail = vec!["contents"];
        tail.extend(path.trim_start_matches('/').split('/'));
        let url = self.repo_url(&repository.full_name, &tail)?;

        let body = CreateFileBody {
            content: STANDARD.encode(&params.data),
            message: &params.message,
            branch: &params.branch,
        };

        let response = self.transport.post_json(url, &body).await?;
        let file: DriverResponse<FileResponse> = response.driver_response(status::CREATED)?;
        let commit = file.body.and_then(|f| f.commit);

        // The contents API takes no expected head, so a concurrent push shows
        // up as a parent other than the one this write was built on.
        let parent = commit
            .as_ref()
            .and_then(|c| c.parents.first())
            .map(|p| p.sha.as_str());
        if let Some(parent) = parent.filter(|p| *p != params.base_sha.as_str()) {
            warn!(expected = %params.base_sha, parent, "branch moved under the write");
            return Ok(DriverResponse::rejected(
                status::CONFLICT,
                format!(
                    "branch {} moved: write landed on {parent}, expected {}",
                    params.branch, params.base_sha
                ),
            ));
        }

        Ok(DriverResponse {
            status: file.status,
            body: commit,
            message: file.message,
        })
    }
}

#[async_trait]
impl BranchRefs<GiteaDriver> for GiteaDriver {
    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name, branch = %name))]
    async fn find_branch(&self, repository: &GiteaRepository, name: &str) -> ProviderResult<GiteaBranch> {
        let url = self.repo_url(&repository.full_name, &["branches", name])?;
        let response = self.transport.get(url).await?;
        response.expect_json(status::OK, || format!("branch {name}"))
    }

    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name, branch = %name))]
    async fn create_branch_ref(
        &self,
        repository: &GiteaRepository,
        name: &str,
        sha: &str,
    ) -> ProviderResult<DriverResponse<()>> {
        let url = self.repo_url(&repository.full_name, &["branches"])?;
        let body = CreateBranchBody {
            new_branch_name: name,
            old_ref_name: sha,
        };
        let response = self.transport.post_json(url, &body).await?;
        Ok(response.status_response(status::CREATED))
    }
}

#[async_trait]
impl CommitLookup<GiteaDriver> for GiteaDriver {
    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name, reference = %reference))]
    async fn find_commit(&self, repository: &GiteaRepository, reference: &str) -> ProviderResult<GiteaCommit> {
        let url = self.repo_url(&repository.full_name, &["git", "commits", reference])?;
        let response = self.transport.get(url).await?;
        response.expect_json(status::OK, || format!("commit {reference}"))
    }
}
