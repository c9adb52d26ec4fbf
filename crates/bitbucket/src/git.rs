//! Source listing, form-encoded file writes, branches and commits.

use async_trait::async_trait;
use gitprovider::driver::status;
use gitprovider::{
    BranchRefs, CommitLookup, ContentWriter, DirectoryListing, DriverResponse, ProviderResult,
    WriteFileParams,
};
use tracing::instrument;
use url::Url;

use crate::models::{
    BitbucketBranch, BitbucketCommit, BitbucketRepository, BitbucketSrcEntry, CreateBranchBody,
    CreateBranchTarget, Page,
};
use crate::BitbucketDriver;

#[async_trait]
impl DirectoryListing<BitbucketDriver> for BitbucketDriver {
    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name, reference = %reference))]
    async fn list_directory(
        &self,
        repository: &BitbucketRepository,
        path: &str,
        reference: &str,
    ) -> ProviderResult<Vec<BitbucketSrcEntry>> {
        let url = self.src_url(repository, path, reference)?;
        self.fetch_all(url, || format!("branch {reference}")).await
    }

    /// One entry from the first page; `next` is never followed.
    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name, reference = %reference))]
    async fn first_entry(
        &self,
        repository: &BitbucketRepository,
        path: &str,
        reference: &str,
    ) -> ProviderResult<Option<BitbucketSrcEntry>> {
        let mut url = self.src_url(repository, path, reference)?;
        url.query_pairs_mut().append_pair("pagelen", "1");
        let response = self.transport.get(url).await?;
        let page: Page<BitbucketSrcEntry> =
            response.expect_json(status::OK, || format!("branch {reference}"))?;
        Ok(page.values.into_iter().next())
    }
}

impl BitbucketDriver {
    fn src_url(&self, repository: &BitbucketRepository, path: &str, reference: &str) -> ProviderResult<Url> {
        let mut tail = vec!["src", reference];
        tail.extend(path.split('/').filter(|s| !s.is_empty()));
        // Trailing slash: list the directory rather than read a file.
        tail.push("");
        self.repo_url(&repository.full_name, &tail)
    }
}

#[async_trait]
impl ContentWriter<BitbucketDriver> for BitbucketDriver {
    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name, path = %path))]
    async fn write_file(
        &self,
        repository: &BitbucketRepository,
        path: &str,
        params: &WriteFileParams,
    ) -> ProviderResult<DriverResponse<BitbucketCommit>> {
        let file_path = format!("/{}", path.trim_start_matches('/'));
        let content = String::from_utf8_lossy(&params.data);
        let form = [
            (file_path.as_str(), &*content),
            ("message", params.message.as_str()),
            ("branch", params.branch.as_str()),
            ("parents", params.base_sha.as_str()),
        ];

        let url = self.repo_url(&repository.full_name, &["src"])?;
        let response = self.transport.post_form(url, &form).await?;
        // No body on success; the head is re-resolved by the caller.
        let bodiless = response.status_response(status::CREATED);
        Ok(DriverResponse {
            status: bodiless.status,
            body: None,
            message: bodiless.message,
        })
    }
}

#[async_trait]
impl BranchRefs<BitbucketDriver> for BitbucketDriver {
    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name, branch = %name))]
    async fn find_branch(&self, repository: &BitbucketRepository, name: &str) -> ProviderResult<BitbucketBranch> {
        let url = self.repo_url(&repository.full_name, &["refs", "branches", name])?;
        let response = self.transport.get(url).await?;
        response.expect_json(status::OK, || format!("branch {name}"))
    }

    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name, branch = %name))]
    async fn create_branch_ref(
        &self,
        repository: &BitbucketRepository,
        name: &str,
        sha: &str,
    ) -> ProviderResult<DriverResponse<()>> {
        let url = self.repo_url(&repository.full_name, &["refs", "branches"])?;
        let body = CreateBranchBody {
            name,
            target: CreateBranchTarget { hash: sha },
        };
        let response = self.transport.post_json(url, &body).await?;
        Ok(response.status_response(status::CREATED))
    }
}

#[async_trait]
impl CommitLookup<BitbucketDriver> for BitbucketDriver {
    #[instrument(skip_all, fields(provider = "bitbucket", repository = %repository.full_name, reference = %reference))]
    async fn find_commit(&self, repository: &BitbucketRepository, reference: &str) -> ProviderResult<BitbucketCommit> {
        let url = self.repo_url(&repository.full_name, &["commit", reference])?;
        let response = self.transport.get(url).await?;
        response.expect_json(status::OK, || format!("commit {reference}"))
    }
}
