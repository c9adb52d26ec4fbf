//! Directory listing, pushes, refs and commit lookup.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use gitprovider::driver::status;
use gitprovider::{
    BranchRefs, CommitLookup, ContentWriter, DirectoryListing, DriverResponse, ProviderError,
    ProviderResult, WriteFileParams,
};
use tracing::{instrument, warn};

use crate::models::{
    full_ref, AzureCommit, AzureItem, AzureRef, AzureRepository, Change, ChangeItem, Collection,
    NewContent, PushBody, PushCommit, PushResponse, RefUpdate, RefUpdateBody, RefUpdateResult,
};
use crate::AzureDriver;

/// Object id meaning "no object": creating a ref updates it from this.
const ZERO_OBJECT_ID: &str = "0000000000000000000000000000000000000000";

fn is_full_sha(reference: &str) -> bool {
    reference.len() == 40 && reference.bytes().all(|b| b.is_ascii_hexdigit())
}

#[async_trait]
impl DirectoryListing<AzureDriver> for AzureDriver {
    #[instrument(skip_all, fields(provider = "azure-devops", repository = %repository.name, reference = %reference))]
    async fn list_directory(
        &self,
        repository: &AzureRepository,
        path: &str,
        reference: &str,
    ) -> ProviderResult<Vec<AzureItem>> {
        let scope = format!("/{}", path.trim_start_matches('/'));
        let mut url = self.repo_url(repository, &["items"])?;
        url.query_pairs_mut()
            .append_pair("scopePath", &scope)
            .append_pair("recursionLevel", "OneLevel")
            .append_pair("versionDescriptor.version", reference)
            .append_pair("versionDescriptor.versionType", "branch")
            .append_pair("latestProcessedChange", "true");

        let response = self.transport.get(url).await?;
        let items: Collection<AzureItem> =
            response.expect_json(status::OK, || format!("branch {reference}"))?;
        Ok(items.value)
    }
}

#[async_trait]
impl ContentWriter<AzureDriver> for AzureDriver {
    #[instrument(skip_all, fields(provider = "azure-devops", repository = %repository.name, path = %path))]
    async fn write_file(
        &self,
        repository: &AzureRepository,
        path: &str,
        params: &WriteFileParams,
    ) -> ProviderResult<DriverResponse<AzureCommit>> {
        let item_path = format!("/{}", path.trim_start_matches('/'));
        let body = PushBody {
            ref_updates: [RefUpdate {
                name: full_ref(&params.branch),
                old_object_id: params.base_sha.as_str(),
            }],
            commits: [PushCommit {
                comment: &params.message,
                changes: [Change {
                    change_type: "add",
                    item: ChangeItem { path: &item_path },
                    new_content: NewContent {
                        content: STANDARD.encode(&params.data),
                        content_type: "base64encoded",
                    },
                }],
            }],
        };

        let url = self.repo_url(repository, &["pushes"])?;
        let response = self.transport.post_json(url, &body).await?;
        let push: DriverResponse<PushResponse> = response.driver_response(status::CREATED)?;
        Ok(DriverResponse {
            status: push.status,
            body: push.body.and_then(|p| p.commits.into_iter().next()),
            message: push.message,
        })
    }
}

#[async_trait]
impl BranchRefs<AzureDriver> for AzureDriver {
    fn branch_created_status(&self) -> u16 {
        status::OK
    }

    #[instrument(skip_all, fields(provider = "azure-devops", repository = %repository.name, branch = %name))]
    async fn find_branch(&self, repository: &AzureRepository, name: &str) -> ProviderResult<AzureRef> {
        let mut url = self.repo_url(repository, &["refs"])?;
        url.query_pairs_mut().append_pair("filter", &format!("heads/{name}"));

        let response = self.transport.get(url).await?;
        let refs: Collection<AzureRef> =
            response.expect_json(status::OK, || format!("branch {name}"))?;

        // `filter` is a prefix match.
        let wanted = full_ref(name);
        refs.value
            .into_iter()
            .find(|r| r.name == wanted)
            .ok_or_else(|| ProviderError::not_found(format!("branch {name}")))
    }

    #[instrument(skip_all, fields(provider = "azure-devops", repository = %repository.name, branch = %name))]
    async fn create_branch_ref(
        &self,
        repository: &AzureRepository,
        name: &str,
        sha: &str,
    ) -> ProviderResult<DriverResponse<()>> {
        let body = [RefUpdateBody {
            name: full_ref(name),
            old_object_id: ZERO_OBJECT_ID,
            new_object_id: sha,
        }];
        let url = self.repo_url(repository, &["refs"])?;
        let response = self.transport.post_json(url, &body).await?;
        if response.status != status::OK {
            return Ok(response.status_response(status::OK));
        }

        let results: Collection<RefUpdateResult> = response.json()?;
        match results.value.into_iter().next() {
            Some(result) if result.success => Ok(DriverResponse::new(status::OK, None)),
            Some(result) => {
                let message = result
                    .custom_message
                    .or(result.update_status)
                    .unwrap_or_else(|| "ref update was not applied".to_string());
                warn!(%message, "ref update rejected");
                Ok(DriverResponse::rejected(status::CONFLICT, message))
            }
            None => Ok(DriverResponse::rejected(status::CONFLICT, "no ref update result")),
        }
    }
}

#[async_trait]
impl CommitLookup<AzureDriver> for AzureDriver {
    #[instrument(skip_all, fields(provider = "azure-devops", repository = %repository.name, reference = %reference))]
    async fn find_commit(&self, repository: &AzureRepository, reference: &str) -> ProviderResult<AzureCommit> {
        if is_full_sha(reference) {
            let url = self.repo_url(repository, &["commits", reference])?;
            let response = self.transport.get(url).await?;
            return response.expect_json(status::OK, || format!("commit {reference}"));
        }

        let mut url = self.repo_url(repository, &["commits"])?;
        url.query_pairs_mut()
            .append_pair("searchCriteria.itemVersion.version", reference)
            .append_pair("searchCriteria.itemVersion.versionType", "branch")
            .append_pair("searchCriteria.$top", "1");

        let response = self.transport.get(url).await?;
        let commits: Collection<AzureCommit> =
            response.expect_json(status::OK, || format!("branch {reference}"))?;
        commits
            .value
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::not_found(format!("commit on branch {reference}")))
    }
}
