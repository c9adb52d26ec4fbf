//! Repository administration.

use async_trait::async_trait;
use gitprovider::driver::status;
use gitprovider::{
    OwnerKind, ProviderError, ProviderResult, RepositoryAdmin, RepositoryInfo, RepositoryRef,
    Visibility,
};
use tracing::{debug, instrument};

use crate::models::{CreateRepositoryBody, EditRepositoryBody, GiteaRepository, GiteaUser};
use crate::{GiteaDriver, PAGE_LIMIT};

fn private_flag(visibility: Option<Visibility>) -> Option<bool> {
    visibility.map(|v| !matches!(v, Visibility::Public))
}

impl GiteaDriver {
    async fn authenticated_login(&self) -> ProviderResult<String> {
        let url = self.transport.endpoint(&["user"])?;
        let response = self.transport.get(url).await?;
        let user: GiteaUser = response.expect_json(status::OK, || "authenticated user".to_string())?;
        Ok(user.login)
    }
}

#[async_trait]
impl RepositoryAdmin<GiteaDriver> for GiteaDriver {
    #[instrument(skip(self), fields(provider = "gitea"))]
    async fn list_repositories(
        &self,
        owner_kind: OwnerKind,
        owner: &str,
    ) -> ProviderResult<Vec<GiteaRepository>> {
        let scope = match owner_kind {
            OwnerKind::User => "users",
            OwnerKind::Organization => "orgs",
        };
        let limit = PAGE_LIMIT.to_string();

        let mut repositories = Vec::new();
        for page in 1.. {
            let mut url = self.transport.endpoint(&[scope, owner, "repos"])?;
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("limit", &limit);

            let response = self.transport.get(url).await?;
            let batch: Vec<GiteaRepository> =
                response.expect_json(status::OK, || format!("{owner_kind} {owner}"))?;
            let done = batch.len() < PAGE_LIMIT;
            repositories.extend(batch);
            if done {
                break;
            }
        }

        debug!(count = repositories.len(), "listed repositories");
        Ok(repositories)
    }

    #[instrument(skip_all, fields(provider = "gitea", repository = %reference))]
    async fn create_repository(
        &self,
        reference: &RepositoryRef,
        info: &RepositoryInfo,
    ) -> ProviderResult<GiteaRepository> {
        // Gitea has no nested organizations.
        if !reference.sub_organizations().is_empty() {
            return Err(ProviderError::Validation {
                message: format!("gitea does not support sub-organizations ({reference})"),
            });
        }

        let url = match reference.owner_kind() {
            OwnerKind::Organization => {
                self.transport
                    .endpoint(&["orgs", reference.owner_login(), "repos"])?
            }
            // `user/repos` always creates for the token's account; anyone
            // else needs the admin endpoint.
            OwnerKind::User => {
                let login = reference.owner_login();
                if self.authenticated_login().await?.eq_ignore_ascii_case(login) {
                    self.transport.endpoint(&["user", "repos"])?
                } else {
                    debug!(login, "creating for another user through the admin API");
                    self.transport.endpoint(&["admin", "users", login, "repos"])?
                }
            }
        };
        let body = CreateRepositoryBody {
            name: reference.repository_name(),
            description: info.description.as_deref(),
            default_branch: info.default_branch.as_deref(),
            private: private_flag(info.visibility),
        };

        let response = self.transport.post_json(url, &body).await?;
        response.expect_json(status::CREATED, || format!("owner {}", reference.owner_login()))
    }

    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name))]
    async fn update_repository(
        &self,
        repository: &GiteaRepository,
        info: &RepositoryInfo,
    ) -> ProviderResult<GiteaRepository> {
        let url = self.repo_url(&repository.full_name, &[])?;
        let body = EditRepositoryBody {
            description: info.description.as_deref(),
            default_branch: info.default_branch.as_deref(),
            private: private_flag(info.visibility),
        };

        let response = self.transport.patch_json(url, &body).await?;
        response.expect_json(status::OK, || format!("repository {}", repository.full_name))
    }

    #[instrument(skip_all, fields(provider = "gitea", repository = %repository.full_name))]
    async fn delete_repository(&self, repository: &GiteaRepository) -> ProviderResult<()> {
        let url = self.repo_url(&repository.full_name, &[])?;
        let response = self.transport.delete(url).await?;
        if response.status == status::NO_CONTENT {
            Ok(())
        } else {
            Err(response.to_error(|| format!("repository {}", repository.full_name)))
        }
    }
}
