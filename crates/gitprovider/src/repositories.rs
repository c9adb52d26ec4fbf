//! Repository adapter.
//!
//! [`OrgRepositoriesClient`] and [`UserRepositoriesClient`] resolve a
//! [`RepositoryRef`] to a [`Repository`] handle. The handle captures the
//! backend object at `get` time; [`Repository::info`] is a pure projection of
//! that object and never refreshes it. Call `get` again to observe changes.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::branches::BranchClient;
use crate::commits::CommitClient;
use crate::driver::{status, Driver, NativeRepository, RepositoryAdmin};
use crate::errors::{ProviderError, ProviderResult};
use crate::identifiers::{same_domain, OrganizationRef, OwnerKind, RepositoryRef, UserRef};
use crate::pull_requests::PullRequestClient;
use crate::types::RepositoryInfo;

// ---------------------------------------------------------------------------
// Repository handle
// ---------------------------------------------------------------------------

/// A resolved repository, org- or user-scoped.
///
/// Owns the backend repository object and shares the client's driver. Acts as
/// the factory for the commit, branch and pull request sub-clients, all of
/// which are scoped to this repository.
pub struct Repository<D: Driver> {
    driver: Arc<D>,
    reference: RepositoryRef,
    native: D::Repository,
}

impl<D: Driver> Repository<D> {
    pub(crate) fn new(driver: Arc<D>, reference: RepositoryRef, native: D::Repository) -> Self {
        Self {
            driver,
            reference,
            native,
        }
    }

    /// The reference this handle was resolved from.
    pub fn repository(&self) -> &RepositoryRef {
        &self.reference
    }

    /// Metadata as captured when the handle was fetched. No network call.
    pub fn info(&self) -> RepositoryInfo {
        RepositoryInfo {
            description: self.native.description().map(str::to_string),
            default_branch: self.native.default_branch().map(str::to_string),
            visibility: self.native.visibility(),
        }
    }

    /// The unmodified backend repository object.
    pub fn api_object(&self) -> &D::Repository {
        &self.native
    }

    /// Pushes `info` to the backend. This handle is not updated; `get` the
    /// repository again to observe the new state.
    #[instrument(skip_all, fields(repository = %self.reference))]
    pub async fn set(&self, info: RepositoryInfo) -> ProviderResult<()> {
        let admin = admin(self.driver.as_ref(), "update repository")?;
        admin
            .update_repository(&self.native, &info)
            .await
            .inspect_err(|e| warn!(error = %e, "repository update failed"))?;
        debug!("repository updated");
        Ok(())
    }

    /// Deletes the repository on the backend.
    #[instrument(skip_all, fields(repository = %self.reference))]
    pub async fn delete(&self) -> ProviderResult<()> {
        let admin = admin(self.driver.as_ref(), "delete repository")?;
        admin
            .delete_repository(&self.native)
            .await
            .inspect_err(|e| warn!(error = %e, "repository delete failed"))?;
        debug!("repository deleted");
        Ok(())
    }

    pub fn commits(&self) -> CommitClient<'_, D> {
        CommitClient::new(self)
    }

    pub fn branches(&self) -> BranchClient<'_, D> {
        BranchClient::new(self)
    }

    pub fn pull_requests(&self) -> PullRequestClient<'_, D> {
        PullRequestClient::new(self)
    }

    pub(crate) fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: Driver> Clone for Repository<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            reference: self.reference.clone(),
            native: self.native.clone(),
        }
    }
}

impl<D: Driver> std::fmt::Debug for Repository<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("provider", &self.driver.provider_id())
            .field("reference", &self.reference)
            .field("native", &self.native)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Repositories owned by organizations.
pub struct OrgRepositoriesClient<D: Driver> {
    inner: Collection<D>,
}

impl<D: Driver> OrgRepositoriesClient<D> {
    pub(crate) fn new(driver: Arc<D>) -> Self {
        Self {
            inner: Collection {
                driver,
                kind: OwnerKind::Organization,
            },
        }
    }

    /// Resolves an organization repository.
    ///
    /// Returns [`ProviderError::NotFound`] when the backend has no such
    /// repository, or when it answers with a repository of a different name.
    pub async fn get(&self, reference: &RepositoryRef) -> ProviderResult<Repository<D>> {
        self.inner.get(reference).await
    }

    /// Every repository in the organization.
    #[instrument(skip_all, fields(organization = %organization.path()))]
    pub async fn list(&self, organization: &OrganizationRef) -> ProviderResult<Vec<Repository<D>>> {
        let admin = admin(self.inner.driver.as_ref(), "list organization repositories")?;
        self.inner.check_domain(organization.domain())?;
        let natives = admin
            .list_repositories(OwnerKind::Organization, &organization.path())
            .await?;
        Ok(natives
            .into_iter()
            .map(|native| {
                let reference = RepositoryRef::in_organization(organization, native.name());
                Repository::new(Arc::clone(&self.inner.driver), reference, native)
            })
            .collect())
    }

    pub async fn create(
        &self,
        reference: &RepositoryRef,
        info: RepositoryInfo,
    ) -> ProviderResult<Repository<D>> {
        self.inner.create(reference, &info).await
    }

    /// Makes `desired` the actual state. Returns whether anything changed.
    pub async fn reconcile(
        &self,
        reference: &RepositoryRef,
        desired: RepositoryInfo,
    ) -> ProviderResult<(Repository<D>, bool)> {
        self.inner.reconcile(reference, &desired).await
    }
}

/// Repositories owned by user accounts.
pub struct UserRepositoriesClient<D: Driver> {
    inner: Collection<D>,
}

impl<D: Driver> UserRepositoriesClient<D> {
    pub(crate) fn new(driver: Arc<D>) -> Self {
        Self {
            inner: Collection {
                driver,
                kind: OwnerKind::User,
            },
        }
    }

    /// Resolves a user repository. Same contract as
    /// [`OrgRepositoriesClient::get`].
    pub async fn get(&self, reference: &RepositoryRef) -> ProviderResult<Repository<D>> {
        self.inner.get(reference).await
    }

    /// Every repository of the user.
    #[instrument(skip_all, fields(user = %user.user_login()))]
    pub async fn list(&self, user: &UserRef) -> ProviderResult<Vec<Repository<D>>> {
        let admin = admin(self.inner.driver.as_ref(), "list user repositories")?;
        self.inner.check_domain(user.domain())?;
        let natives = admin
            .list_repositories(OwnerKind::User, user.user_login())
            .await?;
        Ok(natives
            .into_iter()
            .map(|native| {
                let reference = RepositoryRef::for_user(user, native.name());
                Repository::new(Arc::clone(&self.inner.driver), reference, native)
            })
            .collect())
    }

    pub async fn create(
        &self,
        reference: &RepositoryRef,
        info: RepositoryInfo,
    ) -> ProviderResult<Repository<D>> {
        self.inner.create(reference, &info).await
    }

    /// Makes `desired` the actual state. Returns whether anything changed.
    pub async fn reconcile(
        &self,
        reference: &RepositoryRef,
        desired: RepositoryInfo,
    ) -> ProviderResult<(Repository<D>, bool)> {
        self.inner.reconcile(reference, &desired).await
    }
}

/// Shared implementation of the two collections, parameterised by owner kind.
struct Collection<D: Driver> {
    driver: Arc<D>,
    kind: OwnerKind,
}

impl<D: Driver> Collection<D> {
    #[instrument(skip_all, fields(repository = %reference))]
    async fn get(&self, reference: &RepositoryRef) -> ProviderResult<Repository<D>> {
        self.validate(reference)?;

        let key = self.driver.repository_key(reference)?;
        let native = self
            .driver
            .find_repository(&key)
            .await
            .inspect_err(|e| debug!(error = %e, key = %key, "repository lookup failed"))?;

        // A redirect (renamed or transferred repository) or a fuzzy match
        // must not be returned as the requested repository.
        if let Some(found) = identity_mismatch(reference, &native) {
            warn!(found = %found, "backend returned a different repository");
            return Err(ProviderError::not_found(format!("repository {reference}")));
        }

        Ok(Repository::new(
            Arc::clone(&self.driver),
            reference.clone(),
            native,
        ))
    }

    #[instrument(skip_all, fields(repository = %reference))]
    async fn create(
        &self,
        reference: &RepositoryRef,
        info: &RepositoryInfo,
    ) -> ProviderResult<Repository<D>> {
        let admin = admin(self.driver.as_ref(), "create repository")?;
        self.validate(reference)?;
        self.driver.repository_key(reference)?;

        let native = admin
            .create_repository(reference, info)
            .await
            .inspect_err(|e| warn!(error = %e, "repository create failed"))?;
        if let Some(found) = identity_mismatch(reference, &native) {
            warn!(found = %found, "backend created a different repository");
            return Err(ProviderError::backend(
                status::CREATED,
                format!("requested {reference} but the backend created {found}"),
            ));
        }
        debug!("repository created");
        Ok(Repository::new(
            Arc::clone(&self.driver),
            reference.clone(),
            native,
        ))
    }

    #[instrument(skip_all, fields(repository = %reference))]
    async fn reconcile(
        &self,
        reference: &RepositoryRef,
        desired: &RepositoryInfo,
    ) -> ProviderResult<(Repository<D>, bool)> {
        let admin = admin(self.driver.as_ref(), "reconcile repository")?;

        let current = match self.get(reference).await {
            Ok(repository) => repository,
            Err(ProviderError::NotFound { .. }) => {
                let created = self.create(reference, desired).await?;
                return Ok((created, true));
            }
            Err(e) => return Err(e),
        };

        if current.info().satisfies(desired) {
            debug!("repository already in desired state");
            return Ok((current, false));
        }

        let updated = admin.update_repository(current.api_object(), desired).await?;
        if let Some(found) = identity_mismatch(reference, &updated) {
            warn!(found = %found, "backend updated a different repository");
            return Err(ProviderError::backend(
                status::OK,
                format!("requested {reference} but the backend returned {found}"),
            ));
        }
        debug!("repository updated to desired state");
        Ok((
            Repository::new(Arc::clone(&self.driver), reference.clone(), updated),
            true,
        ))
    }

    fn validate(&self, reference: &RepositoryRef) -> ProviderResult<()> {
        if reference.owner_kind() != self.kind {
            return Err(ProviderError::Validation {
                message: format!(
                    "expected a {} repository reference, got a {} one ({reference})",
                    self.kind,
                    reference.owner_kind()
                ),
            });
        }
        if let Some(field) = reference.first_missing_field() {
            return Err(ProviderError::Validation {
                message: format!("repository reference has no {field}"),
            });
        }
        self.check_domain(reference.domain())
    }

    fn check_domain(&self, domain: &str) -> ProviderResult<()> {
        if same_domain(domain, self.driver.domain()) {
            Ok(())
        } else {
            Err(ProviderError::Validation {
                message: format!(
                    "domain {domain} is not served by this client ({})",
                    self.driver.domain()
                ),
            })
        }
    }
}

/// `None` when `native` is the repository `reference` names (case-insensitive
/// name and, when the backend reports one, owner path). Otherwise the
/// identity the backend reported.
fn identity_mismatch<R: NativeRepository>(reference: &RepositoryRef, native: &R) -> Option<String> {
    let name_matches = native.name().eq_ignore_ascii_case(reference.repository_name());
    let owner_matches = native
        .owner_path()
        .is_none_or(|owner| owner.eq_ignore_ascii_case(&reference.owner_path()));
    if name_matches && owner_matches {
        return None;
    }
    Some(match native.owner_path() {
        Some(owner) => format!("{owner}/{}", native.name()),
        None => native.name().to_string(),
    })
}

fn admin<'d, D: Driver>(
    driver: &'d D,
    operation: &'static str,
) -> ProviderResult<&'d dyn RepositoryAdmin<D>> {
    driver
        .repository_admin()
        .ok_or_else(|| ProviderError::unsupported(operation))
}
