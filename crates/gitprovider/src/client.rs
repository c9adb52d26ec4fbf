//! The entry point: one [`Client`] per backend endpoint.

use std::sync::Arc;

use crate::driver::Driver;
use crate::errors::ProviderResult;
use crate::identifiers::{ProviderId, RepositoryRef};
use crate::organizations::OrganizationsClient;
use crate::repositories::{OrgRepositoriesClient, UserRepositoriesClient};
use crate::types::TokenPermission;

/// Binds one driver for its whole lifetime.
///
/// Cloning is cheap and every clone shares the driver. The client holds no
/// mutable state, so it is `Send + Sync` whenever the driver is.
pub struct Client<D: Driver> {
    driver: Arc<D>,
}

impl<D: Driver> Client<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver: Arc::new(driver),
        }
    }

    /// The endpoint fixed when the driver was constructed.
    pub fn supported_domain(&self) -> &str {
        self.driver.domain()
    }

    pub fn provider_id(&self) -> ProviderId {
        self.driver.provider_id()
    }

    pub fn organizations(&self) -> OrganizationsClient<D> {
        OrganizationsClient::new(Arc::clone(&self.driver))
    }

    pub fn org_repositories(&self) -> OrgRepositoriesClient<D> {
        OrgRepositoriesClient::new(Arc::clone(&self.driver))
    }

    pub fn user_repositories(&self) -> UserRepositoriesClient<D> {
        UserRepositoriesClient::new(Arc::clone(&self.driver))
    }

    /// Whether the configured credential holds `permission` on `repository`.
    ///
    /// No backend in scope exposes token scopes, so the answer is always
    /// `Ok(None)`: "no information", not "denied".
    pub async fn has_token_permission(
        &self,
        _repository: &RepositoryRef,
        _permission: TokenPermission,
    ) -> ProviderResult<Option<bool>> {
        Ok(None)
    }

    /// The driver, for calls the neutral surface does not cover.
    pub fn raw(&self) -> &D {
        &self.driver
    }
}

impl<D: Driver> Clone for Client<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
        }
    }
}

impl<D: Driver> std::fmt::Debug for Client<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("provider", &self.driver.provider_id())
            .field("domain", &self.driver.domain())
            .finish()
    }
}
