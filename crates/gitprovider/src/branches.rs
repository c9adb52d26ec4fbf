//! Branch adapter.
//!
//! Branches have no entity type: creation is write-once and returns nothing.
//! There is no emulation for a missing create-ref capability.

use tracing::{debug, instrument, warn};

use crate::driver::Driver;
use crate::errors::{ProviderError, ProviderResult};
use crate::repositories::Repository;

/// Branch operations scoped to one repository.
pub struct BranchClient<'r, D: Driver> {
    repository: &'r Repository<D>,
}

impl<'r, D: Driver> BranchClient<'r, D> {
    pub(crate) fn new(repository: &'r Repository<D>) -> Self {
        Self { repository }
    }

    /// Creates `branch` pointing at `sha`.
    ///
    /// Succeeds only on the driver's documented success status. The SHA is
    /// not checked locally; a malformed or unknown SHA comes back from the
    /// backend as [`ProviderError::Backend`].
    #[instrument(skip_all, fields(repository = %self.repository.repository(), branch = %branch, sha = %sha))]
    pub async fn create(&self, branch: &str, sha: &str) -> ProviderResult<()> {
        let refs = self
            .repository
            .driver()
            .branch_refs()
            .ok_or_else(|| ProviderError::unsupported("create branch"))?;

        if branch.trim().is_empty() {
            return Err(ProviderError::Validation {
                message: "branch name must not be empty".to_string(),
            });
        }

        refs.create_branch_ref(self.repository.api_object(), branch, sha)
            .await?
            .require_status(refs.branch_created_status())
            .inspect_err(|e| warn!(error = %e, "branch creation rejected"))?;

        debug!("branch created");
        Ok(())
    }
}
