//! Organization adapter.
//!
//! None of the backends in scope exposes organization metadata in a form the
//! other adapters need, so this adapter is intentionally thin: `get` returns a
//! placeholder wrapping the reference without contacting the backend, and
//! enumeration is unsupported everywhere.

use std::sync::Arc;

use tracing::debug;

use crate::driver::Driver;
use crate::errors::{ProviderError, ProviderResult};
use crate::identifiers::{same_domain, OrganizationRef};
use crate::types::OrganizationInfo;

/// A placeholder organization. It proves nothing about the organization's
/// existence; the first repository call under it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    reference: OrganizationRef,
}

impl Organization {
    pub fn organization(&self) -> &OrganizationRef {
        &self.reference
    }

    /// Always empty: no backend reports organization metadata here.
    pub fn info(&self) -> OrganizationInfo {
        OrganizationInfo::default()
    }

    /// The reference itself; there is no backend object behind it.
    pub fn api_object(&self) -> &OrganizationRef {
        &self.reference
    }
}

pub struct OrganizationsClient<D: Driver> {
    driver: Arc<D>,
}

impl<D: Driver> OrganizationsClient<D> {
    pub(crate) fn new(driver: Arc<D>) -> Self {
        Self { driver }
    }

    /// Wraps `reference` in a placeholder [`Organization`]. No network call.
    pub async fn get(&self, reference: &OrganizationRef) -> ProviderResult<Organization> {
        if reference.organization().trim().is_empty() {
            return Err(ProviderError::Validation {
                message: "organization reference has no organization".to_string(),
            });
        }
        if !same_domain(reference.domain(), self.driver.domain()) {
            return Err(ProviderError::Validation {
                message: format!(
                    "domain {} is not served by this client ({})",
                    reference.domain(),
                    self.driver.domain()
                ),
            });
        }
        debug!(organization = %reference.path(), "returning placeholder organization");
        Ok(Organization {
            reference: reference.clone(),
        })
    }

    pub async fn list(&self) -> ProviderResult<Vec<Organization>> {
        Err(ProviderError::unsupported("list organizations"))
    }

    pub async fn children(&self, _reference: &OrganizationRef) -> ProviderResult<Vec<Organization>> {
        Err(ProviderError::unsupported("list child organizations"))
    }
}
