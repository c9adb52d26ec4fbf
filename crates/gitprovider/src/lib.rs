//! Provider abstraction layer for git hosting backends.
//!
//! One contract for repository, branch, commit and pull request operations
//! across backends that disagree about which operations exist, which status
//! codes mean success, and what a "commit" is.
//!
//! ## Architectural Layer
//!
//! This crate is the **core**. It owns the identity model, the error
//! taxonomy, the driver capability traits and the adapters built on them. It
//! performs no I/O of its own: every network round trip goes through a
//! [`Driver`] supplied by a driver crate.
//!
//! ## Module Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | `RepositoryRef`, `OrganizationRef`, `UserRef`, `ProviderId`, SHA and branch newtypes |
//! | [`types`] | `RepositoryInfo`, `CommitFile`, `PullRequestInfo` and other value types |
//! | [`errors`] | `ProviderError`, `ProviderResult` |
//! | [`driver`] | `Driver` and the capability traits drivers implement |
//! | [`client`] | `Client`, the entry point |
//! | [`organizations`] | Placeholder organization adapter |
//! | [`repositories`] | Repository handle and the org/user collections |
//! | [`commits`] | Commit views and the multi-file commit emulation engine |
//! | [`branches`] | Branch creation |
//! | [`pull_requests`] | Pull request adapter |

pub mod branches;
pub mod client;
pub mod commits;
pub mod driver;
pub mod errors;
pub mod identifiers;
pub mod organizations;
pub mod pull_requests;
pub mod repositories;
pub mod types;

pub use branches::BranchClient;
pub use client::Client;
pub use commits::{Commit, CommitClient, CommitObject, NativeCommit};
pub use driver::{
    BranchRefs, CommitLookup, ContentWriter, DirectoryListing, Driver, DriverResponse,
    NativeCommitPointer, NativePullRequest, NativeRepository, PullRequestApi,
    PullRequestFieldNaming, PullRequestInput, RepositoryAdmin, WriteFileParams,
};
pub use errors::{ProviderError, ProviderResult};
pub use identifiers::{
    BranchName, CommitSha, OrganizationRef, OwnerKind, ProviderId, PullRequestNumber,
    RepositoryRef, UserRef,
};
pub use organizations::{Organization, OrganizationsClient};
pub use pull_requests::{PullRequest, PullRequestClient};
pub use repositories::{OrgRepositoriesClient, Repository, UserRepositoriesClient};
pub use types::{
    CommitFile, CommitInfo, MergeMethod, OrganizationInfo, PullRequestInfo, RepositoryInfo,
    TokenPermission, Visibility,
};
