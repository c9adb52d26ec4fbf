//! Identity and reference model.
//!
//! Every backend names things differently: Gitea and Bitbucket address a
//! repository as `owner/name`, Azure DevOps by a bare name (or GUID) scoped to
//! an organization and project. The types in this module identify users,
//! organizations and repositories independently of that naming; each driver
//! derives its own lookup key from them (see
//! [`Driver::repository_key`](crate::driver::Driver::repository_key)).
//!
//! All reference types are immutable once constructed and compare by
//! structural equality.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (backend-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Git names
// ---------------------------------------------------------------------------

string_id! {
    /// A Git commit SHA as reported by the backend.
    ///
    /// No syntax check is applied: backends disagree on abbreviated SHAs, and a
    /// malformed SHA is reported by the backend itself.
    CommitSha
}

string_id! {
    /// A Git branch name without the `refs/heads/` prefix (e.g. `"main"`).
    BranchName
}

u64_id! {
    /// Backend-assigned pull request number (Azure DevOps calls it the
    /// pull request id).
    PullRequestNumber
}

// ---------------------------------------------------------------------------
// Provider identity
// ---------------------------------------------------------------------------

/// Names the backend a driver talks to (e.g. `"gitea"`).
///
/// Fixed at driver construction time and never changes for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(&'static str);

impl ProviderId {
    /// Azure DevOps Services.
    pub const AZURE_DEVOPS: Self = Self("azure-devops");
    /// Gitea (self-hosted or gitea.com).
    pub const GITEA: Self = Self("gitea");
    /// Bitbucket Cloud.
    pub const BITBUCKET: Self = Self("bitbucket");

    /// Creates a provider identifier for a driver outside this workspace.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

// ---------------------------------------------------------------------------
// Owner and repository references
// ---------------------------------------------------------------------------

/// Whether a repository belongs to a user account or an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    User,
    Organization,
}

impl std::fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerKind::User => f.write_str("user"),
            OwnerKind::Organization => f.write_str("organization"),
        }
    }
}

/// Identifies a user account on a given domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    domain: String,
    user_login: String,
}

impl UserRef {
    pub fn new(domain: impl Into<String>, user_login: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            user_login: user_login.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn user_login(&self) -> &str {
        &self.user_login
    }
}

/// Identifies an organization (and optionally a nested sub-organization, as
/// in GitLab groups or Azure DevOps projects) on a given domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationRef {
    domain: String,
    organization: String,
    sub_organizations: Vec<String>,
}

impl OrganizationRef {
    pub fn new(domain: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            organization: organization.into(),
            sub_organizations: Vec::new(),
        }
    }

    /// Returns a copy of this reference nested under `sub_organizations`.
    pub fn with_sub_organizations<I, S>(mut self, sub_organizations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_organizations = sub_organizations.into_iter().map(Into::into).collect();
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn sub_organizations(&self) -> &[String] {
        &self.sub_organizations
    }

    /// The organization path with sub-organizations joined by `/`.
    pub fn path(&self) -> String {
        std::iter::once(self.organization.as_str())
            .chain(self.sub_organizations.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Structural identity of a repository.
///
/// Used as the lookup key for `get` operations. The backend-specific key
/// (full name, bare name, numeric id) is derived from this value by the
/// driver; callers never build backend keys themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    owner_kind: OwnerKind,
    domain: String,
    owner_login: String,
    sub_organizations: Vec<String>,
    repository_name: String,
}

impl RepositoryRef {
    /// A repository owned by the user `owner_login`.
    pub fn user(
        domain: impl Into<String>,
        owner_login: impl Into<String>,
        repository_name: impl Into<String>,
    ) -> Self {
        Self {
            owner_kind: OwnerKind::User,
            domain: domain.into(),
            owner_login: owner_login.into(),
            sub_organizations: Vec::new(),
            repository_name: repository_name.into(),
        }
    }

    /// A repository owned by the organization `organization`.
    pub fn organization(
        domain: impl Into<String>,
        organization: impl Into<String>,
        repository_name: impl Into<String>,
    ) -> Self {
        Self {
            owner_kind: OwnerKind::Organization,
            domain: domain.into(),
            owner_login: organization.into(),
            sub_organizations: Vec::new(),
            repository_name: repository_name.into(),
        }
    }

    /// A repository under an organization reference, sub-organizations included.
    pub fn in_organization(organization: &OrganizationRef, repository_name: impl Into<String>) -> Self {
        Self {
            owner_kind: OwnerKind::Organization,
            domain: organization.domain().to_string(),
            owner_login: organization.organization().to_string(),
            sub_organizations: organization.sub_organizations().to_vec(),
            repository_name: repository_name.into(),
        }
    }

    /// A repository under a user reference.
    pub fn for_user(user: &UserRef, repository_name: impl Into<String>) -> Self {
        Self::user(user.domain(), user.user_login(), repository_name)
    }

    pub fn owner_kind(&self) -> OwnerKind {
        self.owner_kind
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn owner_login(&self) -> &str {
        &self.owner_login
    }

    pub fn sub_organizations(&self) -> &[String] {
        &self.sub_organizations
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }

    /// The owner path: the login, followed by any sub-organizations.
    pub fn owner_path(&self) -> String {
        std::iter::once(self.owner_login.as_str())
            .chain(self.sub_organizations.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// `owner/name` (or `org/sub/name`).
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner_path(), self.repository_name)
    }

    /// Returns the missing field, if any, as a human-readable name.
    pub(crate) fn first_missing_field(&self) -> Option<&'static str> {
        if self.owner_login.trim().is_empty() {
            Some("owner login")
        } else if self.repository_name.trim().is_empty() {
            Some("repository name")
        } else {
            None
        }
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.domain.is_empty() {
            write!(f, "{}", self.full_name())
        } else {
            write!(f, "{}/{}", normalize_domain(&self.domain), self.full_name())
        }
    }
}

// ---------------------------------------------------------------------------
// Domain comparison
// ---------------------------------------------------------------------------

/// Strips the scheme and trailing slashes and lowercases the host part.
pub(crate) fn normalize_domain(domain: &str) -> String {
    let without_scheme = domain
        .split_once("://")
        .map_or(domain, |(_, rest)| rest);
    without_scheme.trim_end_matches('/').to_ascii_lowercase()
}

/// `true` when both domains name the same endpoint, or either one is empty.
pub(crate) fn same_domain(a: &str, b: &str) -> bool {
    a.is_empty() || b.is_empty() || normalize_domain(a) == normalize_domain(b)
}
