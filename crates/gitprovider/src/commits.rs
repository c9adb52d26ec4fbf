//! Commit views and the multi-file commit emulation engine.
//!
//! None of the backends in scope accepts several file changes in one write.
//! [`CommitClient::create`] therefore turns "commit N files on branch B" into
//! N single-file writes, each anchored on the head produced by the previous
//! one:
//!
//! ```text
//! validate all files ──► resolve head ──► write f1 @ head ──► head' ──► write f2 @ head' ─► ...
//!     (no I/O)              │                  │
//!                           │                  └─ inline commit in response? else re-resolve
//!                           └─ listing ▸ branch ref ▸ commit lookup (first capability wins)
//! ```
//!
//! The sequence is **not atomic**. A rejected write stops the loop and is
//! returned as-is; the writes before it stay on the branch. Two concurrent
//! `create` calls on the same branch race on the head and one of them is
//! rejected by the backend.

use tracing::{debug, instrument, warn};

use crate::driver::{status, ContentWriter, Driver, NativeCommitPointer, WriteFileParams};
use crate::errors::{ProviderError, ProviderResult};
use crate::identifiers::{BranchName, CommitSha};
use crate::repositories::Repository;
use crate::types::{CommitFile, CommitInfo};

// ---------------------------------------------------------------------------
// Commit views
// ---------------------------------------------------------------------------

/// The backend-native object behind a [`Commit`], tagged by shape.
///
/// Which shape a commit has depends on the capability that produced it: a
/// directory listing yields file entries, a branch lookup yields a reference,
/// and commit lookups and content writes yield commit objects.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitObject<E, R, C> {
    FileEntry(E),
    Reference(R),
    Commit(C),
}

/// [`CommitObject`] instantiated with a driver's native types.
pub type NativeCommit<D> =
    CommitObject<<D as Driver>::FileEntry, <D as Driver>::Reference, <D as Driver>::Commit>;

impl<E, R, C> CommitObject<E, R, C>
where
    E: NativeCommitPointer,
    R: NativeCommitPointer,
    C: NativeCommitPointer,
{
    fn commit_sha(&self) -> Option<&str> {
        match self {
            CommitObject::FileEntry(entry) => entry.commit_sha(),
            CommitObject::Reference(reference) => reference.commit_sha(),
            CommitObject::Commit(commit) => commit.commit_sha(),
        }
    }
}

/// A provider-neutral commit, anchored to the branch it was listed or
/// created on. Commits from different branches are never compared.
pub struct Commit<D: Driver> {
    branch: BranchName,
    sha: CommitSha,
    object: NativeCommit<D>,
}

impl<D: Driver> Commit<D> {
    fn from_object(branch: &BranchName, object: NativeCommit<D>) -> ProviderResult<Self> {
        let sha = object
            .commit_sha()
            .and_then(CommitSha::new)
            .ok_or_else(|| ProviderError::not_found(format!("commit sha on branch {branch}")))?;
        Ok(Self {
            branch: branch.clone(),
            sha,
            object,
        })
    }

    pub fn get(&self) -> CommitInfo {
        CommitInfo {
            sha: self.sha.clone(),
        }
    }

    pub fn sha(&self) -> &CommitSha {
        &self.sha
    }

    /// The branch this commit was observed on.
    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    /// The unmodified backend object.
    pub fn api_object(&self) -> &NativeCommit<D> {
        &self.object
    }
}

impl<D: Driver> Clone for Commit<D> {
    fn clone(&self) -> Self {
        Self {
            branch: self.branch.clone(),
            sha: self.sha.clone(),
            object: self.object.clone(),
        }
    }
}

impl<D: Driver> std::fmt::Debug for Commit<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commit")
            .field("branch", &self.branch)
            .field("sha", &self.sha)
            .field("object", &self.object)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Commit client
// ---------------------------------------------------------------------------

/// Commit operations scoped to one repository.
pub struct CommitClient<'r, D: Driver> {
    repository: &'r Repository<D>,
}

impl<'r, D: Driver> CommitClient<'r, D> {
    pub(crate) fn new(repository: &'r Repository<D>) -> Self {
        Self { repository }
    }

    /// Lists commit views for `branch`.
    ///
    /// With a directory-listing backend this yields one view per entry at the
    /// branch root; otherwise a single view of the branch head. Paging is
    /// applied locally: `page` is 1-based (`0` is read as `1`) and
    /// `per_page == 0` returns everything.
    #[instrument(skip_all, fields(repository = %self.repository.repository(), branch = %branch))]
    pub async fn list_page(
        &self,
        branch: &str,
        per_page: usize,
        page: usize,
    ) -> ProviderResult<Vec<Commit<D>>> {
        let branch = branch_name(branch)?;
        let driver = self.repository.driver();
        let native = self.repository.api_object();

        let commits = if let Some(listing) = driver.directory_listing() {
            listing
                .list_directory(native, "", branch.as_str())
                .await?
                .into_iter()
                .map(|entry| Commit::from_object(&branch, CommitObject::FileEntry(entry)))
                .collect::<ProviderResult<Vec<_>>>()?
        } else if driver.branch_refs().is_some() || driver.commit_lookup().is_some() {
            vec![self.resolve_head(&branch).await?]
        } else {
            return Err(ProviderError::unsupported("list commits"));
        };

        Ok(paginate(commits, per_page, page))
    }

    /// Applies `files` to `branch` as a sequence of single-file writes, each
    /// anchored on the head produced by the previous write.
    ///
    /// Every file is validated before the first request. An empty `files`
    /// returns the current head without writing. A write answered with
    /// anything but `201 Created` stops the sequence and is returned as
    /// [`ProviderError::Backend`]; earlier writes are not rolled back.
    #[instrument(skip_all, fields(repository = %self.repository.repository(), branch = %branch, files = files.len()))]
    pub async fn create(
        &self,
        branch: &str,
        message: &str,
        files: &[CommitFile],
    ) -> ProviderResult<Commit<D>> {
        let branch = branch_name(branch)?;
        let changes = files
            .iter()
            .enumerate()
            .map(|(index, file)| file.validated(index))
            .collect::<ProviderResult<Vec<_>>>()?;

        let writer = if changes.is_empty() {
            None
        } else {
            Some(
                self.repository
                    .driver()
                    .content_writer()
                    .ok_or_else(|| ProviderError::unsupported("write file content"))?,
            )
        };

        let mut head = self.resolve_head(&branch).await?;

        if let Some(writer) = writer {
            for (path, content) in changes {
                head = self
                    .write_one(writer, &branch, &head, message, path, content)
                    .await?;
            }
        }

        Ok(head)
    }

    async fn write_one(
        &self,
        writer: &dyn ContentWriter<D>,
        branch: &BranchName,
        head: &Commit<D>,
        message: &str,
        path: &str,
        content: &str,
    ) -> ProviderResult<Commit<D>> {
        let params = WriteFileParams {
            message: message.to_string(),
            data: content.as_bytes().to_vec(),
            branch: branch.to_string(),
            base_sha: head.sha().clone(),
        };

        let inline = writer
            .write_file(self.repository.api_object(), path, &params)
            .await?
            .require_status(status::CREATED)
            .inspect_err(|e| warn!(error = %e, path, "file write rejected"))?;

        let next = match inline.filter(|commit| commit.commit_sha().is_some()) {
            Some(commit) => Commit::from_object(branch, CommitObject::Commit(commit))?,
            None => self.resolve_head(branch).await?,
        };
        debug!(path, base = %head.sha(), head = %next.sha(), "file written");
        Ok(next)
    }

    /// Current head of `branch`, via the first capability the driver has:
    /// directory listing, branch reference lookup, commit lookup.
    async fn resolve_head(&self, branch: &BranchName) -> ProviderResult<Commit<D>> {
        let driver = self.repository.driver();
        let native = self.repository.api_object();

        if let Some(listing) = driver.directory_listing() {
            let entry = listing
                .first_entry(native, "", branch.as_str())
                .await?
                .ok_or_else(|| ProviderError::not_found(format!("head of branch {branch}")))?;
            return Commit::from_object(branch, CommitObject::FileEntry(entry));
        }

        if let Some(refs) = driver.branch_refs() {
            let reference = refs.find_branch(native, branch.as_str()).await?;
            return Commit::from_object(branch, CommitObject::Reference(reference));
        }

        if let Some(lookup) = driver.commit_lookup() {
            let commit = lookup.find_commit(native, branch.as_str()).await?;
            return Commit::from_object(branch, CommitObject::Commit(commit));
        }

        Err(ProviderError::unsupported("resolve branch head"))
    }
}

fn branch_name(branch: &str) -> ProviderResult<BranchName> {
    BranchName::new(branch.trim()).ok_or_else(|| ProviderError::Validation {
        message: "branch name must not be empty".to_string(),
    })
}

fn paginate<T>(items: Vec<T>, per_page: usize, page: usize) -> Vec<T> {
    if per_page == 0 {
        return items;
    }
    let skip = page.max(1).saturating_sub(1).saturating_mul(per_page);
    items.into_iter().skip(skip).take(per_page).collect()
}
