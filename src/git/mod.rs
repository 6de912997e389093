//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the repository mutations a
//! release needs, so the orchestrator can run against a real repository or a
//! recording mock.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete implementations
//! include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation that records calls for tests
//!
//! [sync::commit_and_tag] composes the trait operations into the
//! stage, commit, tag, push sequence that records a published version.
//!
//! # Usage
//!
//! ```rust
//! # use npm_publish::git::{Repository, SyncStatus};
//! # fn example<R: Repository>(repo: &R) -> npm_publish::Result<()> {
//! repo.ensure_clean_tree("main")?;
//! if repo.sync_before_push("origin", "main")? == SyncStatus::FastForwarded {
//!     println!("pulled new commits");
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;
pub mod sync;

pub use mock::{MockCall, MockRepository};
pub use repository::Git2Repository;
pub use sync::{commit_and_tag, RecordRequest, RecordedRelease};

use crate::config::GitIdentity;
use crate::error::Result;

/// Result of reconciling the local branch with its remote counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Local and remote point at the same commit
    UpToDate,
    /// Local branch was behind and has been fast-forwarded
    FastForwarded,
    /// Local branch did not exist and was created from the remote
    Created,
    /// Local branch has commits the remote doesn't have yet
    LocalAhead,
    /// The branch does not exist on the remote
    RemoteMissing,
}

/// Repository operations used by a release run
///
/// ## Error Handling
///
/// Methods return [crate::error::Result<T>]. Failures are reported as
/// [crate::error::PublishError::Git] naming the failed step, except
/// [Repository::push] which reports [crate::error::PublishError::Push] since a
/// rejected push after a local commit needs different remediation.
///
/// No method writes global git configuration.
pub trait Repository {
    /// Discard uncommitted and untracked changes
    ///
    /// Switches to `branch` first when it exists locally. Ignored files are kept.
    /// Calling this on a clean tree is a no-op.
    fn ensure_clean_tree(&self, branch: &str) -> Result<()>;

    /// Fetch `branch` from `remote` and fast-forward the local branch to it
    ///
    /// Best effort: reduces, but doesn't prevent, push conflicts between
    /// concurrent runs. A diverged history is an error.
    fn sync_before_push(&self, remote: &str, branch: &str) -> Result<SyncStatus>;

    /// Stage every change in the working tree, including deletions
    fn stage_all(&self) -> Result<()>;

    /// Commit the index on top of HEAD
    ///
    /// When `identity` is given it authors this commit only; otherwise the
    /// repository's configured identity is used. Returns the commit hash.
    fn commit(&self, message: &str, identity: Option<&GitIdentity>) -> Result<String>;

    /// Create a lightweight tag at HEAD
    fn create_tag(&self, name: &str) -> Result<()>;

    /// Push `branch` and `tag` to `remote`
    fn push(&self, remote: &str, branch: &str, tag: &str) -> Result<()>;

    /// Make `remote/branch` the upstream of `branch` if it has none
    fn set_upstream(&self, remote: &str, branch: &str) -> Result<()>;
}
