use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use git2::{
    BranchType, Cred, CredentialType, ErrorCode, FetchOptions, IndexAddOption, Oid, PushOptions,
    RemoteCallbacks, Repository as Git2Repo, ResetType, Signature, StatusOptions,
};

use crate::config::GitIdentity;
use crate::error::{GitStep, PublishError, Result};
use crate::git::SyncStatus;

/// Give up after this many credential callbacks for one operation
const MAX_CREDENTIAL_ATTEMPTS: usize = 4;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

/// Map a git2 error to a step-tagged error
fn at(step: GitStep) -> impl Fn(git2::Error) -> PublishError {
    move |e| PublishError::git(step, e.message().to_string())
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path).map_err(at(GitStep::Open))?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn workdir(&self, step: GitStep) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| PublishError::git(step, "repository has no working tree"))
    }

    fn current_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if !head.is_branch() {
            return None;
        }
        head.shorthand().map(str::to_string)
    }

    /// Point HEAD at a local branch and make index and working tree match it
    fn switch_to(&self, branch: &str, step: GitStep) -> Result<()> {
        self.repo
            .set_head(&format!("refs/heads/{}", branch))
            .map_err(at(step))?;
        self.reset_to_head(step)
    }

    fn reset_to_head(&self, step: GitStep) -> Result<()> {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(at(step))?;
        self.repo
            .reset(head.as_object(), ResetType::Hard, None)
            .map_err(at(step))
    }

    fn untracked_files(&self, workdir: &Path) -> Result<Vec<PathBuf>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut options))
            .map_err(at(GitStep::Clean))?;

        Ok(statuses
            .iter()
            .filter(|entry| entry.status().is_wt_new())
            .filter_map(|entry| entry.path().map(|p| workdir.join(p)))
            .collect())
    }
}

/// Remove the directories above `path` that became empty, stopping at `workdir`
fn remove_empty_parents(path: &Path, workdir: &Path) {
    for dir in path.ancestors().skip(1) {
        if dir == workdir || !dir.starts_with(workdir) {
            break;
        }
        // Fails on the first directory that still has entries
        if fs::remove_dir(dir).is_err() {
            break;
        }
    }
}

/// Callbacks providing credentials from SSH keys, the SSH agent, git credential
/// helpers, or libgit2 defaults.
fn remote_callbacks<'a>(
    config: Option<&'a git2::Config>,
    attempts: &'a Cell<usize>,
) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed_types| {
        attempts.set(attempts.get() + 1);
        if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }

        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                if attempts.get() == 1 {
                    return Ok(cred);
                }
            }

            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                let path = Path::new(&home).join(".ssh").join(key);
                if path.exists() {
                    if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                        return Ok(cred);
                    }
                }
            }
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Some(config) = config {
                if let Ok(cred) = Cred::credential_helper(config, url, username_from_url) {
                    return Ok(cred);
                }
            }
        }

        Cred::default()
    });
    callbacks
}

impl super::Repository for Git2Repository {
    fn ensure_clean_tree(&self, branch: &str) -> Result<()> {
        let workdir = self.workdir(GitStep::Clean)?;

        let has_local = self.repo.find_branch(branch, BranchType::Local).is_ok();
        if has_local && self.current_branch().as_deref() != Some(branch) {
            self.switch_to(branch, GitStep::Clean)?;
        } else {
            self.reset_to_head(GitStep::Clean)?;
        }

        for path in self.untracked_files(workdir)? {
            fs::remove_file(&path).map_err(|e| {
                PublishError::git(
                    GitStep::Clean,
                    format!("cannot remove {}: {}", path.display(), e),
                )
            })?;
            remove_empty_parents(&path, workdir);
        }

        Ok(())
    }

    fn sync_before_push(&self, remote: &str, branch: &str) -> Result<SyncStatus> {
        let mut remote_handle = self.repo.find_remote(remote).map_err(|e| {
            PublishError::git(
                GitStep::Sync,
                format!("cannot find remote '{}': {}", remote, e.message()),
            )
        })?;

        let config = self.repo.config().ok();
        let attempts = Cell::new(0);
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(config.as_ref(), &attempts));

        let refspec = format!("+refs/heads/{0}:refs/remotes/{1}/{0}", branch, remote);
        remote_handle
            .fetch(&[refspec.as_str()], Some(&mut fetch_options), None)
            .map_err(|e| {
                PublishError::git(
                    GitStep::Sync,
                    format!("fetch from '{}' failed: {}", remote, e.message()),
                )
            })?;

        let tracking = format!("refs/remotes/{}/{}", remote, branch);
        let remote_oid = match self.repo.refname_to_id(&tracking) {
            Ok(oid) => oid,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(SyncStatus::RemoteMissing),
            Err(e) => return Err(at(GitStep::Sync)(e)),
        };

        let local = match self.repo.find_branch(branch, BranchType::Local) {
            Ok(local) => local,
            Err(_) => {
                let commit = self
                    .repo
                    .find_commit(remote_oid)
                    .map_err(at(GitStep::Sync))?;
                self.repo
                    .branch(branch, &commit, false)
                    .map_err(at(GitStep::Sync))?;
                self.switch_to(branch, GitStep::Sync)?;
                return Ok(SyncStatus::Created);
            }
        };

        let local_oid: Oid = local.get().target().ok_or_else(|| {
            PublishError::git(
                GitStep::Sync,
                format!("branch '{}' is not a direct reference", branch),
            )
        })?;

        if local_oid == remote_oid {
            return Ok(SyncStatus::UpToDate);
        }

        let remote_ahead = self
            .repo
            .graph_descendant_of(remote_oid, local_oid)
            .map_err(at(GitStep::Sync))?;
        if remote_ahead {
            let target = self
                .repo
                .find_commit(remote_oid)
                .map_err(at(GitStep::Sync))?;
            if self.current_branch().as_deref() == Some(branch) {
                // Moves the branch ref along with index and working tree
                self.repo
                    .reset(target.as_object(), ResetType::Hard, None)
                    .map_err(at(GitStep::Sync))?;
            } else {
                local
                    .into_reference()
                    .set_target(remote_oid, &format!("fast-forward from {}", tracking))
                    .map_err(at(GitStep::Sync))?;
            }
            return Ok(SyncStatus::FastForwarded);
        }

        let local_ahead = self
            .repo
            .graph_descendant_of(local_oid, remote_oid)
            .map_err(at(GitStep::Sync))?;
        if local_ahead {
            return Ok(SyncStatus::LocalAhead);
        }

        Err(PublishError::git(
            GitStep::Sync,
            format!("branch '{}' has diverged from '{}/{}'", branch, remote, branch),
        ))
    }

    fn stage_all(&self) -> Result<()> {
        let mut index = self.repo.index().map_err(at(GitStep::Stage))?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(at(GitStep::Stage))?;
        index
            .update_all(["*"].iter(), None)
            .map_err(at(GitStep::Stage))?;
        index.write().map_err(at(GitStep::Stage))
    }

    fn commit(&self, message: &str, identity: Option<&GitIdentity>) -> Result<String> {
        let mut index = self.repo.index().map_err(at(GitStep::Commit))?;
        let tree_id = index.write_tree().map_err(at(GitStep::Commit))?;
        let tree = self.repo.find_tree(tree_id).map_err(at(GitStep::Commit))?;

        let signature = match identity {
            Some(id) => Signature::now(&id.name, &id.email),
            None => self.repo.signature(),
        }
        .map_err(at(GitStep::Commit))?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(at(GitStep::Commit))?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                None
            }
            Err(e) => return Err(at(GitStep::Commit)(e)),
        };

        if let Some(parent) = &parent {
            if parent.tree_id() == tree_id {
                return Err(PublishError::git(GitStep::Commit, "nothing to commit"));
            }
        }

        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = self
            .repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &parents,
            )
            .map_err(at(GitStep::Commit))?;

        Ok(oid.to_string())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(at(GitStep::Tag))?;

        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .map_err(|e| {
                PublishError::git(
                    GitStep::Tag,
                    format!("cannot create tag '{}': {}", name, e.message()),
                )
            })?;

        Ok(())
    }

    fn push(&self, remote: &str, branch: &str, tag: &str) -> Result<()> {
        let mut remote_handle = self.repo.find_remote(remote).map_err(|e| {
            PublishError::push(
                remote,
                branch,
                format!("cannot find remote: {}", e.message()),
            )
        })?;

        let config = self.repo.config().ok();
        let attempts = Cell::new(0);
        let rejected = RefCell::new(Vec::new());

        let mut callbacks = remote_callbacks(config.as_ref(), &attempts);
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                rejected
                    .borrow_mut()
                    .push(format!("{} rejected: {}", refname, status));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspecs = [
            format!("refs/heads/{0}:refs/heads/{0}", branch),
            format!("refs/tags/{0}:refs/tags/{0}", tag),
        ];

        let pushed = remote_handle.push(&refspecs, Some(&mut push_options));
        drop(push_options);

        if let Err(e) = pushed {
            let kind = match e.class() {
                git2::ErrorClass::Net => "network error",
                git2::ErrorClass::Reference => "reference error",
                _ => "push failed",
            };
            return Err(PublishError::push(
                remote,
                branch,
                format!("{}: {}", kind, e.message()),
            ));
        }

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(PublishError::push(remote, branch, rejected.join("; ")));
        }

        Ok(())
    }

    fn set_upstream(&self, remote: &str, branch: &str) -> Result<()> {
        let mut local = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(at(GitStep::Upstream))?;

        if local.upstream().is_ok() {
            return Ok(());
        }

        local
            .set_upstream(Some(&format!("{}/{}", remote, branch)))
            .map_err(at(GitStep::Upstream))
    }
}
