// tests/git_test.rs
//
// Runs the git layer against real repositories: a bare remote in a temp dir
// and one or more clones of it.
use git2::build::RepoBuilder;
use git2::{ConfigLevel, Repository as Git2Repo, RepositoryInitOptions, Signature};
use npm_publish::config::GitIdentity;
use npm_publish::error::GitStep;
use npm_publish::git::{Git2Repository, Repository, SyncStatus};
use npm_publish::PublishError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MANIFEST: &str = "{\n  \"name\": \"widget\",\n  \"version\": \"1.0.0\"\n}\n";

fn identity() -> GitIdentity {
    GitIdentity {
        name: "Release Bot".to_string(),
        email: "bot@example.com".to_string(),
    }
}

/// Bare remote with `master` holding one commit that adds package.json
fn seed_remote(root: &Path) -> PathBuf {
    let remote = root.join("remote.git");
    let mut bare_opts = RepositoryInitOptions::new();
    bare_opts.bare(true).initial_head("master");
    Git2Repo::init_opts(&remote, &bare_opts).unwrap();

    let seed = root.join("seed");
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("master");
    let repo = Git2Repo::init_opts(&seed, &opts).unwrap();
    fs::write(seed.join("package.json"), MANIFEST).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("package.json")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = Signature::now("Seed", "seed@example.com").unwrap();
    repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
        .unwrap();

    let mut origin = repo.remote("origin", remote.to_str().unwrap()).unwrap();
    origin
        .push(&["refs/heads/master:refs/heads/master"], None)
        .unwrap();

    remote
}

fn clone(remote: &Path, dest: &Path) -> Git2Repository {
    let repo = RepoBuilder::new()
        .branch("master")
        .clone(remote.to_str().unwrap(), dest)
        .unwrap();
    Git2Repository::from_git2(repo)
}

fn set_version(dir: &Path, version: &str) {
    fs::write(
        dir.join("package.json"),
        MANIFEST.replace("1.0.0", version),
    )
    .unwrap();
}

/// Commit a version change and push it with its tag
fn release(repo: &Git2Repository, dir: &Path, version: &str) -> Result<String, PublishError> {
    set_version(dir, version);
    repo.stage_all()?;
    let commit = repo.commit(&format!("chore(release): widget@{}", version), Some(&identity()))?;
    let tag = format!("v{}", version);
    repo.create_tag(&tag)?;
    repo.push("origin", "master", &tag)?;
    Ok(commit)
}

fn head_of(path: &Path, refname: &str) -> String {
    Git2Repo::open(path)
        .unwrap()
        .refname_to_id(refname)
        .unwrap()
        .to_string()
}

#[test]
fn test_commit_tag_and_push() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let work = root.path().join("work");
    let repo = clone(&remote, &work);

    let commit = release(&repo, &work, "1.0.1").unwrap();
    repo.set_upstream("origin", "master").unwrap();

    assert_eq!(head_of(&remote, "refs/heads/master"), commit);
    assert_eq!(head_of(&remote, "refs/tags/v1.0.1"), commit);

    let raw = Git2Repo::open(&remote).unwrap();
    let pushed = raw
        .find_commit(git2::Oid::from_str(&commit).unwrap())
        .unwrap();
    assert_eq!(pushed.author().name(), Some("Release Bot"));
    assert_eq!(pushed.author().email(), Some("bot@example.com"));
    assert_eq!(pushed.message(), Some("chore(release): widget@1.0.1"));
}

#[test]
fn test_identity_is_not_written_to_config() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let work = root.path().join("work");
    let repo = clone(&remote, &work);

    release(&repo, &work, "1.0.1").unwrap();

    let config = Git2Repo::open(&work).unwrap().config().unwrap();
    let local = config.open_level(ConfigLevel::Local).unwrap();
    assert!(local.get_string("user.name").is_err());
    assert!(local.get_string("user.email").is_err());
}

#[test]
fn test_commit_without_changes_fails() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let work = root.path().join("work");
    let repo = clone(&remote, &work);

    repo.stage_all().unwrap();
    let err = repo.commit("empty", Some(&identity())).unwrap_err();
    assert!(matches!(
        err,
        PublishError::Git {
            step: GitStep::Commit,
            ..
        }
    ));
}

#[test]
fn test_existing_tag_fails() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let work = root.path().join("work");
    let repo = clone(&remote, &work);

    repo.create_tag("v1.0.0").unwrap();
    let err = repo.create_tag("v1.0.0").unwrap_err();
    assert!(matches!(
        err,
        PublishError::Git {
            step: GitStep::Tag,
            ..
        }
    ));
}

#[test]
fn test_ensure_clean_tree_discards_changes() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let work = root.path().join("work");
    let repo = clone(&remote, &work);

    set_version(&work, "9.9.9");
    fs::write(work.join("scratch.txt"), "left over").unwrap();
    fs::create_dir_all(work.join("build")).unwrap();
    fs::write(work.join("build").join("out.js"), "generated").unwrap();

    repo.ensure_clean_tree("master").unwrap();

    assert_eq!(
        fs::read_to_string(work.join("package.json")).unwrap(),
        MANIFEST
    );
    assert!(!work.join("scratch.txt").exists());
    assert!(!work.join("build").exists());
    assert!(work.join(".git").exists());
}

#[test]
fn test_sync_up_to_date() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let repo = clone(&remote, &root.path().join("work"));

    assert_eq!(
        repo.sync_before_push("origin", "master").unwrap(),
        SyncStatus::UpToDate
    );
}

#[test]
fn test_sync_fast_forwards_behind_branch() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let first_dir = root.path().join("first");
    let second_dir = root.path().join("second");
    let first = clone(&remote, &first_dir);
    let second = clone(&remote, &second_dir);

    let pushed = release(&second, &second_dir, "1.0.1").unwrap();

    assert_eq!(
        first.sync_before_push("origin", "master").unwrap(),
        SyncStatus::FastForwarded
    );
    assert_eq!(head_of(&first_dir, "HEAD"), pushed);
    assert_eq!(
        fs::read_to_string(first_dir.join("package.json")).unwrap(),
        MANIFEST.replace("1.0.0", "1.0.1")
    );
}

#[test]
fn test_sync_local_ahead() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let work = root.path().join("work");
    let repo = clone(&remote, &work);

    set_version(&work, "1.0.1");
    repo.stage_all().unwrap();
    repo.commit("local only", Some(&identity())).unwrap();

    assert_eq!(
        repo.sync_before_push("origin", "master").unwrap(),
        SyncStatus::LocalAhead
    );
}

#[test]
fn test_sync_diverged_is_error() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let first_dir = root.path().join("first");
    let second_dir = root.path().join("second");
    let first = clone(&remote, &first_dir);
    let second = clone(&remote, &second_dir);

    release(&second, &second_dir, "1.0.1").unwrap();

    set_version(&first_dir, "2.0.0");
    first.stage_all().unwrap();
    first.commit("diverging", Some(&identity())).unwrap();

    let err = first.sync_before_push("origin", "master").unwrap_err();
    assert!(matches!(
        err,
        PublishError::Git {
            step: GitStep::Sync,
            ..
        }
    ));
}

#[test]
fn test_sync_missing_remote_branch() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let repo = clone(&remote, &root.path().join("work"));

    assert_eq!(
        repo.sync_before_push("origin", "master-v2").unwrap(),
        SyncStatus::RemoteMissing
    );
}

#[test]
fn test_sync_unknown_remote_is_error() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let repo = clone(&remote, &root.path().join("work"));

    let err = repo.sync_before_push("upstream", "master").unwrap_err();
    assert!(matches!(
        err,
        PublishError::Git {
            step: GitStep::Sync,
            ..
        }
    ));
}

#[test]
fn test_concurrent_push_is_rejected() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let first_dir = root.path().join("first");
    let second_dir = root.path().join("second");
    let first = clone(&remote, &first_dir);
    let second = clone(&remote, &second_dir);

    let winner = release(&second, &second_dir, "1.0.1").unwrap();

    // The first run committed against the old tip and lost the race
    let err = release(&first, &first_dir, "1.0.2").unwrap_err();
    match err {
        PublishError::Push { remote, branch, .. } => {
            assert_eq!(remote, "origin");
            assert_eq!(branch, "master");
        }
        other => panic!("expected push error, got {:?}", other),
    }
    assert_eq!(head_of(&remote, "refs/heads/master"), winner);
}

#[test]
fn test_set_upstream_for_new_branch() {
    let root = TempDir::new().unwrap();
    let remote = seed_remote(root.path());
    let work = root.path().join("work");
    let repo = clone(&remote, &work);

    {
        let raw = Git2Repo::open(&work).unwrap();
        let head = raw.head().unwrap().peel_to_commit().unwrap();
        raw.branch("master-v2", &head, false).unwrap();
    }
    repo.create_tag("v1.0.0").unwrap();
    repo.push("origin", "master-v2", "v1.0.0").unwrap();
    repo.set_upstream("origin", "master-v2").unwrap();

    let raw = Git2Repo::open(&work).unwrap();
    let branch = raw
        .find_branch("master-v2", git2::BranchType::Local)
        .unwrap();
    let upstream = branch.upstream().unwrap();
    assert_eq!(upstream.name().unwrap(), Some("origin/master-v2"));
}
