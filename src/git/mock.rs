use std::sync::Mutex;

use crate::config::GitIdentity;
use crate::error::{GitStep, PublishError, Result};
use crate::git::{Repository, SyncStatus};

/// Operation recorded by [MockRepository]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    EnsureClean { branch: String },
    Sync { remote: String, branch: String },
    StageAll,
    Commit { message: String, author: Option<String> },
    Tag { name: String },
    Push { remote: String, branch: String, tag: String },
    SetUpstream { remote: String, branch: String },
}

/// Mock repository for testing without actual git operations
///
/// Successful calls are recorded in order; a call configured to fail is not.
pub struct MockRepository {
    calls: Mutex<Vec<MockCall>>,
    failure: Option<(GitStep, String)>,
    push_failure: Option<String>,
    sync_status: SyncStatus,
}

impl MockRepository {
    /// Create a mock where every operation succeeds
    pub fn new() -> Self {
        MockRepository {
            calls: Mutex::new(Vec::new()),
            failure: None,
            push_failure: None,
            sync_status: SyncStatus::UpToDate,
        }
    }

    /// Fail the operation belonging to `step`
    pub fn failing_at(mut self, step: GitStep, message: impl Into<String>) -> Self {
        self.failure = Some((step, message.into()));
        self
    }

    /// Reject pushes, as a remote does when another run pushed first
    pub fn failing_push(mut self, message: impl Into<String>) -> Self {
        self.push_failure = Some(message.into());
        self
    }

    /// Status reported by `sync_before_push`
    pub fn with_sync_status(mut self, status: SyncStatus) -> Self {
        self.sync_status = status;
        self
    }

    /// Calls recorded so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn check(&self, step: GitStep) -> Result<()> {
        match &self.failure {
            Some((failing, message)) if *failing == step => {
                Err(PublishError::git(step, message.clone()))
            }
            _ => Ok(()),
        }
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn ensure_clean_tree(&self, branch: &str) -> Result<()> {
        self.check(GitStep::Clean)?;
        self.record(MockCall::EnsureClean {
            branch: branch.to_string(),
        });
        Ok(())
    }

    fn sync_before_push(&self, remote: &str, branch: &str) -> Result<SyncStatus> {
        self.check(GitStep::Sync)?;
        self.record(MockCall::Sync {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(self.sync_status)
    }

    fn stage_all(&self) -> Result<()> {
        self.check(GitStep::Stage)?;
        self.record(MockCall::StageAll);
        Ok(())
    }

    fn commit(&self, message: &str, identity: Option<&GitIdentity>) -> Result<String> {
        self.check(GitStep::Commit)?;
        self.record(MockCall::Commit {
            message: message.to_string(),
            author: identity.map(|id| format!("{} <{}>", id.name, id.email)),
        });
        Ok("0000000000000000000000000000000000000000".to_string())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        self.check(GitStep::Tag)?;
        self.record(MockCall::Tag {
            name: name.to_string(),
        });
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str, tag: &str) -> Result<()> {
        if let Some(message) = &self.push_failure {
            return Err(PublishError::push(remote, branch, message.clone()));
        }
        self.record(MockCall::Push {
            remote: remote.to_string(),
            branch: branch.to_string(),
            tag: tag.to_string(),
        });
        Ok(())
    }

    fn set_upstream(&self, remote: &str, branch: &str) -> Result<()> {
        self.check(GitStep::Upstream)?;
        self.record(MockCall::SetUpstream {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_records_in_order() {
        let repo = MockRepository::new();
        repo.ensure_clean_tree("main").unwrap();
        repo.create_tag("v1.0.0").unwrap();

        assert_eq!(
            repo.calls(),
            vec![
                MockCall::EnsureClean {
                    branch: "main".to_string()
                },
                MockCall::Tag {
                    name: "v1.0.0".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_mock_repository_failure_not_recorded() {
        let repo = MockRepository::new().failing_at(GitStep::Clean, "locked");
        assert!(repo.ensure_clean_tree("main").is_err());
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_mock_repository_sync_status() {
        let repo = MockRepository::new().with_sync_status(SyncStatus::FastForwarded);
        assert_eq!(
            repo.sync_before_push("origin", "main").unwrap(),
            SyncStatus::FastForwarded
        );
    }

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert!(repo.calls().is_empty());
    }
}
