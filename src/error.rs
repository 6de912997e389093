use std::fmt;

use thiserror::Error;

/// Repository step that failed, so the report says what to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitStep {
    Open,
    Clean,
    Sync,
    Stage,
    Commit,
    Tag,
    Upstream,
}

impl fmt::Display for GitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GitStep::Open => "open",
            GitStep::Clean => "clean",
            GitStep::Sync => "sync",
            GitStep::Stage => "stage",
            GitStep::Commit => "commit",
            GitStep::Tag => "tag",
            GitStep::Upstream => "upstream",
        };
        f.write_str(name)
    }
}

/// Why the registry refused an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFailure {
    Auth,
    DuplicateVersion,
    Network,
    MissingClient,
    Other,
}

impl fmt::Display for RegistryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistryFailure::Auth => "authentication",
            RegistryFailure::DuplicateVersion => "duplicate version",
            RegistryFailure::Network => "network",
            RegistryFailure::MissingClient => "missing client",
            RegistryFailure::Other => "rejected",
        };
        f.write_str(name)
    }
}

/// Unified error type for npm-publish runs
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Registry publish failed ({kind}): {message}")]
    Registry {
        kind: RegistryFailure,
        message: String,
    },

    #[error("Git {step} failed: {message}")]
    Git { step: GitStep, message: String },

    #[error("Push of '{branch}' to '{remote}' failed: {message}")]
    Push {
        remote: String,
        branch: String,
        message: String,
    },

    #[error("Version {version} was published but not recorded in git: {source}")]
    PublishedNotRecorded {
        version: String,
        #[source]
        source: Box<PublishError>,
    },
}

/// Convenience type alias for Results in npm-publish
pub type Result<T> = std::result::Result<T, PublishError>;

impl PublishError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        PublishError::Config(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        PublishError::Manifest(msg.into())
    }

    /// Create a registry error of the given kind
    pub fn registry(kind: RegistryFailure, msg: impl Into<String>) -> Self {
        PublishError::Registry {
            kind,
            message: msg.into(),
        }
    }

    /// Create a git error for a given step
    pub fn git(step: GitStep, msg: impl Into<String>) -> Self {
        PublishError::Git {
            step,
            message: msg.into(),
        }
    }

    /// Create a push error for a remote branch
    pub fn push(remote: impl Into<String>, branch: impl Into<String>, msg: impl Into<String>) -> Self {
        PublishError::Push {
            remote: remote.into(),
            branch: branch.into(),
            message: msg.into(),
        }
    }

    /// Mark an error raised after the registry accepted `version`
    pub fn published_not_recorded(version: impl Into<String>, source: PublishError) -> Self {
        PublishError::PublishedNotRecorded {
            version: version.into(),
            source: Box::new(source),
        }
    }

    /// Hint shown next to the error message
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            PublishError::Push { .. } => {
                Some("the release commit and tag exist locally; pull and push them again")
            }
            PublishError::Git {
                step: GitStep::Commit | GitStep::Stage | GitStep::Tag,
                ..
            } => Some("fix the local repository state, then commit and tag the bumped version"),
            PublishError::PublishedNotRecorded { source, .. } => source.remediation(),
            PublishError::Registry {
                kind: RegistryFailure::DuplicateVersion,
                ..
            } => Some("the version already exists in the registry; bump again and republish"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PublishError::config("missing --message");
        assert_eq!(err.to_string(), "Configuration error: missing --message");
    }

    #[test]
    fn test_registry_error_names_kind() {
        let err = PublishError::registry(RegistryFailure::Auth, "E401");
        assert_eq!(
            err.to_string(),
            "Registry publish failed (authentication): E401"
        );
    }

    #[test]
    fn test_git_error_names_step() {
        let err = PublishError::git(GitStep::Commit, "nothing to commit");
        assert_eq!(err.to_string(), "Git commit failed: nothing to commit");
    }

    #[test]
    fn test_push_error_is_distinct_from_commit_error() {
        let push = PublishError::push("origin", "master", "non-fast-forward");
        let commit = PublishError::git(GitStep::Commit, "index locked");
        assert_ne!(push.remediation(), commit.remediation());
        assert!(push.to_string().contains("origin"));
        assert!(push.to_string().contains("master"));
    }

    #[test]
    fn test_published_not_recorded_keeps_cause() {
        let cause = PublishError::push("origin", "main", "rejected");
        let err = PublishError::published_not_recorded("1.2.4", cause);
        let msg = err.to_string();
        assert!(msg.contains("1.2.4"));
        assert!(msg.contains("rejected"));
        assert!(err.remediation().unwrap().contains("push"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (PublishError::config("x"), "Configuration error"),
            (PublishError::manifest("x"), "Manifest error"),
            (
                PublishError::registry(RegistryFailure::Other, "x"),
                "Registry publish failed",
            ),
            (PublishError::git(GitStep::Tag, "x"), "Git tag failed"),
            (PublishError::push("o", "b", "x"), "Push of"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
