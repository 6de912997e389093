use std::fmt;

/// Non-fatal conditions met while preparing or recording a release.
/// These are reported to the user but never change the exit code.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// Only one of git name / email was given, so the default identity is used
    PartialGitIdentity { missing: String },
    /// A marker was configured as an empty string and will never match
    EmptyMarker { marker: String },
    /// The branch does not exist on the remote yet; the push will create it
    RemoteBranchMissing { remote: String, branch: String },
    /// Push succeeded but the upstream tracking branch could not be recorded
    UpstreamNotSet { branch: String, reason: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::PartialGitIdentity { missing } => {
                write!(
                    f,
                    "Git identity ignored: '{}' not provided, using repository defaults",
                    missing
                )
            }
            BoundaryWarning::EmptyMarker { marker } => {
                write!(f, "Marker '{}' is empty and will never match", marker)
            }
            BoundaryWarning::RemoteBranchMissing { remote, branch } => {
                write!(
                    f,
                    "Branch '{}' not found on remote '{}'; it will be created on push",
                    branch, remote
                )
            }
            BoundaryWarning::UpstreamNotSet { branch, reason } => {
                write!(
                    f,
                    "Could not set upstream for branch '{}': {}",
                    branch, reason
                )
            }
        }
    }
}
