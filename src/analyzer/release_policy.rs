use std::fmt;

use crate::config::RunConfig;
use crate::domain::{
    beta_identifier, contains_marker, Branch, Increment, PackageDescriptor, SuffixSource,
    VersionChange,
};

/// Whether a run may publish.
///
/// Proceeds when the branch is a publish branch or the run is a beta, and the
/// no-publish marker is absent. The no-publish marker wins over everything.
pub fn decide_publish(
    publish_branches: &[String],
    branch: &Branch,
    message: &str,
    no_publish_marker: &str,
    is_beta: bool,
) -> bool {
    let eligible = branch.is_listed_in(publish_branches) || is_beta;
    eligible && !contains_marker(message, no_publish_marker)
}

/// A beta run publishes a pre-release under the beta dist-tag
pub fn classify_beta(message: &str, beta_marker: &str) -> bool {
    contains_marker(message, beta_marker)
}

/// Increment requested by the message. Minor is checked before major, so a message
/// carrying both markers yields `Minor`; no marker yields `Patch`.
pub fn compute_increment(message: &str, minor_marker: &str, major_marker: &str) -> Increment {
    if contains_marker(message, minor_marker) {
        Increment::Minor
    } else if contains_marker(message, major_marker) {
        Increment::Major
    } else {
        Increment::Patch
    }
}

/// Why a run was skipped. A skip is a successful exit, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotPublishBranch { branch: String },
    NoPublishMarker { marker: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotPublishBranch { branch } => {
                write!(f, "branch '{}' is not a publish branch", branch)
            }
            SkipReason::NoPublishMarker { marker } => write!(f, "{} present", marker),
        }
    }
}

/// Decision taken once per run and shared by the create and publish phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishDecision {
    pub should_proceed: bool,
    pub is_beta: bool,
    pub change: VersionChange,
    pub skip_reason: Option<SkipReason>,
}

impl PublishDecision {
    /// Evaluate the release policy for a run.
    ///
    /// `package` is the manifest state before any bump; it seeds the beta identifier.
    pub fn evaluate(
        config: &RunConfig,
        package: &PackageDescriptor,
        suffix: &dyn SuffixSource,
    ) -> Self {
        let message = config.message_line();
        let branch = config.branch();
        let markers = &config.markers;

        let is_beta = classify_beta(message, &markers.beta);
        let should_proceed = decide_publish(
            &config.publish_branches,
            &branch,
            message,
            &markers.no_publish,
            is_beta,
        );

        let skip_reason = if should_proceed {
            None
        } else if contains_marker(message, &markers.no_publish) {
            Some(SkipReason::NoPublishMarker {
                marker: markers.no_publish.clone(),
            })
        } else {
            Some(SkipReason::NotPublishBranch {
                branch: branch.name().to_string(),
            })
        };

        let change = if is_beta {
            VersionChange::Explicit(beta_identifier(&package.version, suffix))
        } else {
            VersionChange::Increment(compute_increment(message, &markers.minor, &markers.major))
        };

        PublishDecision {
            should_proceed,
            is_beta,
            change,
            skip_reason,
        }
    }
}
