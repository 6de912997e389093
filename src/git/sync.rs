use crate::boundary::BoundaryWarning;
use crate::config::GitIdentity;
use crate::domain::{Branch, PackageDescriptor, ReleaseTemplate};
use crate::error::{PublishError, Result};
use crate::git::Repository;

/// Everything needed to record a published version in git
#[derive(Debug, Clone)]
pub struct RecordRequest<'a> {
    pub remote: &'a str,
    pub branch: &'a Branch,
    pub package: &'a PackageDescriptor,
    pub commit_template: &'a ReleaseTemplate,
    pub tag_template: &'a ReleaseTemplate,
    pub identity: Option<&'a GitIdentity>,
}

/// What [commit_and_tag] left in the repository
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRelease {
    pub commit: String,
    pub tag: String,
    pub warnings: Vec<BoundaryWarning>,
}

/// Stage, commit, tag and push the release.
///
/// Stops at the first failing step. A push failure is returned as
/// [PublishError::Push]; commit and tag then exist locally. A missing upstream
/// after a successful push is only a warning.
pub fn commit_and_tag<R: Repository + ?Sized>(
    repo: &R,
    request: &RecordRequest<'_>,
) -> Result<RecordedRelease> {
    let message = request.commit_template.render(request.package);
    let tag = request.tag_template.render(request.package);
    let branch = request.branch.name();

    repo.stage_all()?;
    let commit = repo.commit(&message, request.identity)?;
    repo.create_tag(&tag)?;
    repo.push(request.remote, branch, &tag)?;

    let mut warnings = Vec::new();
    if let Err(e) = repo.set_upstream(request.remote, branch) {
        let reason = match e {
            PublishError::Git { message, .. } => message,
            other => other.to_string(),
        };
        warnings.push(BoundaryWarning::UpstreamNotSet {
            branch: branch.to_string(),
            reason,
        });
    }

    Ok(RecordedRelease {
        commit,
        tag,
        warnings,
    })
}
