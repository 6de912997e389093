//! Release workflow orchestration
//!
//! A run moves through `Decide → {Skip | Proceed}`; on proceed the create phase
//! (clean, sync, bump) and the publish phase (publish, then commit/tag/push for
//! non-beta runs) execute as selected by [RunMode](crate::config::RunMode).
//!
//! Deciding never mutates anything. Once the registry accepted an upload, any
//! later git failure is wrapped in
//! [PublishError::PublishedNotRecorded] so the divergence shows in the report.

use crate::analyzer::{PublishDecision, SkipReason};
use crate::boundary::BoundaryWarning;
use crate::config::RunConfig;
use crate::domain::{PackageDescriptor, ReleaseTemplate, SuffixSource};
use crate::error::{PublishError, Result};
use crate::git::{commit_and_tag, RecordRequest, RecordedRelease, Repository, SyncStatus};
use crate::manifest::Manifest;
use crate::registry::{PublishRequest, Registry};
use crate::ui;

/// Manifest state and decision, computed before anything is mutated
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasePlan {
    pub manifest: Manifest,
    pub before: PackageDescriptor,
    pub decision: PublishDecision,
}

/// Result of a run that went through its phases
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseReport {
    pub package: String,
    pub version: String,
    pub is_beta: bool,
    pub version_created: bool,
    pub published: bool,
    pub recorded: Option<RecordedRelease>,
    /// Warnings raised before the publish phase
    pub warnings: Vec<BoundaryWarning>,
}

/// How a run ended without error. Both variants exit with code 0.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Skipped(SkipReason),
    Completed(ReleaseReport),
}

/// Read the manifest and decide whether and how to release.
pub fn plan_release(config: &RunConfig, suffix: &dyn SuffixSource) -> Result<ReleasePlan> {
    let manifest = Manifest::discover(&config.package_dir)?;
    let before = manifest.read()?;
    let decision = PublishDecision::evaluate(config, &before, suffix);

    Ok(ReleasePlan {
        manifest,
        before,
        decision,
    })
}

/// Run the phases selected by the config for a plan that proceeds.
pub fn execute_release<R, P>(
    config: &RunConfig,
    plan: &ReleasePlan,
    repo: &R,
    registry: &P,
) -> Result<ReleaseReport>
where
    R: Repository + ?Sized,
    P: Registry + ?Sized,
{
    let branch = config.branch();
    let decision = &plan.decision;
    let mut warnings = Vec::new();

    let mut version_created = false;
    if config.mode.creates_version() {
        ui::display_status(&format!("Cleaning working tree on '{}'", branch));
        repo.ensure_clean_tree(branch.name())?;

        match repo.sync_before_push(&config.remote, branch.name())? {
            // Beta runs never push, so there is nothing to create on the remote
            SyncStatus::RemoteMissing if !decision.is_beta => {
                let warning = BoundaryWarning::RemoteBranchMissing {
                    remote: config.remote.clone(),
                    branch: branch.name().to_string(),
                };
                ui::display_boundary_warning(&warning);
                warnings.push(warning);
            }
            SyncStatus::FastForwarded => ui::display_status(&format!(
                "Fast-forwarded '{}' to {}/{}",
                branch, config.remote, branch
            )),
            _ => {}
        }

        ui::display_status(&format!(
            "Creating new version with param: [{}]",
            decision.change
        ));
        let bumped = plan.manifest.bump(&decision.change)?;
        ui::display_success(&format!(
            "{} set to {} in {}",
            bumped.name,
            bumped.version,
            plan.manifest.path().display()
        ));
        version_created = true;
    }

    // The bump rewrote the manifest, so the descriptor is read again. In publish-only
    // mode this is the version an earlier run wrote.
    let current = plan.manifest.read()?;
    let mut report = ReleaseReport {
        package: current.name.clone(),
        version: current.version.to_string(),
        is_beta: decision.is_beta,
        version_created,
        published: false,
        recorded: None,
        warnings,
    };

    if decision.is_beta {
        ui::display_beta_notice(&report.package, &report.version);
    }

    if !config.mode.publishes() {
        return Ok(report);
    }

    ui::display_status(&format!(
        "Publishing {}@{}{}",
        current.name,
        current.version,
        if decision.is_beta { " with --tag beta" } else { "" }
    ));
    registry.publish(&PublishRequest::new(
        plan.manifest.dir(),
        decision.is_beta,
        config.registry_url.as_deref(),
    ))?;
    report.published = true;
    ui::display_success(&format!("Published {}@{}", current.name, current.version));

    if decision.is_beta {
        return Ok(report);
    }

    ui::display_status(&format!("Pushing changes to {}/{}", config.remote, branch));
    let commit_template = ReleaseTemplate::new(config.commit_message_template.as_str());
    let tag_template = ReleaseTemplate::new(config.tag_template.as_str());
    let recorded = commit_and_tag(
        repo,
        &RecordRequest {
            remote: &config.remote,
            branch: &branch,
            package: &current,
            commit_template: &commit_template,
            tag_template: &tag_template,
            identity: config.git_identity.as_ref(),
        },
    )
    .map_err(|e| PublishError::published_not_recorded(current.version.to_string(), e))?;

    for warning in &recorded.warnings {
        ui::display_boundary_warning(warning);
    }
    report.recorded = Some(recorded);

    Ok(report)
}

/// Decide, then run the selected phases.
///
/// A negative decision returns [RunOutcome::Skipped] without touching the
/// repository, the manifest, or the registry.
pub fn run_release<R, P>(
    config: &RunConfig,
    repo: &R,
    registry: &P,
    suffix: &dyn SuffixSource,
) -> Result<RunOutcome>
where
    R: Repository + ?Sized,
    P: Registry + ?Sized,
{
    let plan = plan_release(config, suffix)?;
    if let Some(reason) = &plan.decision.skip_reason {
        return Ok(RunOutcome::Skipped(reason.clone()));
    }

    execute_release(config, &plan, repo, registry).map(RunOutcome::Completed)
}
