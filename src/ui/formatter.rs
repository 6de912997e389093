//! Formatting functions for run output.
//!
//! Line builders (`*_lines`) are pure and tested; the `display_*` functions print
//! them. Progress goes to stdout, errors and warnings to stderr.

use console::style;

use crate::analyzer::SkipReason;
use crate::boundary::BoundaryWarning;
use crate::cli::orchestration::ReleaseReport;
use crate::config::RunConfig;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Print the hint attached to an error, if any.
pub fn display_remediation(hint: &str) {
    eprintln!("  {} {}", style("hint:").cyan(), hint);
}

/// Lines describing the inputs of a run.
pub fn run_header_lines(config: &RunConfig) -> Vec<String> {
    vec![
        format!("BRANCH: {}", config.branch()),
        format!("MESSAGE: \"{}\"", config.message_line()),
        format!("MODE: {}", config.mode),
        format!("WILDCARD_MAJOR: \"{}\"", config.markers.major),
        format!("WILDCARD_MINOR: \"{}\"", config.markers.minor),
        format!("WILDCARD_BETA: \"{}\"", config.markers.beta),
        format!("WILDCARD_NO_PUBLISH: \"{}\"", config.markers.no_publish),
        format!("PUBLISH BRANCHES: {}", config.publish_branches.join(",")),
    ]
}

/// Print the run header.
pub fn display_run_header(config: &RunConfig) {
    println!("\n{}", style("npm-publish").bold());
    for line in run_header_lines(config) {
        println!("  {}", line);
    }
    println!();
}

/// Lines announcing a beta run and how to install it.
pub fn beta_notice_lines(package: &str, version: &str) -> Vec<String> {
    vec![
        format!("Creating beta version: {}", version),
        "Install it by running:".to_string(),
        format!("  npm i --save {}@{}", package, version),
    ]
}

/// Print the beta banner.
pub fn display_beta_notice(package: &str, version: &str) {
    println!("{}", style("BETA VERSION").magenta().bold());
    for line in beta_notice_lines(package, version) {
        println!("  {}", line);
    }
    println!();
}

/// Print why the run stopped early.
pub fn display_skip(reason: &SkipReason) {
    println!("{} Exit: {}", style("→").yellow(), reason);
}

/// Lines summarizing a finished run.
pub fn release_summary_lines(report: &ReleaseReport) -> Vec<String> {
    let mut lines = vec![format!("{}@{}", report.package, report.version)];
    if report.version_created {
        lines.push("version written to manifest".to_string());
    }
    if report.published {
        let tag = if report.is_beta { "beta" } else { "latest" };
        lines.push(format!("published under dist-tag '{}'", tag));
    }
    if let Some(recorded) = &report.recorded {
        let short = recorded.commit.get(..7).unwrap_or(&recorded.commit);
        lines.push(format!("committed {} and pushed tag {}", short, recorded.tag));
    }
    lines
}

/// Print the summary of a finished run.
pub fn display_release_summary(report: &ReleaseReport) {
    let mut lines = release_summary_lines(report).into_iter();
    if let Some(first) = lines.next() {
        println!("\n{} {}", style("✓").green(), style(first).bold());
    }
    for line in lines {
        println!("  {}", line);
    }
}
