use anyhow::{Context, Result};
use clap::Parser;

use npm_publish::cli::{execute_release, plan_release, Args};
use npm_publish::config;
use npm_publish::domain::RandomSuffix;
use npm_publish::git::Git2Repository;
use npm_publish::registry::NpmRegistry;
use npm_publish::{ui, PublishError};

fn main() -> Result<()> {
    let args = Args::parse();

    let package_dir = match &args.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };

    // Load configuration
    let (config, warnings) =
        match config::load_run_config(args.to_layer(), args.config.as_deref(), &package_dir) {
            Ok(loaded) => loaded,
            Err(e) => fail(&e),
        };

    ui::display_run_header(&config);
    for warning in &warnings {
        ui::display_boundary_warning(warning);
    }

    // Decide before touching anything
    let plan = match plan_release(&config, &RandomSuffix) {
        Ok(plan) => plan,
        Err(e) => fail(&e),
    };
    if let Some(reason) = &plan.decision.skip_reason {
        ui::display_skip(reason);
        return Ok(());
    }

    let repo = match Git2Repository::open(&config.package_dir) {
        Ok(repo) => repo,
        Err(e) => fail(&e),
    };
    let registry = NpmRegistry::new();

    match execute_release(&config, &plan, &repo, &registry) {
        Ok(report) => {
            ui::display_release_summary(&report);
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

fn fail(error: &PublishError) -> ! {
    ui::display_error(&error.to_string());
    if let Some(hint) = error.remediation() {
        ui::display_remediation(hint);
    }
    std::process::exit(1);
}
