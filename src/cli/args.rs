use std::path::PathBuf;

use crate::config::{ConfigLayer, RunMode, StringList};

#[derive(clap::Parser, Debug, Clone, PartialEq)]
#[command(
    name = "npm-publish",
    version,
    about = "Bump, publish and tag an npm package based on commit-message markers",
    override_usage = "npm-publish -b <BRANCH> -m <MESSAGE> [OPTIONS]"
)]
pub struct Args {
    #[arg(short, long, help = "Commit message that triggered the run")]
    pub message: Option<String>,

    #[arg(short, long, help = "Branch name or ref (refs/heads/<name>)")]
    pub branch: Option<String>,

    #[arg(long, value_enum, help = "Phases to run")]
    pub mode: Option<RunMode>,

    #[arg(
        long,
        value_delimiter = ',',
        num_args = 1..,
        help = "Branches allowed to publish releases"
    )]
    pub publish_branches: Option<Vec<String>>,

    #[arg(long, help = "Marker requesting a minor increment")]
    pub wildcard_minor: Option<String>,

    #[arg(long, help = "Marker requesting a major increment")]
    pub wildcard_major: Option<String>,

    #[arg(long, help = "Marker requesting a beta publish")]
    pub wildcard_beta: Option<String>,

    #[arg(long, help = "Marker that skips publishing")]
    pub wildcard_no_publish: Option<String>,

    #[arg(long, help = "Author name for the release commit")]
    pub git_name: Option<String>,

    #[arg(long, help = "Author email for the release commit")]
    pub git_email: Option<String>,

    #[arg(long, help = "Release commit message template (%v version, %p package)")]
    pub commit_message: Option<String>,

    #[arg(long, help = "Tag name template (%v version, %p package)")]
    pub tag_name: Option<String>,

    #[arg(long, help = "Registry URL to publish to")]
    pub registry: Option<String>,

    #[arg(long, help = "Git remote to sync with and push to")]
    pub remote: Option<String>,

    #[arg(short, long, help = "Custom configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Directory to search for package.json from")]
    pub cwd: Option<PathBuf>,
}

impl Args {
    /// Parameters given on the command line, as the highest-precedence layer
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            message: self.message.clone(),
            branch: self.branch.clone(),
            mode: self.mode,
            publish_branches: self.publish_branches.clone().map(StringList::Many),
            wildcard_minor: self.wildcard_minor.clone(),
            wildcard_major: self.wildcard_major.clone(),
            wildcard_beta: self.wildcard_beta.clone(),
            wildcard_no_publish: self.wildcard_no_publish.clone(),
            git_name: self.git_name.clone(),
            git_email: self.git_email.clone(),
            commit_message: self.commit_message.clone(),
            tag_name: self.tag_name.clone(),
            registry: self.registry.clone(),
            remote: self.remote.clone(),
        }
    }
}
