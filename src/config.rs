use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::boundary::BoundaryWarning;
use crate::domain::{first_line, Branch};
use crate::error::{PublishError, Result};
use crate::manifest::Manifest;

/// Name of the project-local configuration file
pub const CONFIG_FILE_NAME: &str = "npm-publish.toml";

/// Which phases a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Bump the manifest version only
    CreateVersion,
    /// Publish the current manifest and record it in git
    Publish,
    /// Bump, publish and record
    #[default]
    CreateAndPublish,
}

impl RunMode {
    pub fn creates_version(&self) -> bool {
        matches!(self, RunMode::CreateVersion | RunMode::CreateAndPublish)
    }

    pub fn publishes(&self) -> bool {
        matches!(self, RunMode::Publish | RunMode::CreateAndPublish)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::CreateVersion => write!(f, "create-version"),
            RunMode::Publish => write!(f, "publish"),
            RunMode::CreateAndPublish => write!(f, "create-and-publish"),
        }
    }
}

/// Commit-message markers that steer the release policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub minor: String,
    pub major: String,
    pub beta: String,
    pub no_publish: String,
}

impl Default for Markers {
    fn default() -> Self {
        Markers {
            minor: "[minor]".to_string(),
            major: "[major]".to_string(),
            beta: "[beta]".to_string(),
            no_publish: "[nopublish]".to_string(),
        }
    }
}

/// Author used for the release commit, for that commit only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

/// Returns the default publish branches.
fn default_publish_branches() -> Vec<String> {
    vec!["master".to_string(), "main".to_string()]
}

/// Default release commit message. Carries the no-publish marker so the pushed commit
/// doesn't trigger another release.
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore(release): %p@%v [nopublish]";

/// Default tag name template.
pub const DEFAULT_TAG_NAME: &str = "v%v";

/// Default remote for sync and push.
pub const DEFAULT_REMOTE: &str = "origin";

/// Fully resolved parameters of one run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub commit_message: String,
    pub branch_ref: String,
    pub mode: RunMode,
    pub publish_branches: Vec<String>,
    pub markers: Markers,
    pub commit_message_template: String,
    pub tag_template: String,
    pub git_identity: Option<GitIdentity>,
    pub registry_url: Option<String>,
    pub remote: String,
    pub package_dir: PathBuf,
}

impl RunConfig {
    /// Effective branch, with any `refs/heads/` prefix removed
    pub fn branch(&self) -> Branch {
        Branch::from_ref(&self.branch_ref)
    }

    /// First line of the commit message, the part markers are matched against
    pub fn message_line(&self) -> &str {
        first_line(&self.commit_message)
    }

    /// Config with built-in defaults for everything but message and branch
    pub fn with_defaults(
        commit_message: impl Into<String>,
        branch_ref: impl Into<String>,
        package_dir: impl Into<PathBuf>,
    ) -> Self {
        RunConfig {
            commit_message: commit_message.into(),
            branch_ref: branch_ref.into(),
            mode: RunMode::default(),
            publish_branches: default_publish_branches(),
            markers: Markers::default(),
            commit_message_template: DEFAULT_COMMIT_MESSAGE.to_string(),
            tag_template: DEFAULT_TAG_NAME.to_string(),
            git_identity: None,
            registry_url: None,
            remote: DEFAULT_REMOTE.to_string(),
            package_dir: package_dir.into(),
        }
    }

    /// Resolve a merged layer into a run configuration.
    ///
    /// Message and branch are required. A git identity is only used when both
    /// name and email are present; a half-specified identity yields a warning.
    pub fn resolve(
        layer: ConfigLayer,
        package_dir: PathBuf,
    ) -> Result<(RunConfig, Vec<BoundaryWarning>)> {
        let mut warnings = Vec::new();

        let commit_message = layer
            .message
            .ok_or_else(|| PublishError::config("commit message is required (--message)"))?;
        let branch_ref = layer
            .branch
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| PublishError::config("branch is required (--branch)"))?;

        let mut publish_branches: Vec<String> = layer
            .publish_branches
            .map(StringList::into_vec)
            .unwrap_or_else(default_publish_branches)
            .into_iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        let mut seen = HashSet::new();
        publish_branches.retain(|b| seen.insert(b.clone()));

        let defaults = Markers::default();
        let markers = Markers {
            minor: layer.wildcard_minor.unwrap_or(defaults.minor),
            major: layer.wildcard_major.unwrap_or(defaults.major),
            beta: layer.wildcard_beta.unwrap_or(defaults.beta),
            no_publish: layer.wildcard_no_publish.unwrap_or(defaults.no_publish),
        };
        for (flag, value) in [
            ("wildcard-minor", &markers.minor),
            ("wildcard-major", &markers.major),
            ("wildcard-beta", &markers.beta),
            ("wildcard-no-publish", &markers.no_publish),
        ] {
            if value.is_empty() {
                warnings.push(BoundaryWarning::EmptyMarker {
                    marker: flag.to_string(),
                });
            }
        }

        let git_identity = match (layer.git_name, layer.git_email) {
            (Some(name), Some(email)) => Some(GitIdentity { name, email }),
            (Some(_), None) => {
                warnings.push(BoundaryWarning::PartialGitIdentity {
                    missing: "git-email".to_string(),
                });
                None
            }
            (None, Some(_)) => {
                warnings.push(BoundaryWarning::PartialGitIdentity {
                    missing: "git-name".to_string(),
                });
                None
            }
            (None, None) => None,
        };

        let config = RunConfig {
            commit_message,
            branch_ref,
            mode: layer.mode.unwrap_or_default(),
            publish_branches,
            markers,
            commit_message_template: layer
                .commit_message
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
            tag_template: layer
                .tag_name
                .unwrap_or_else(|| DEFAULT_TAG_NAME.to_string()),
            git_identity,
            registry_url: layer.registry.filter(|r| !r.is_empty()),
            remote: layer.remote.unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            package_dir,
        };

        Ok((config, warnings))
    }
}

/// Either a single comma-separated string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

impl StringList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringList::One(s) => s.split(',').map(str::to_string).collect(),
            StringList::Many(v) => v,
        }
    }
}

/// One source of parameters. Every field is optional; layers are merged by precedence.
///
/// Keys are snake_case in `npm-publish.toml`; the camelCase spellings are accepted for
/// the `"npm-publish"` section of `package.json`.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigLayer {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub mode: Option<RunMode>,

    #[serde(default, alias = "publishBranches")]
    pub publish_branches: Option<StringList>,

    #[serde(default, alias = "wildcardMinor")]
    pub wildcard_minor: Option<String>,

    #[serde(default, alias = "wildcardMajor")]
    pub wildcard_major: Option<String>,

    #[serde(default, alias = "wildcardBeta")]
    pub wildcard_beta: Option<String>,

    #[serde(default, alias = "wildcardNoPublish")]
    pub wildcard_no_publish: Option<String>,

    #[serde(default, alias = "gitName")]
    pub git_name: Option<String>,

    #[serde(default, alias = "gitEmail")]
    pub git_email: Option<String>,

    #[serde(default, alias = "commitMessage")]
    pub commit_message: Option<String>,

    #[serde(default, alias = "tagName")]
    pub tag_name: Option<String>,

    #[serde(default)]
    pub registry: Option<String>,

    #[serde(default)]
    pub remote: Option<String>,
}

impl ConfigLayer {
    /// Merge two layers; values in `self` win over values in `lower`.
    pub fn over(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            message: self.message.or(lower.message),
            branch: self.branch.or(lower.branch),
            mode: self.mode.or(lower.mode),
            publish_branches: self.publish_branches.or(lower.publish_branches),
            wildcard_minor: self.wildcard_minor.or(lower.wildcard_minor),
            wildcard_major: self.wildcard_major.or(lower.wildcard_major),
            wildcard_beta: self.wildcard_beta.or(lower.wildcard_beta),
            wildcard_no_publish: self.wildcard_no_publish.or(lower.wildcard_no_publish),
            git_name: self.git_name.or(lower.git_name),
            git_email: self.git_email.or(lower.git_email),
            commit_message: self.commit_message.or(lower.commit_message),
            tag_name: self.tag_name.or(lower.tag_name),
            registry: self.registry.or(lower.registry),
            remote: self.remote.or(lower.remote),
        }
    }
}

/// Finds the configuration file for a package directory.
///
/// Searched in the following order:
/// 1. `npm-publish.toml` in `start_dir` or any ancestor
/// 2. `npm-publish.toml` in the user config directory
pub fn discover_config_file(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
        .or_else(|| {
            dirs::config_dir()
                .map(|dir| dir.join(CONFIG_FILE_NAME))
                .filter(|candidate| candidate.is_file())
        })
}

/// Parses a configuration file into a layer.
pub fn load_config_file(path: &Path) -> Result<ConfigLayer> {
    let content = fs::read_to_string(path).map_err(|e| {
        PublishError::config(format!("cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| PublishError::config(format!("invalid {}: {}", path.display(), e)))
}

/// Builds the run configuration from all parameter sources.
///
/// Precedence: `cli` flags > config file > `package.json` defaults > built-in defaults.
/// An explicit `config_path` must exist; otherwise the file is discovered.
pub fn load_run_config(
    cli: ConfigLayer,
    config_path: Option<&Path>,
    package_dir: &Path,
) -> Result<(RunConfig, Vec<BoundaryWarning>)> {
    let file_layer = match config_path {
        Some(path) => load_config_file(path)?,
        None => match discover_config_file(package_dir) {
            Some(path) => load_config_file(&path)?,
            None => ConfigLayer::default(),
        },
    };

    let manifest_layer = match Manifest::discover(package_dir) {
        Ok(manifest) => manifest.config_defaults()?.unwrap_or_default(),
        Err(_) => ConfigLayer::default(),
    };

    RunConfig::resolve(
        cli.over(file_layer).over(manifest_layer),
        package_dir.to_path_buf(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> ConfigLayer {
        ConfigLayer {
            message: Some("TEST".to_string()),
            branch: Some("master".to_string()),
            ..ConfigLayer::default()
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let (config, warnings) = RunConfig::resolve(required(), PathBuf::from(".")).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.mode, RunMode::CreateAndPublish);
        assert_eq!(config.publish_branches, vec!["master", "main"]);
        assert_eq!(config.markers, Markers::default());
        assert_eq!(config.tag_template, "v%v");
        assert_eq!(config.remote, "origin");
        assert!(config.git_identity.is_none());
    }

    #[test]
    fn test_resolve_requires_message() {
        let layer = ConfigLayer {
            branch: Some("master".to_string()),
            ..ConfigLayer::default()
        };
        let err = RunConfig::resolve(layer, PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, PublishError::Config(_)));
    }

    #[test]
    fn test_resolve_requires_branch() {
        let layer = ConfigLayer {
            message: Some("TEST".to_string()),
            branch: Some("  ".to_string()),
            ..ConfigLayer::default()
        };
        assert!(RunConfig::resolve(layer, PathBuf::from(".")).is_err());
    }

    #[test]
    fn test_partial_identity_is_ignored_with_warning() {
        let layer = ConfigLayer {
            git_name: Some("Release Bot".to_string()),
            ..required()
        };
        let (config, warnings) = RunConfig::resolve(layer, PathBuf::from(".")).unwrap();
        assert!(config.git_identity.is_none());
        assert_eq!(
            warnings,
            vec![BoundaryWarning::PartialGitIdentity {
                missing: "git-email".to_string()
            }]
        );
    }

    #[test]
    fn test_full_identity() {
        let layer = ConfigLayer {
            git_name: Some("Release Bot".to_string()),
            git_email: Some("bot@example.com".to_string()),
            ..required()
        };
        let (config, _) = RunConfig::resolve(layer, PathBuf::from(".")).unwrap();
        assert_eq!(
            config.git_identity,
            Some(GitIdentity {
                name: "Release Bot".to_string(),
                email: "bot@example.com".to_string()
            })
        );
    }

    #[test]
    fn test_empty_marker_warns() {
        let layer = ConfigLayer {
            wildcard_beta: Some(String::new()),
            ..required()
        };
        let (_, warnings) = RunConfig::resolve(layer, PathBuf::from(".")).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_layer_precedence() {
        let cli = ConfigLayer {
            tag_name: Some("cli-%v".to_string()),
            ..ConfigLayer::default()
        };
        let file = ConfigLayer {
            tag_name: Some("file-%v".to_string()),
            remote: Some("upstream".to_string()),
            ..ConfigLayer::default()
        };
        let manifest = ConfigLayer {
            remote: Some("manifest".to_string()),
            wildcard_minor: Some("#minor".to_string()),
            ..ConfigLayer::default()
        };
        let merged = cli.over(file).over(manifest);
        assert_eq!(merged.tag_name.as_deref(), Some("cli-%v"));
        assert_eq!(merged.remote.as_deref(), Some("upstream"));
        assert_eq!(merged.wildcard_minor.as_deref(), Some("#minor"));
    }

    #[test]
    fn test_string_list_accepts_comma_string() {
        let list = StringList::One("master,master-v2".to_string());
        assert_eq!(list.into_vec(), vec!["master", "master-v2"]);
    }

    #[test]
    fn test_branch_ref_is_normalized() {
        let layer = ConfigLayer {
            branch: Some("refs/heads/master".to_string()),
            ..required()
        };
        let (config, _) = RunConfig::resolve(layer, PathBuf::from(".")).unwrap();
        assert_eq!(config.branch().name(), "master");
    }

    #[test]
    fn test_run_mode_phases() {
        assert!(RunMode::CreateVersion.creates_version());
        assert!(!RunMode::CreateVersion.publishes());
        assert!(!RunMode::Publish.creates_version());
        assert!(RunMode::Publish.publishes());
        assert!(RunMode::CreateAndPublish.creates_version());
        assert!(RunMode::CreateAndPublish.publishes());
    }
}
