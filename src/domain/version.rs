use std::fmt;

use semver::{BuildMetadata, Prerelease, Version};

use crate::error::{PublishError, Result};

/// Package name and version as recorded in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: Version,
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        PackageDescriptor {
            name: name.into(),
            version,
        }
    }
}

/// Semantic version increment kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    Patch,
    Minor,
    Major,
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Increment::Patch => write!(f, "patch"),
            Increment::Minor => write!(f, "minor"),
            Increment::Major => write!(f, "major"),
        }
    }
}

impl Increment {
    /// Apply the increment the way npm does.
    ///
    /// A pre-release is first released: `1.2.3-beta.4` + patch is `1.2.3`, + minor is
    /// `1.3.0` (or `1.2.0` when the patch is already 0), + major likewise.
    pub fn apply(&self, current: &Version) -> Version {
        let is_pre = !current.pre.is_empty();
        let (major, minor, patch) = (current.major, current.minor, current.patch);

        let (major, minor, patch) = match self {
            Increment::Major if is_pre && minor == 0 && patch == 0 => (major, 0, 0),
            Increment::Major => (major + 1, 0, 0),
            Increment::Minor if is_pre && patch == 0 => (major, minor, 0),
            Increment::Minor => (major, minor + 1, 0),
            Increment::Patch if is_pre => (major, minor, patch),
            Increment::Patch => (major, minor, patch + 1),
        };

        Version {
            major,
            minor,
            patch,
            pre: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
        }
    }
}

/// How the manifest version is rewritten by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionChange {
    Increment(Increment),
    /// Explicit version string, used for beta identifiers
    Explicit(String),
}

impl VersionChange {
    /// Resolve the new version from the current one
    pub fn resolve(&self, current: &Version) -> Result<Version> {
        match self {
            VersionChange::Increment(increment) => Ok(increment.apply(current)),
            VersionChange::Explicit(raw) => {
                let version = Version::parse(raw.trim_start_matches('v')).map_err(|e| {
                    PublishError::manifest(format!("Invalid version '{}': {}", raw, e))
                })?;
                if &version == current {
                    return Err(PublishError::manifest(format!(
                        "Version not changed: already {}",
                        current
                    )));
                }
                Ok(version)
            }
        }
    }
}

impl fmt::Display for VersionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionChange::Increment(increment) => write!(f, "{}", increment),
            VersionChange::Explicit(version) => f.write_str(version),
        }
    }
}
