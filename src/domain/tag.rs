use crate::domain::version::PackageDescriptor;

/// Placeholder replaced with the package version
pub const VERSION_PLACEHOLDER: &str = "%v";
/// Placeholder replaced with the package name
pub const NAME_PLACEHOLDER: &str = "%p";

/// Commit message or tag name template (e.g. "v%v", "%p@%v")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTemplate {
    pub pattern: String,
}

impl ReleaseTemplate {
    pub fn new(pattern: impl Into<String>) -> Self {
        ReleaseTemplate {
            pattern: pattern.into(),
        }
    }

    /// Substitute every `%v` and `%p` with the descriptor's version and name
    pub fn render(&self, package: &PackageDescriptor) -> String {
        self.pattern
            .replace(VERSION_PLACEHOLDER, &package.version.to_string())
            .replace(NAME_PLACEHOLDER, &package.name)
    }
}
