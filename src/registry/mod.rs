//! Package registry abstraction
//!
//! The [Registry] trait covers the one registry mutation a run performs: uploading
//! the package described by the local manifest. Implementations:
//!
//! - [npm::NpmRegistry]: drives the `npm` executable
//! - [mock::MockRegistry]: records uploads for tests

pub mod mock;
pub mod npm;

pub use mock::MockRegistry;
pub use npm::NpmRegistry;

use std::path::Path;

use crate::error::Result;

/// Distribution tag for beta runs, kept away from default installs
pub const BETA_DIST_TAG: &str = "beta";

/// Parameters of one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest<'a> {
    /// Directory containing the manifest to publish
    pub package_dir: &'a Path,
    /// Dist-tag to publish under; `None` means the registry default (`latest`)
    pub dist_tag: Option<&'a str>,
    /// Registry to publish to; `None` means the client's configured registry
    pub registry_url: Option<&'a str>,
}

impl<'a> PublishRequest<'a> {
    pub fn new(package_dir: &'a Path, is_beta: bool, registry_url: Option<&'a str>) -> Self {
        PublishRequest {
            package_dir,
            dist_tag: is_beta.then_some(BETA_DIST_TAG),
            registry_url,
        }
    }
}

/// Uploads packages to a registry
///
/// Errors must be [crate::error::PublishError::Registry]; a failed upload is never
/// retried by the caller.
pub trait Registry: Send + Sync {
    /// Publish the package in `request.package_dir`
    fn publish(&self, request: &PublishRequest<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_beta_uses_beta_tag() {
        let request = PublishRequest::new(Path::new("."), true, None);
        assert_eq!(request.dist_tag, Some("beta"));
    }

    #[test]
    fn test_request_release_uses_default_tag() {
        let request = PublishRequest::new(Path::new("."), false, Some("https://r.example"));
        assert_eq!(request.dist_tag, None);
        assert_eq!(request.registry_url, Some("https://r.example"));
    }
}
