use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{PublishError, RegistryFailure, Result};
use crate::registry::{PublishRequest, Registry};

/// Upload recorded by [MockRegistry]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPublish {
    pub package_dir: PathBuf,
    pub dist_tag: Option<String>,
    pub registry_url: Option<String>,
}

/// Registry that records uploads instead of performing them
#[derive(Debug, Default)]
pub struct MockRegistry {
    published: Mutex<Vec<RecordedPublish>>,
    failure: Option<RegistryFailure>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose every upload fails with `kind`
    pub fn failing(kind: RegistryFailure) -> Self {
        MockRegistry {
            published: Mutex::new(Vec::new()),
            failure: Some(kind),
        }
    }

    /// Uploads accepted so far
    pub fn published(&self) -> Vec<RecordedPublish> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl Registry for MockRegistry {
    fn publish(&self, request: &PublishRequest<'_>) -> Result<()> {
        if let Some(kind) = self.failure {
            return Err(PublishError::registry(kind, "mock registry rejected upload"));
        }

        let record = RecordedPublish {
            package_dir: request.package_dir.to_path_buf(),
            dist_tag: request.dist_tag.map(str::to_string),
            registry_url: request.registry_url.map(str::to_string),
        };
        self.published
            .lock()
            .map_err(|_| PublishError::registry(RegistryFailure::Other, "mock registry poisoned"))?
            .push(record);
        Ok(())
    }
}
