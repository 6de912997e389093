use std::io::ErrorKind;
use std::process::Command;

use crate::error::{PublishError, RegistryFailure, Result};
use crate::registry::{PublishRequest, Registry};

/// Publishes through the `npm` command line client
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    program: String,
}

impl NpmRegistry {
    pub fn new() -> Self {
        NpmRegistry {
            program: "npm".to_string(),
        }
    }

    /// Use a different client executable (e.g. a wrapper script)
    pub fn with_program(program: impl Into<String>) -> Self {
        NpmRegistry {
            program: program.into(),
        }
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments passed to `npm` for a request
pub fn publish_args(request: &PublishRequest<'_>) -> Vec<String> {
    let mut args = vec!["publish".to_string()];
    if let Some(tag) = request.dist_tag {
        args.push("--tag".to_string());
        args.push(tag.to_string());
    }
    if let Some(registry) = request.registry_url {
        args.push(format!("--registry={}", registry));
    }
    args
}

/// Classify a failed publish from the client's diagnostic output
pub fn classify_failure(output: &str) -> RegistryFailure {
    let output = output.to_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|n| output.contains(n));

    if any(&[
        "epublishconflict",
        "cannot publish over",
        "previously published",
        "e409",
    ]) {
        RegistryFailure::DuplicateVersion
    } else if any(&["e401", "eneedauth", "e403", "unauthorized", "forbidden", "need auth"]) {
        RegistryFailure::Auth
    } else if any(&[
        "enotfound",
        "econnrefused",
        "econnreset",
        "etimedout",
        "eai_again",
        "network",
    ]) {
        RegistryFailure::Network
    } else {
        RegistryFailure::Other
    }
}

impl Registry for NpmRegistry {
    fn publish(&self, request: &PublishRequest<'_>) -> Result<()> {
        let args = publish_args(request);

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(request.package_dir)
            .output()
            .map_err(|e| {
                let kind = if e.kind() == ErrorKind::NotFound {
                    RegistryFailure::MissingClient
                } else {
                    RegistryFailure::Other
                };
                PublishError::registry(
                    kind,
                    format!("failed to run {} {}: {}", self.program, args.join(" "), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(PublishError::registry(
                classify_failure(&format!("{}\n{}", stderr, stdout)),
                format!(
                    "{} {} exited with code {}\nStderr: {}",
                    self.program,
                    args.join(" "),
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            ));
        }

        Ok(())
    }
}
