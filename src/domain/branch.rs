use std::fmt;

/// Prefix carried by fully qualified local branch refs (e.g. `GITHUB_REF`)
pub const HEADS_PREFIX: &str = "refs/heads/";

/// Strip a single leading `refs/heads/` from a raw ref.
///
/// Anything else is returned unchanged, so `normalize_branch("main") == "main"`.
pub fn normalize_branch(raw_ref: &str) -> String {
    raw_ref
        .strip_prefix(HEADS_PREFIX)
        .unwrap_or(raw_ref)
        .to_string()
}

/// Effective branch a run operates on. Never contains the `refs/heads/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Branch {
    name: String,
}

impl Branch {
    /// Build a branch from a raw ref or plain branch name
    pub fn from_ref(raw_ref: &str) -> Self {
        Branch {
            name: normalize_branch(raw_ref),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether this branch is one of the configured publish branches
    pub fn is_listed_in<'a, I>(&self, publish_branches: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        publish_branches.into_iter().any(|b| b == &self.name)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
