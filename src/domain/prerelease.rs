//! Beta pre-release identifiers
//!
//! A beta run publishes `<base>-beta.<n>` where `n` comes from a [`SuffixSource`].
//! The identifier is not unique: two runs can draw the same `n`, and the registry
//! rejects the second upload as a duplicate version.

use std::cell::Cell;

use rand::Rng;
use semver::{BuildMetadata, Version};

/// Largest suffix drawn for a beta identifier
pub const MAX_BETA_SUFFIX: u32 = 100;

/// Source of the numeric beta suffix
pub trait SuffixSource {
    /// Next suffix, in `0..=MAX_BETA_SUFFIX`
    fn next_suffix(&self) -> u32;
}

/// Uniformly random suffix, the production source
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> u32 {
        rand::rng().random_range(0..=MAX_BETA_SUFFIX)
    }
}

/// Always returns the same suffix
#[derive(Debug, Clone, Copy)]
pub struct FixedSuffix(pub u32);

impl SuffixSource for FixedSuffix {
    fn next_suffix(&self) -> u32 {
        self.0.min(MAX_BETA_SUFFIX)
    }
}

/// Counts up from a starting value, wrapping after `MAX_BETA_SUFFIX`
#[derive(Debug)]
pub struct SequenceSuffix {
    next: Cell<u32>,
}

impl SequenceSuffix {
    pub fn starting_at(start: u32) -> Self {
        SequenceSuffix {
            next: Cell::new(start % (MAX_BETA_SUFFIX + 1)),
        }
    }
}

impl SuffixSource for SequenceSuffix {
    fn next_suffix(&self) -> u32 {
        let current = self.next.get();
        self.next.set((current + 1) % (MAX_BETA_SUFFIX + 1));
        current
    }
}

/// Build the beta version string for a base version, e.g. `1.2.3-beta.42`.
///
/// Build metadata of the base is dropped; it would otherwise swallow the suffix.
pub fn beta_identifier(base: &Version, source: &dyn SuffixSource) -> String {
    let mut release = base.clone();
    release.build = BuildMetadata::EMPTY;
    format!("{}-beta.{}", release, source.next_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beta_identifier_fixed() {
        let base = Version::new(1, 2, 3);
        assert_eq!(beta_identifier(&base, &FixedSuffix(7)), "1.2.3-beta.7");
    }

    #[test]
    fn test_beta_identifier_is_valid_semver() {
        let base = Version::parse("2.0.0-rc.1").unwrap();
        let id = beta_identifier(&base, &FixedSuffix(3));
        assert_eq!(id, "2.0.0-rc.1-beta.3");
        assert!(Version::parse(&id).is_ok());
    }

    #[test]
    fn test_beta_identifier_drops_build_metadata() {
        let base = Version::parse("1.0.0+build.1").unwrap();
        let id = beta_identifier(&base, &FixedSuffix(5));
        assert_eq!(id, "1.0.0-beta.5");

        let parsed = Version::parse(&id).unwrap();
        assert_eq!(parsed.pre.as_str(), "beta.5");
        assert!(parsed.build.is_empty());
    }

    #[test]
    fn test_fixed_suffix_is_clamped() {
        assert_eq!(FixedSuffix(500).next_suffix(), MAX_BETA_SUFFIX);
    }

    #[test]
    fn test_random_suffix_in_range() {
        let source = RandomSuffix;
        for _ in 0..200 {
            assert!(source.next_suffix() <= MAX_BETA_SUFFIX);
        }
    }

    #[test]
    fn test_sequence_suffix_counts_and_wraps() {
        let source = SequenceSuffix::starting_at(99);
        assert_eq!(source.next_suffix(), 99);
        assert_eq!(source.next_suffix(), 100);
        assert_eq!(source.next_suffix(), 0);
    }

    #[test]
    fn test_identical_suffixes_collide() {
        let base = Version::new(1, 0, 0);
        assert_eq!(
            beta_identifier(&base, &FixedSuffix(5)),
            beta_identifier(&base, &FixedSuffix(5))
        );
    }
}
