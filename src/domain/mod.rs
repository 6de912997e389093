//! Domain logic - pure release rules independent of git and the registry

pub mod branch;
pub mod commit;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use branch::{normalize_branch, Branch};
pub use commit::{contains_marker, first_line};
pub use prerelease::{beta_identifier, FixedSuffix, RandomSuffix, SequenceSuffix, SuffixSource};
pub use tag::ReleaseTemplate;
pub use version::{Increment, PackageDescriptor, VersionChange};
