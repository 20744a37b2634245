//! Domain logic - version resolution and changelog rules independent of any external tool

pub mod candidates;
pub mod changelog;
pub mod package;
pub mod tag;
pub mod version;

pub use candidates::CandidateSet;
pub use changelog::{ChangelogBlock, ChangelogEntry, ChangelogFormatter, EntryOrigin};
pub use package::{Identity, PackageState};
pub use tag::{TagMap, TagRef};
pub use version::Version;
