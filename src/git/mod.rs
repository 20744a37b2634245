//! Upstream source-control access
//!
//! The pipeline needs three things from the upstream repository: the list of
//! release tags (with annotated tags peeled to their commits), the log text
//! of a commit, and the contents of a file at a branch or tag. The
//! [SourceControl] trait captures exactly that so the pipeline can run
//! against a real mirror or an in-memory double.
//!
//! - [repository::Git2Mirror]: a bare local mirror maintained with `git2`
//! - [mock::MockSourceControl]: canned refs, commits and files for tests

pub mod mock;
pub mod repository;

pub use mock::MockSourceControl;
pub use repository::Git2Mirror;

use crate::domain::tag::{tag_pattern, TagMap, TagRef};
use crate::domain::Version;
use crate::error::Result;

/// Operations the update pipeline consumes from the upstream repository
pub trait SourceControl {
    /// List tag references whose short name matches a `prefix-*` style glob.
    ///
    /// Annotated tags are reported twice, the second time with a `^{}`
    /// suffix and the id of the commit they point at.
    fn list_tag_refs(&self, pattern: &str) -> Result<Vec<TagRef>>;

    /// Render the commit `id` the way `git show -s` does: `commit`,
    /// `Author:` and `Date:` headers, a blank line, then the message.
    fn show_commit(&self, id: &str) -> Result<String>;

    /// Read `path` from the tree at `reference` (branch or tag name).
    ///
    /// Returns `Ok(None)` if the path does not exist at that reference.
    fn read_file(&self, reference: &str, path: &str) -> Result<Option<String>>;
}

/// Look up the release commit of every candidate version of `package`.
pub fn resolve_tags<S: SourceControl + ?Sized>(
    scm: &S,
    package: &str,
    candidates: &[Version],
) -> Result<TagMap> {
    let refs = scm.list_tag_refs(&tag_pattern(package))?;
    Ok(TagMap::from_refs(package, candidates, &refs))
}

/// Does a short tag name match a glob with at most one trailing `*`?
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => name == pattern,
    }
}
