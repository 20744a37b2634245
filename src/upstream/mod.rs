//! Upstream release information: the published-file index and the version
//! declared in the authoritative source tree.

pub mod declaration;
pub mod http;
pub mod listing;
pub mod mock;

pub use declaration::{parse_declaration, DeclarationFormat};
pub use http::HttpReleaseIndex;
pub use listing::{parse_listing, release_date, ReleaseRecord};
pub use mock::StaticReleaseIndex;

use crate::error::Result;
use std::path::Path;

/// Source of published release files
pub trait ReleaseIndex {
    /// Raw index page for a directory such as `talloc` or `samba/stable`.
    fn listing(&self, path: &str) -> Result<String>;

    /// Fetch one file (relative to the index root) into `dest`.
    fn download(&self, path: &str, dest: &Path) -> Result<()>;
}

/// Fetch and parse the index page of one package.
pub fn fetch_releases<I: ReleaseIndex + ?Sized>(
    index: &I,
    listing_path: &str,
    package: &str,
) -> Result<Vec<ReleaseRecord>> {
    let html = index.listing(listing_path)?;
    Ok(parse_listing(package, &html))
}
