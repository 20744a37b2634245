use crate::domain::version::Version;
use std::collections::HashMap;

const TAG_PREFIX: &str = "refs/tags/";
const PEELED_SUFFIX: &str = "^{}";

/// One entry of a remote reference listing, as `git ls-remote` reports it.
///
/// Annotated tags appear twice: once with the tag object id and once with a
/// `^{}` suffix carrying the id of the commit the tag points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
    pub id: String,
}

impl TagRef {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        TagRef {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Tag name without the `refs/tags/` prefix or the peel marker.
    pub fn short_name(&self) -> &str {
        let name = self.name.strip_prefix(TAG_PREFIX).unwrap_or(&self.name);
        name.strip_suffix(PEELED_SUFFIX).unwrap_or(name)
    }

    pub fn is_peeled(&self) -> bool {
        self.name.ends_with(PEELED_SUFFIX)
    }
}

/// Tag naming convention for upstream releases: `<package>-<version>`.
pub fn tag_name(package: &str, version: &Version) -> String {
    format!("{}-{}", package, version)
}

/// Glob matching every release tag of a package.
pub fn tag_pattern(package: &str) -> String {
    format!("{}-*", package)
}

/// Commit ids of the release tags found for a package's candidate versions.
///
/// The map is partial on purpose: intermediate releases are not always
/// tagged, and callers fall back to a synthetic changelog line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    commits: HashMap<Version, String>,
}

impl TagMap {
    /// Match `refs` against `<package>-<version>` for every candidate.
    ///
    /// Peeled entries win over the tag object id so annotated tags resolve to
    /// the commit they point at.
    pub fn from_refs(package: &str, candidates: &[Version], refs: &[TagRef]) -> Self {
        let mut direct: HashMap<&str, &str> = HashMap::new();
        let mut peeled: HashMap<&str, &str> = HashMap::new();
        for tag in refs {
            if tag.is_peeled() {
                peeled.insert(tag.short_name(), tag.id.as_str());
            } else {
                direct.insert(tag.short_name(), tag.id.as_str());
            }
        }

        let mut commits = HashMap::new();
        for version in candidates {
            let name = tag_name(package, version);
            let id = peeled
                .get(name.as_str())
                .or_else(|| direct.get(name.as_str()));
            if let Some(id) = id {
                commits.insert(*version, id.to_string());
            }
        }

        TagMap { commits }
    }

    pub fn get(&self, version: &Version) -> Option<&str> {
        self.commits.get(version).map(|id| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}
