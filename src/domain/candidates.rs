use crate::domain::version::{compare, Version};

/// Upstream versions eligible for one update pass, newest first.
///
/// Every element `v` satisfies `current < v <= ceiling`. The head is the
/// version being adopted; the rest are the intervening releases whose
/// changelogs get aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateSet {
    versions: Vec<Version>,
    ceiling_unpublished: bool,
}

impl CandidateSet {
    /// Build the candidate set from raw version strings scraped from a release index.
    ///
    /// Strings that do not parse as `X.Y.Z` are ignored. When `current` is
    /// already at or past `ceiling` the set is empty. When the ceiling itself
    /// was not listed it is still injected at the head.
    pub fn resolve<I, S>(current: Version, ceiling: Version, listing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !current.is_older_than(&ceiling) {
            return CandidateSet::default();
        }

        let mut versions: Vec<Version> = listing
            .into_iter()
            .filter_map(|raw| Version::parse(raw.as_ref()).ok())
            .filter(|v| v.is_newer_than(&current) && !v.is_newer_than(&ceiling))
            .collect();

        versions.sort_by(|a, b| compare(b, a));
        versions.dedup();

        let ceiling_unpublished = versions.first() != Some(&ceiling);
        if ceiling_unpublished {
            versions.insert(0, ceiling);
        }

        CandidateSet {
            versions,
            ceiling_unpublished,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// The version this pass updates to.
    pub fn selected(&self) -> Option<Version> {
        self.versions.first().copied()
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    /// Whether the selected version was missing from the release index.
    pub fn ceiling_unpublished(&self) -> bool {
        self.ceiling_unpublished
    }
}
