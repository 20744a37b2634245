use crate::domain::candidates::CandidateSet;
use crate::domain::version::Version;
use std::collections::BTreeSet;

/// Snapshot of everything known about one package at the start of its update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageState {
    pub name: String,
    pub current_version: Version,
    pub upstream_listing: BTreeSet<String>,
    pub target_ceiling: Version,
}

impl PackageState {
    pub fn new<I, S>(
        name: impl Into<String>,
        current_version: Version,
        upstream_listing: I,
        target_ceiling: Version,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PackageState {
            name: name.into(),
            current_version,
            upstream_listing: upstream_listing.into_iter().map(Into::into).collect(),
            target_ceiling,
        }
    }

    pub fn candidates(&self) -> CandidateSet {
        CandidateSet::resolve(
            self.current_version,
            self.target_ceiling,
            &self.upstream_listing,
        )
    }

    pub fn needs_update(&self) -> bool {
        self.current_version.is_older_than(&self.target_ceiling)
    }
}

/// Who is submitting the update, as shown in the changelog header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub login: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(login: impl Into<String>, email: Option<String>) -> Self {
        Identity {
            login: login.into(),
            email,
        }
    }

    /// Email when known, otherwise the login name.
    pub fn display(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.login)
    }
}
