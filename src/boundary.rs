use crate::domain::Version;
use std::fmt;

/// Warnings that occur at the edges of the update pipeline.
/// These are non-fatal issues that should be reported to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The packaged version is already at (or past) the upstream ceiling
    NoUpdate {
        package: String,
        current: Version,
        ceiling: Version,
    },
    /// The ceiling is declared upstream but no release file is published yet
    UnpublishedCeiling { package: String, version: Version },
    /// The release index lists the version without a timestamp
    MissingReleaseDate { package: String, version: Version },
    /// No `<pkg>-<version>` tag upstream; a one-line entry is used instead
    MissingTag { package: String, version: Version },
    /// The tagged commit message left nothing after filtering
    EmptyReleaseNotes { package: String, version: Version },
    /// Branch deletion or checkout removal failed after an abandoned update
    CleanupFailed { package: String, reason: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoUpdate {
                package,
                current,
                ceiling,
            } => write!(
                f,
                "{} is up to date (packaged {}, upstream {})",
                package, current, ceiling
            ),
            BoundaryWarning::UnpublishedCeiling { package, version } => write!(
                f,
                "{}-{} is not published yet; skipping source download",
                package, version
            ),
            BoundaryWarning::MissingReleaseDate { package, version } => {
                write!(f, "No release date listed for {}-{}", package, version)
            }
            BoundaryWarning::MissingTag { package, version } => write!(
                f,
                "No upstream tag {}-{}; using a one-line changelog entry",
                package, version
            ),
            BoundaryWarning::EmptyReleaseNotes { package, version } => write!(
                f,
                "Release notes for {}-{} are empty; using a one-line changelog entry",
                package, version
            ),
            BoundaryWarning::CleanupFailed { package, reason } => {
                write!(f, "Cleanup of {} failed: {}", package, reason)
            }
        }
    }
}
