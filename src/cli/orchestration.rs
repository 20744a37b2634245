//! Main update workflow orchestration
//!
//! One package at a time, strictly in configured order:
//! 1. Branch the package into the operator's home project and check it out
//! 2. Compare the packaged version with the upstream ceiling
//! 3. Build the changelog block from the release commits of every candidate
//! 4. Fetch and verify the new sources, patch the spec file
//! 5. Let the operator review the changelog, then test build until it passes
//! 6. Commit, or delete the branch if the package was not committed
//!
//! Collaborators are trait objects so the same workflow runs against the
//! real tools from `main` and against the in-memory doubles in tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use crate::boundary::BoundaryWarning;
use crate::config::PackageConfig;
use crate::domain::{
    ChangelogBlock, ChangelogFormatter, EntryOrigin, Identity, PackageState, Version,
};
use crate::error::{Result, UpdaterError};
use crate::git::{self, SourceControl};
use crate::obs::{self, BranchTarget, BuildService};
use crate::operator::{Operator, Resumption};
use crate::specfile;
use crate::ui;
use crate::upstream::{self, parse_declaration, release_date, DeclarationFormat, ReleaseIndex};
use crate::verify::{self, SignatureVerifier};

/// Lines of build log shown before handing over to the fix-up shell
const BUILD_LOG_TAIL: usize = 40;

/// Run-wide settings of the update workflow
///
/// Mirrors the CLI arguments merged with the configuration file, so the
/// workflow can be driven programmatically without depending on clap.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOptions {
    /// Build-service project the packages are branched from
    pub project: String,

    /// Login to branch under; asked from the build service when absent
    pub user: Option<String>,

    /// Address for the changelog header
    pub email: Option<String>,

    /// Upstream branch or tag declaring the ceiling versions
    pub source_ref: String,

    /// Keep checkouts here instead of temporary directories
    pub output_dir: Option<PathBuf>,

    /// Stop after printing the changelog block
    pub dry_run: bool,

    /// Stop the run at the first failed package
    pub fail_fast: bool,
}

/// What happened to one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// Committed at the given version
    Updated(Version),
    /// Dry run: would have been updated to the given version
    DryRun(Version),
    NoUpdate,
    Failed(String),
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    outcomes: Vec<(String, PackageOutcome)>,
    aborted: bool,
}

impl RunReport {
    pub fn outcomes(&self) -> &[(String, PackageOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, package: &str) -> Option<&PackageOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == package)
            .map(|(_, outcome)| outcome)
    }

    /// Remaining packages were skipped after a run-fatal error
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    pub fn success(&self) -> bool {
        !self.aborted
            && self
                .outcomes
                .iter()
                .all(|(_, o)| !matches!(o, PackageOutcome::Failed(_)))
    }

    fn record(&mut self, package: &str, outcome: PackageOutcome) {
        self.outcomes.push((package.to_string(), outcome));
    }
}

/// A branched package and where it is checked out
struct Checkout {
    target: BranchTarget,
    dir: PathBuf,
    // Removes the directory on drop when no output dir was requested
    _scratch: Option<TempDir>,
}

/// Drives the update of a list of packages.
pub struct Updater<'a> {
    scm: &'a dyn SourceControl,
    index: &'a dyn ReleaseIndex,
    build_service: &'a dyn BuildService,
    verifier: &'a dyn SignatureVerifier,
    operator: &'a dyn Operator,
    formatter: ChangelogFormatter,
    options: UpdateOptions,
    timestamp: Option<DateTime<Utc>>,
}

impl<'a> Updater<'a> {
    pub fn new(
        scm: &'a dyn SourceControl,
        index: &'a dyn ReleaseIndex,
        build_service: &'a dyn BuildService,
        verifier: &'a dyn SignatureVerifier,
        operator: &'a dyn Operator,
        formatter: ChangelogFormatter,
        options: UpdateOptions,
    ) -> Self {
        Updater {
            scm,
            index,
            build_service,
            verifier,
            operator,
            formatter,
            options,
            timestamp: None,
        }
    }

    /// Pin the clock used for changelog headers and branch names
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }

    /// Who the update is submitted as
    pub fn identity(&self) -> Result<Identity> {
        let mut identity = match &self.options.user {
            Some(user) => Identity::new(user.clone(), None),
            None => self.build_service.whoami()?,
        };
        if let Some(email) = &self.options.email {
            identity.email = Some(email.clone());
        }
        Ok(identity)
    }

    /// Update every package in order.
    ///
    /// Package failures are recorded and the run moves on, unless the error
    /// is run-fatal or `fail_fast` is set. Only an unknown identity fails the
    /// run outright.
    pub fn run(&self, packages: &[PackageConfig]) -> Result<RunReport> {
        let identity = self.identity()?;
        tracing::info!(login = %identity.login, "updating as");

        let mut report = RunReport::default();
        // Versions committed earlier in this run, for cross-package defines
        let mut committed: BTreeMap<String, Version> = BTreeMap::new();

        for package in packages {
            ui::display_package_header(&package.name);
            match self.update_package(package, &identity, &committed) {
                Ok(outcome) => {
                    match &outcome {
                        PackageOutcome::Updated(v) => {
                            ui::display_success(&format!("{} updated to {}", package.name, v));
                            committed.insert(package.name.clone(), *v);
                        }
                        PackageOutcome::DryRun(v) => ui::display_status(&format!(
                            "{} would be updated to {}",
                            package.name, v
                        )),
                        _ => {}
                    }
                    report.record(&package.name, outcome);
                }
                Err(e) => {
                    ui::display_error(&format!("{}: {}", package.name, e));
                    tracing::warn!(package = %package.name, error = %e, "package failed");
                    report.record(&package.name, PackageOutcome::Failed(e.to_string()));
                    if e.is_fatal() || self.options.fail_fast {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        Ok(report)
    }

    /// Branch, process and, unless committed, clean up one package.
    pub fn update_package(
        &self,
        package: &PackageConfig,
        identity: &Identity,
        committed: &BTreeMap<String, Version>,
    ) -> Result<PackageOutcome> {
        let checkout = self.branch(package, identity)?;
        let result = self.process(package, identity, committed, &checkout);

        if !matches!(result, Ok(PackageOutcome::Updated(_))) {
            self.cleanup(&package.name, &checkout);
        }
        result
    }

    fn branch(&self, package: &PackageConfig, identity: &Identity) -> Result<Checkout> {
        let project = &self.options.project;
        let home = obs::branch_project(&identity.login, project);
        let branch_name = format!("{}{}", package.name, self.now().format("%Y%m%d%H%M%S"));

        ui::display_status(&format!("Branching {}/{}", project, package.name));
        let target = self
            .build_service
            .branch(project, &package.name, &home, &branch_name)?;

        let (dir, scratch) = match &self.options.output_dir {
            Some(out) => (out.join(&target.package), None),
            None => {
                let scratch = tempfile::Builder::new()
                    .prefix(&format!("{}-", package.name))
                    .tempdir()?;
                (scratch.path().join(&target.package), Some(scratch))
            }
        };

        Ok(Checkout {
            target,
            dir,
            _scratch: scratch,
        })
    }

    fn process(
        &self,
        package: &PackageConfig,
        identity: &Identity,
        committed: &BTreeMap<String, Version>,
        checkout: &Checkout,
    ) -> Result<PackageOutcome> {
        let name = package.name.as_str();
        let dir = checkout.dir.as_path();

        self.build_service.checkout(&checkout.target, dir)?;
        ui::display_status(&format!("Checked out {} in {}", checkout.target, dir.display()));

        let spec_path = specfile::find_spec_file(dir, name)?;
        let spec_text = fs::read_to_string(&spec_path)?;
        let current = specfile::read_version(&spec_text)?;

        let ceiling = self.ceiling(package)?;
        let records = upstream::fetch_releases(self.index, package.listing_path(), name)?;
        let state = PackageState::new(
            name,
            current,
            records.iter().map(|r| r.version.clone()),
            ceiling,
        );

        let candidates = state.candidates();
        let selected = match candidates.selected() {
            Some(v) => v,
            None => {
                ui::display_boundary_warning(&BoundaryWarning::NoUpdate {
                    package: name.to_string(),
                    current,
                    ceiling,
                });
                return Ok(PackageOutcome::NoUpdate);
            }
        };
        ui::display_candidates(name, &current, &ceiling, candidates.versions());

        if candidates.ceiling_unpublished() {
            ui::display_boundary_warning(&BoundaryWarning::UnpublishedCeiling {
                package: name.to_string(),
                version: selected,
            });
        } else {
            match release_date(&records, &selected.to_string()) {
                Some(date) => {
                    tracing::info!(package = name, version = %selected, %date, "released")
                }
                None => ui::display_boundary_warning(&BoundaryWarning::MissingReleaseDate {
                    package: name.to_string(),
                    version: selected,
                }),
            }
        }

        let block = self.changelog(name, identity, candidates.versions())?;
        let text = block.render();

        if self.options.dry_run {
            ui::display_changelog(&text);
            return Ok(PackageOutcome::DryRun(selected));
        }

        let sources = if candidates.ceiling_unpublished() {
            Vec::new()
        } else {
            self.fetch_sources(package, &selected, dir)?
        };

        let mut patched = specfile::patch_version(&spec_text, &current, &selected)?;
        for (other, version) in committed {
            patched = specfile::patch_define(&patched, other, version)?;
        }
        fs::write(&spec_path, patched)?;

        self.review_changelog(name, &spec_path, &text)?;

        if !sources.is_empty() {
            for old in specfile::release_files(dir, name, &current)? {
                self.build_service.remove(dir, &old)?;
            }
            for new in &sources {
                self.build_service.add(dir, new)?;
            }
        }

        let spec_file = spec_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UpdaterError::parse("Spec file name is not valid UTF-8"))?;
        self.build_until_clean(name, dir, spec_file)?;

        self.build_service
            .commit(dir, &format!("Update to {}", selected))?;
        Ok(PackageOutcome::Updated(selected))
    }

    /// Version declared in the upstream tree at the configured reference
    fn ceiling(&self, package: &PackageConfig) -> Result<Version> {
        let reference = &self.options.source_ref;
        let text = self
            .scm
            .read_file(reference, &package.declaration)?
            .ok_or_else(|| {
                UpdaterError::parse(format!(
                    "{} does not exist at upstream {}",
                    package.declaration, reference
                ))
            })?;
        parse_declaration(DeclarationFormat::for_path(&package.declaration), &text)
    }

    fn changelog(
        &self,
        package: &str,
        identity: &Identity,
        versions: &[Version],
    ) -> Result<ChangelogBlock> {
        let tags = git::resolve_tags(self.scm, package, versions)?;

        let mut entries = Vec::with_capacity(versions.len());
        for version in versions {
            let raw = match tags.get(version) {
                Some(commit) => Some(self.scm.show_commit(commit)?),
                None => None,
            };
            let (entry, origin) = self.formatter.entry(raw.as_deref(), package, *version);

            let package = package.to_string();
            let version = *version;
            match origin {
                EntryOrigin::Release => {}
                EntryOrigin::Untagged => {
                    ui::display_boundary_warning(&BoundaryWarning::MissingTag { package, version })
                }
                EntryOrigin::EmptyMessage => {
                    ui::display_boundary_warning(&BoundaryWarning::EmptyReleaseNotes {
                        package,
                        version,
                    })
                }
            }
            entries.push(entry);
        }

        Ok(ChangelogBlock::new(self.now(), identity.display(), entries))
    }

    /// Download and verify the release tarball and its signature.
    ///
    /// Returns the names of the files placed in the checkout.
    fn fetch_sources(
        &self,
        package: &PackageConfig,
        version: &Version,
        dir: &Path,
    ) -> Result<Vec<String>> {
        let name = package.name.as_str();
        let tarball = format!("{}-{}.tar.gz", name, version);
        let signature = format!("{}-{}.tar.asc", name, version);

        for file in [&tarball, &signature] {
            let remote = format!("{}/{}", package.listing_path(), file);
            ui::display_status(&format!("Downloading {}", file));
            self.index.download(&remote, &dir.join(file))?;
        }

        // The signature covers the uncompressed tarball
        let scratch = tempfile::tempdir()?;
        let tar = scratch.path().join(format!("{}-{}.tar", name, version));
        verify::gunzip(&dir.join(&tarball), &tar)?;

        let keyring_path = dir.join(format!("{}.keyring", name));
        let keyring = keyring_path.is_file().then_some(keyring_path.as_path());
        self.verifier.verify(&tar, &dir.join(&signature), keyring)?;
        ui::display_success(&format!("Verified signature of {}", tarball));

        Ok(vec![tarball, signature])
    }

    /// Suspend for changelog review, then prepend the edited block.
    fn review_changelog(&self, package: &str, spec_path: &Path, text: &str) -> Result<()> {
        let draft = tempfile::Builder::new()
            .prefix(&format!("{}-", package))
            .suffix(".changes")
            .tempfile()?;
        fs::write(draft.path(), text)?;

        if self.operator.review_changelog(draft.path())? == Resumption::Abort {
            return Err(UpdaterError::aborted(format!(
                "changelog review of {} was abandoned",
                package
            )));
        }

        let edited = fs::read_to_string(draft.path())?;
        let changes = spec_path.with_extension("changes");
        specfile::prepend_changes(&changes, &edited)
    }

    /// Build until it passes, handing over to the operator after each failure.
    fn build_until_clean(&self, package: &str, dir: &Path, spec_file: &str) -> Result<()> {
        let mut attempt = 1;
        loop {
            ui::display_status(&format!("Building {} (attempt {})", spec_file, attempt));
            let result = self.build_service.build(dir, spec_file)?;
            if result.success {
                ui::display_success(&format!("{} builds", package));
                return Ok(());
            }
            tracing::warn!(package, attempt, "build failed");
            match self.operator.fix_build(dir, &result.tail(BUILD_LOG_TAIL))? {
                Resumption::Continue => attempt += 1,
                Resumption::Abort => {
                    return Err(UpdaterError::aborted(format!(
                        "build of {} abandoned after {} attempt(s)",
                        package, attempt
                    )))
                }
            }
        }
    }

    /// Delete the branch and the checkout of a package that was not committed.
    fn cleanup(&self, package: &str, checkout: &Checkout) {
        let message = format!(
            "Deleting package {} as part of automated update",
            checkout.target.package
        );
        if let Err(e) = self.build_service.delete(&checkout.target, &message) {
            ui::display_boundary_warning(&BoundaryWarning::CleanupFailed {
                package: package.to_string(),
                reason: e.to_string(),
            });
        }
        if checkout.dir.exists() {
            if let Err(e) = fs::remove_dir_all(&checkout.dir) {
                ui::display_boundary_warning(&BoundaryWarning::CleanupFailed {
                    package: package.to_string(),
                    reason: e.to_string(),
                });
            }
        }
        tracing::debug!(package, target = %checkout.target, "cleaned up");
    }
}
