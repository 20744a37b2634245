//! Package-repository client contract
//!
//! The update pipeline drives the build service through [BuildService]:
//! branching a package into the operator's home project, checking it out,
//! tracking file additions and removals, test building, committing and
//! deleting abandoned branches.
//!
//! - [osc::OscClient]: drives the `osc` command line client
//! - [mock::MockBuildService]: records calls and materialises fixture files

pub mod mock;
pub mod osc;

pub use mock::MockBuildService;
pub use osc::OscClient;

use crate::domain::Identity;
use crate::error::Result;
use regex::Regex;
use std::path::Path;

/// A branched package in the build service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTarget {
    pub project: String,
    pub package: String,
}

impl BranchTarget {
    pub fn new(project: impl Into<String>, package: impl Into<String>) -> Self {
        BranchTarget {
            project: project.into(),
            package: package.into(),
        }
    }
}

impl std::fmt::Display for BranchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project, self.package)
    }
}

/// Outcome of a local test build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub success: bool,
    pub log: String,
}

impl BuildResult {
    /// Last `lines` lines of the build log
    pub fn tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.log.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// Operations consumed from the build service
pub trait BuildService {
    /// Who the client is authenticated as
    fn whoami(&self) -> Result<Identity>;

    /// Branch `project/package` to `target_project/target_package`
    fn branch(
        &self,
        project: &str,
        package: &str,
        target_project: &str,
        target_package: &str,
    ) -> Result<BranchTarget>;

    /// Check out a branched package into `dir`
    fn checkout(&self, target: &BranchTarget, dir: &Path) -> Result<()>;

    /// Start tracking `file` in the working copy
    fn add(&self, workdir: &Path, file: &str) -> Result<()>;

    /// Stop tracking and delete `file` in the working copy
    fn remove(&self, workdir: &Path, file: &str) -> Result<()>;

    /// Build `spec_file` locally. A failing build is `Ok` with `success: false`.
    fn build(&self, workdir: &Path, spec_file: &str) -> Result<BuildResult>;

    /// Check the working copy in
    fn commit(&self, workdir: &Path, message: &str) -> Result<()>;

    /// Delete a branched package from the server
    fn delete(&self, target: &BranchTarget, message: &str) -> Result<()>;
}

/// Home project a branch of `project` lands in for `user`.
pub fn branch_project(user: &str, project: &str) -> String {
    format!("home:{}:branches:{}", user, project)
}

/// Find the branch target in `osc branch` output.
pub fn parse_branch_output(stdout: &str) -> Option<BranchTarget> {
    let re = Regex::new(
        r"A working copy of the branched package can be checked out with:\s*\n\s*\n?\s*osc co ([^/\s]+)/(\S+)",
    )
    .ok()?;
    let caps = re.captures(stdout)?;
    Some(BranchTarget::new(&caps[1], &caps[2]))
}

/// Parse `osc whois` output: `login: "Real Name" <email>`.
pub fn parse_whois(stdout: &str) -> Option<Identity> {
    let re = Regex::new(r#"^([\w.+-]+):\s*(?:"[^"]*"\s*)?(?:<([^>]+)>)?"#).ok()?;
    let caps = re.captures(stdout.trim())?;
    let email = caps
        .get(2)
        .map(|m| m.as_str().to_string())
        .filter(|e| !e.is_empty());
    Some(Identity::new(&caps[1], email))
}
