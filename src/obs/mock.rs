use crate::domain::Identity;
use crate::error::{Result, UpdaterError};
use crate::obs::{BranchTarget, BuildResult, BuildService};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

/// In-memory build service for testing the pipeline without a server.
///
/// Every call is appended to a log readable through [MockBuildService::calls].
/// A checkout materialises the files registered with
/// [MockBuildService::add_package_file] for the branched package.
pub struct MockBuildService {
    identity: Identity,
    files: HashMap<String, Vec<(String, String)>>,
    branches: RefCell<HashMap<String, String>>,
    build_results: RefCell<VecDeque<BuildResult>>,
    failing: HashSet<String>,
    calls: RefCell<Vec<String>>,
}

impl MockBuildService {
    pub fn new(identity: Identity) -> Self {
        MockBuildService {
            identity,
            files: HashMap::new(),
            branches: RefCell::new(HashMap::new()),
            build_results: RefCell::new(VecDeque::new()),
            failing: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// File written into every checkout of a branch of `package`
    pub fn add_package_file(&mut self, package: &str, name: &str, content: impl Into<String>) {
        self.files
            .entry(package.to_string())
            .or_default()
            .push((name.to_string(), content.into()));
    }

    /// Queue the outcome of the next build. Builds succeed once the queue is empty.
    pub fn push_build_result(&self, success: bool, log: impl Into<String>) {
        self.build_results.borrow_mut().push_back(BuildResult {
            success,
            log: log.into(),
        });
    }

    /// Make every call of `operation` (e.g. `"checkout"`) fail
    pub fn fail_on(&mut self, operation: &str) {
        self.failing.insert(operation.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of recorded calls of one operation
    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split(' ').next() == Some(operation))
            .count()
    }

    fn record(&self, operation: &str, detail: String) -> Result<()> {
        let line = if detail.is_empty() {
            operation.to_string()
        } else {
            format!("{} {}", operation, detail)
        };
        self.calls.borrow_mut().push(line.clone());
        if self.failing.contains(operation) {
            return Err(UpdaterError::command(
                format!("osc {}", line),
                "Server returned an error: HTTP Error 500",
            ));
        }
        Ok(())
    }
}

impl BuildService for MockBuildService {
    fn whoami(&self) -> Result<Identity> {
        self.record("whoami", String::new())?;
        Ok(self.identity.clone())
    }

    fn branch(
        &self,
        project: &str,
        package: &str,
        target_project: &str,
        target_package: &str,
    ) -> Result<BranchTarget> {
        self.record(
            "branch",
            format!("{} {} {} {}", project, package, target_project, target_package),
        )?;
        self.branches
            .borrow_mut()
            .insert(target_package.to_string(), package.to_string());
        Ok(BranchTarget::new(target_project, target_package))
    }

    fn checkout(&self, target: &BranchTarget, dir: &Path) -> Result<()> {
        self.record("checkout", target.to_string())?;
        fs::create_dir_all(dir)?;
        let branches = self.branches.borrow();
        let source = branches
            .get(&target.package)
            .map(String::as_str)
            .unwrap_or(target.package.as_str());
        for (name, content) in self.files.get(source).into_iter().flatten() {
            fs::write(dir.join(name), content)?;
        }
        Ok(())
    }

    fn add(&self, _workdir: &Path, file: &str) -> Result<()> {
        self.record("add", file.to_string())
    }

    fn remove(&self, workdir: &Path, file: &str) -> Result<()> {
        self.record("remove", file.to_string())?;
        let path = workdir.join(file);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn build(&self, _workdir: &Path, spec_file: &str) -> Result<BuildResult> {
        self.record("build", spec_file.to_string())?;
        Ok(self
            .build_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(BuildResult {
                success: true,
                log: "build succeeded".to_string(),
            }))
    }

    fn commit(&self, _workdir: &Path, message: &str) -> Result<()> {
        self.record("commit", message.to_string())
    }

    fn delete(&self, target: &BranchTarget, _message: &str) -> Result<()> {
        self.record("delete", target.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("jdoe", Some("jdoe@suse.com".to_string()))
    }

    #[test]
    fn test_checkout_materialises_files() {
        let mut obs = MockBuildService::new(identity());
        obs.add_package_file("talloc", "talloc.spec", "Version: 2.3.0\n");

        let target = obs
            .branch("net", "talloc", "home:jdoe:branches:net", "talloc99")
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("talloc99");
        obs.checkout(&target, &work).unwrap();

        assert_eq!(
            fs::read_to_string(work.join("talloc.spec")).unwrap(),
            "Version: 2.3.0\n"
        );
        assert_eq!(obs.count("branch"), 1);
        assert_eq!(obs.count("checkout"), 1);
    }

    #[test]
    fn test_build_results_are_queued() {
        let obs = MockBuildService::new(identity());
        obs.push_build_result(false, "error: missing header");
        let dir = tempfile::tempdir().unwrap();

        assert!(!obs.build(dir.path(), "talloc.spec").unwrap().success);
        assert!(obs.build(dir.path(), "talloc.spec").unwrap().success);
    }

    #[test]
    fn test_fail_on_operation() {
        let mut obs = MockBuildService::new(identity());
        obs.fail_on("commit");
        let dir = tempfile::tempdir().unwrap();

        let err = obs.commit(dir.path(), "Update to 2.3.1").unwrap_err();
        assert!(err.to_string().contains("HTTP Error 500"));
        assert_eq!(obs.calls(), vec!["commit Update to 2.3.1".to_string()]);
    }

    #[test]
    fn test_remove_deletes_file() {
        let obs = MockBuildService::new(identity());
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("talloc-2.3.0.tar"), "old").unwrap();

        obs.remove(dir.path(), "talloc-2.3.0.tar").unwrap();
        assert!(!dir.path().join("talloc-2.3.0.tar").exists());
    }
}
