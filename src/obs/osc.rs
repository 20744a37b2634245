use crate::domain::Identity;
use crate::error::{Result, UpdaterError};
use crate::obs::{parse_branch_output, parse_whois, BranchTarget, BuildResult, BuildService};
use crate::process::{render, CommandRunner};
use std::path::Path;

/// [BuildService] backed by the `osc` command line client.
///
/// Every server-side call passes `-A <api_url>`. Working-copy calls run
/// inside the checkout directory. Builds get their own runner so a slow
/// build can be given a longer (or no) timeout than the quick calls.
pub struct OscClient {
    program: String,
    api_url: String,
    repository: String,
    arch: String,
    runner: CommandRunner,
    build_runner: CommandRunner,
}

impl OscClient {
    pub fn new(
        api_url: impl Into<String>,
        repository: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        OscClient {
            program: "osc".to_string(),
            api_url: api_url.into(),
            repository: repository.into(),
            arch: arch.into(),
            runner: CommandRunner::default(),
            build_runner: CommandRunner::default(),
        }
    }

    /// Use a different client executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_runners(mut self, runner: CommandRunner, build_runner: CommandRunner) -> Self {
        self.runner = runner;
        self.build_runner = build_runner;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn remote_args(&self, rest: &[&str]) -> Vec<String> {
        let mut args = vec!["-A".to_string(), self.api_url.clone()];
        args.extend(rest.iter().map(|s| s.to_string()));
        args
    }
}

impl BuildService for OscClient {
    fn whoami(&self) -> Result<Identity> {
        let args = self.remote_args(&["whois"]);
        let output = self.runner.run_checked(&self.program, &args, None)?;
        parse_whois(&output.stdout).ok_or_else(|| {
            UpdaterError::command(render(&self.program, &args), output.stdout.trim().to_string())
        })
    }

    fn branch(
        &self,
        project: &str,
        package: &str,
        target_project: &str,
        target_package: &str,
    ) -> Result<BranchTarget> {
        let args = self.remote_args(&["branch", project, package, target_project, target_package]);
        let output = self.runner.run(&self.program, &args, None)?;
        // osc prints progress on stderr even on success, so judge by stdout
        match parse_branch_output(&output.stdout) {
            Some(target) => {
                tracing::info!(%target, "branched {}/{}", project, package);
                Ok(target)
            }
            None => Err(UpdaterError::command(
                render(&self.program, &args),
                output.diagnostic().to_string(),
            )),
        }
    }

    fn checkout(&self, target: &BranchTarget, dir: &Path) -> Result<()> {
        let dir = dir.to_string_lossy();
        let args = self.remote_args(&[
            "co",
            target.project.as_str(),
            target.package.as_str(),
            "-o",
            dir.as_ref(),
        ]);
        self.runner.run_checked(&self.program, &args, None)?;
        Ok(())
    }

    fn add(&self, workdir: &Path, file: &str) -> Result<()> {
        self.runner
            .run_checked(&self.program, &["add", file], Some(workdir))?;
        Ok(())
    }

    fn remove(&self, workdir: &Path, file: &str) -> Result<()> {
        self.runner
            .run_checked(&self.program, &["rm", file], Some(workdir))?;
        Ok(())
    }

    fn build(&self, workdir: &Path, spec_file: &str) -> Result<BuildResult> {
        let args = [
            "build",
            self.repository.as_str(),
            self.arch.as_str(),
            spec_file,
        ];
        let output = self.build_runner.run(&self.program, &args, Some(workdir))?;
        let mut log = output.stdout;
        if !output.stderr.is_empty() {
            if !log.is_empty() && !log.ends_with('\n') {
                log.push('\n');
            }
            log.push_str(&output.stderr);
        }
        Ok(BuildResult {
            success: output.code == Some(0),
            log,
        })
    }

    fn commit(&self, workdir: &Path, message: &str) -> Result<()> {
        self.runner
            .run_checked(&self.program, &["commit", "-m", message], Some(workdir))?;
        Ok(())
    }

    fn delete(&self, target: &BranchTarget, message: &str) -> Result<()> {
        let args = self.remote_args(&[
            "rdelete",
            target.project.as_str(),
            target.package.as_str(),
            "-m",
            message,
        ]);
        self.runner.run_checked(&self.program, &args, None)?;
        Ok(())
    }
}
