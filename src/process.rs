use crate::error::{Result, UpdaterError};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stderr when it carries anything, otherwise stdout.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Runs external programs synchronously.
///
/// Without a timeout a command blocks until it exits. With one, a command that
/// outlives it is killed and reported as [`UpdaterError::Timeout`].
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        CommandRunner { timeout }
    }

    pub fn with_timeout_secs(secs: Option<u64>) -> Self {
        CommandRunner::new(secs.map(Duration::from_secs))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run a command and capture its output. A non-zero exit is not an error here.
    pub fn run<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput> {
        let rendered = render(program, args);
        tracing::debug!(command = %rendered, "running");

        let mut cmd = build(program, args, cwd);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| UpdaterError::command(&rendered, format!("cannot execute: {}", e)))?;

        let output = match self.timeout {
            None => {
                let output = child.wait_with_output()?;
                CommandOutput {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }
            }
            Some(limit) => wait_with_deadline(child, limit, &rendered)?,
        };

        tracing::debug!(command = %rendered, code = ?output.code, "finished");
        Ok(output)
    }

    /// Run a command and fail unless it exits cleanly with an empty error stream.
    pub fn run_checked<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput> {
        let output = self.run(program, args, cwd)?;
        if !output.success() || !output.stderr.trim().is_empty() {
            return Err(UpdaterError::command(
                render(program, args),
                output.diagnostic().to_string(),
            ));
        }
        Ok(output)
    }

    /// Run a command attached to the terminal and wait for it, however long it takes.
    pub fn run_interactive<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
        cwd: Option<&Path>,
    ) -> Result<ExitStatus> {
        let rendered = render(program, args);
        tracing::debug!(command = %rendered, "handing terminal to operator");

        let status = build(program, args, cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| UpdaterError::command(&rendered, format!("cannot execute: {}", e)))?;
        Ok(status)
    }
}

fn build<S: AsRef<str>>(program: &str, args: &[S], cwd: Option<&Path>) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|a| a.as_ref()));
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd
}

/// Printable command line for diagnostics.
pub fn render<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg.as_ref());
    }
    line
}

fn wait_with_deadline(mut child: Child, limit: Duration, rendered: &str) -> Result<CommandOutput> {
    // Drain both pipes while polling so a chatty child cannot fill them and stall.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + limit;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(UpdaterError::Timeout {
                command: rendered.to_string(),
                seconds: limit.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(CommandOutput {
        code: status.code(),
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
