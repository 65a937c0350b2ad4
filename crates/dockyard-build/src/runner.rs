//! Container tool invocation
//!
//! Every interaction with the container engine goes through a
//! [`CommandRunner`]. [`ProcessRunner`] shells out to the real binary;
//! tests substitute a recording fake.

use crate::error::{BuildError, Result};
use crate::sink::OutputSink;
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Rewrites or suppresses (`None`) one line of command output.
pub type LineFilter = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Per-invocation runner options
#[derive(Clone, Default)]
pub struct RunnerOptions {
    /// Echo the command line to the sink before running it
    pub verbose: bool,
    pub filters: Vec<LineFilter>,
}

impl fmt::Debug for RunnerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerOptions")
            .field("verbose", &self.verbose)
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl RunnerOptions {
    pub fn verbose(verbose: bool) -> Self {
        Self {
            verbose,
            filters: Vec::new(),
        }
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Run `line` through every filter; `None` means the line is dropped.
    pub fn apply(&self, line: &str) -> Option<String> {
        let mut current = line.to_string();
        for filter in &self.filters {
            current = filter(&current)?;
        }
        Some(current)
    }
}

/// Arguments for one container tool invocation, e.g. `["tag", "a", "b"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCommand {
    args: Vec<String>,
}

impl DockerCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The subcommand (`build`, `tag`, `pull`, ...).
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for DockerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "docker {}", self.args.join(" "))
    }
}

/// Runs container tool commands.
pub trait CommandRunner {
    /// Run `command`, streaming its filtered output to `sink`.
    fn run(
        &self,
        sink: &dyn OutputSink,
        command: &DockerCommand,
        options: &RunnerOptions,
    ) -> impl Future<Output = Result<()>>;

    /// Run `command` and return its combined stdout and stderr.
    fn combined_output(&self, command: &DockerCommand) -> impl Future<Output = Result<String>>;
}

/// Runs commands as child processes of the real container tool.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use another docker-compatible binary (e.g. `podman`).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_line(&self, command: &DockerCommand) -> String {
        format!("{} {}", self.program, command.args().join(" "))
    }

    fn spawn_error(&self, err: std::io::Error) -> BuildError {
        if err.kind() == std::io::ErrorKind::NotFound {
            BuildError::ToolNotFound {
                program: self.program.clone(),
            }
        } else {
            BuildError::Io(err)
        }
    }

    /// Forward both pipes to `sink` line by line until each is closed.
    ///
    /// Lines are read as bytes; invalid UTF-8 is replaced, never an error.
    async fn stream_output<O, E>(
        sink: &dyn OutputSink,
        options: &RunnerOptions,
        stdout: O,
        stderr: E,
    ) -> std::io::Result<()>
    where
        O: AsyncRead + Unpin,
        E: AsyncRead + Unpin,
    {
        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let mut out_line = Vec::new();
        let mut err_line = Vec::new();
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout.read_until(b'\n', &mut out_line), if stdout_open => {
                    if read? == 0 {
                        stdout_open = false;
                    } else {
                        Self::emit(sink, options, &out_line);
                    }
                    out_line.clear();
                }
                read = stderr.read_until(b'\n', &mut err_line), if stderr_open => {
                    if read? == 0 {
                        stderr_open = false;
                    } else {
                        Self::emit(sink, options, &err_line);
                    }
                    err_line.clear();
                }
            }
        }

        Ok(())
    }

    fn emit(sink: &dyn OutputSink, options: &RunnerOptions, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        if let Some(line) = options.apply(&line) {
            sink.line(&line);
        }
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        sink: &dyn OutputSink,
        command: &DockerCommand,
        options: &RunnerOptions,
    ) -> Result<()> {
        let command_line = self.command_line(command);
        if options.verbose {
            sink.line(&format!("$ {}", command_line));
        }
        tracing::debug!("Running: {}", command_line);

        let mut child = Command::new(&self.program)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr was not captured"))?;

        if let Err(e) = Self::stream_output(sink, options, stdout, stderr).await {
            let _ = child.kill().await;
            return Err(e.into());
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(BuildError::CommandFailed {
                command: command_line,
                status: status.to_string(),
            });
        }

        Ok(())
    }

    async fn combined_output(&self, command: &DockerCommand) -> Result<String> {
        let command_line = self.command_line(command);
        tracing::debug!("Running: {}", command_line);

        let output = Command::new(&self.program)
            .args(command.args())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(BuildError::CommandFailed {
                command: command_line,
                status: output.status.to_string(),
            });
        }

        Ok(combined)
    }
}
