use dockyard_build::{BuildError, CommandRunner, DockerCommand, OutputSink, RunnerOptions};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Records every command instead of running it.
#[derive(Default)]
pub struct FakeRunner {
    commands: Mutex<Vec<Vec<String>>>,
    local_images: HashSet<String>,
    failing: Vec<String>,
    build_output: Vec<String>,
}

#[allow(dead_code)]
impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `image` is present locally.
    pub fn with_local_image(mut self, image: &str) -> Self {
        self.local_images.insert(image.to_string());
        self
    }

    /// Fail every command whose rendered line starts with `prefix`
    /// (e.g. `"docker pull"`).
    pub fn failing(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    /// Lines every `build` command prints.
    pub fn with_build_output(mut self, lines: &[&str]) -> Self {
        self.build_output = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.commands.lock().unwrap().clone()
    }

    /// Rendered command lines, e.g. `docker tag a b`.
    pub fn command_lines(&self) -> Vec<String> {
        self.commands()
            .iter()
            .map(|args| format!("docker {}", args.join(" ")))
            .collect()
    }

    pub fn invocations(&self, subcommand: &str) -> Vec<Vec<String>> {
        self.commands()
            .into_iter()
            .filter(|args| args.first().map(String::as_str) == Some(subcommand))
            .collect()
    }

    fn record(&self, command: &DockerCommand) -> Result<(), BuildError> {
        self.commands.lock().unwrap().push(command.args().to_vec());

        let line = command.to_string();
        if self.failing.iter().any(|prefix| line.starts_with(prefix)) {
            return Err(BuildError::CommandFailed {
                command: line,
                status: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        sink: &dyn OutputSink,
        command: &DockerCommand,
        options: &RunnerOptions,
    ) -> Result<(), BuildError> {
        if command.subcommand() == Some("build") {
            for line in &self.build_output {
                if let Some(line) = options.apply(line) {
                    sink.line(&line);
                }
            }
        }
        self.record(command)
    }

    async fn combined_output(&self, command: &DockerCommand) -> Result<String, BuildError> {
        self.record(command)?;

        match command.args() {
            [images, q, image] if images == "images" && q == "-q" => {
                if self.local_images.contains(image) {
                    Ok("4f5a1b2c3d4e\n".to_string())
                } else {
                    Ok(String::new())
                }
            }
            _ => Ok(String::new()),
        }
    }
}

/// A manifest directory with build contexts.
pub struct TestProject {
    pub root: TempDir,
}

#[allow(dead_code)]
impl TestProject {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// Write `<context>/Dockerfile`.
    pub fn write_dockerfile(&self, context: &str, content: &str) -> PathBuf {
        self.write_file(&format!("{}/Dockerfile", context), content)
    }

    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn exists(&self, relative: &str) -> bool {
        Path::new(&self.root.path().join(relative)).exists()
    }
}
