use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// Fatal failure while building, tagging or pulling.
    #[error("build error: {0}")]
    Build(Box<BuildError>),

    /// Cache-store housekeeping failure.
    #[error("cache error: {0}")]
    Cache(Box<BuildError>),

    #[error("{command}: {status}")]
    CommandFailed { command: String, status: String },

    #[error("{program} not found; is it installed and on PATH?")]
    ToolNotFound { program: String },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Manifest error: {0}")]
    Manifest(#[from] dockyard_core::ManifestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    pub fn build(err: BuildError) -> Self {
        BuildError::Build(Box::new(err))
    }

    pub fn cache(err: BuildError) -> Self {
        BuildError::Cache(Box::new(err))
    }

    /// True when the underlying cause is a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        match self {
            BuildError::Build(inner) | BuildError::Cache(inner) => inner.is_not_found(),
            BuildError::ReadFile { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            BuildError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// User-facing message with a hint on how to fix the problem.
    pub fn user_message(&self) -> String {
        match self {
            BuildError::Build(inner) => format!("build error: {}", inner.user_message()),
            BuildError::ReadFile { path, source } => {
                format!(
                    "Could not read build definition: {} ({})\n\
                     \n\
                     Check the `build.context` and `build.dockerfile` entries of the service.",
                    path.display(),
                    source
                )
            }
            BuildError::ToolNotFound { program } => {
                format!(
                    "{} was not found.\n\
                     \n\
                     Install it, or point DOCKYARD_DOCKER at a compatible binary.",
                    program
                )
            }
            BuildError::CommandFailed { command, status } => {
                format!(
                    "Command failed ({}):\n  {}\n\
                     \n\
                     See the output above for details.",
                    status, command
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_display_keeps_phase_prefix() {
        let err = BuildError::build(BuildError::CommandFailed {
            command: "docker pull redis:latest".to_string(),
            status: "exit status: 1".to_string(),
        });

        assert_eq!(
            err.to_string(),
            "build error: docker pull redis:latest: exit status: 1"
        );
        let message = err.user_message();
        assert!(message.starts_with("build error: Command failed (exit status: 1)"));
        assert!(message.contains("docker pull redis:latest"));
    }

    #[test]
    fn test_user_message_hint_for_missing_tool() {
        let err = BuildError::build(BuildError::ToolNotFound {
            program: "podman".to_string(),
        });

        let message = err.user_message();
        assert!(message.starts_with("build error: podman was not found."));
        assert!(message.contains("DOCKYARD_DOCKER"));
    }

    #[test]
    fn test_cache_error_prefix() {
        let err = BuildError::cache(BuildError::NotADirectory(PathBuf::from("/store/abc")));
        assert_eq!(
            err.to_string(),
            "cache error: source is not a directory: /store/abc"
        );
    }
}
