use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cache directory not found")]
    CacheDirNotFound,

    #[error(
        "manifest not found. Looked for:\n\
        - current directory: dockyard.yml, dockyard.yaml, docker-compose.yml, docker-compose.yaml\n\
        or set DOCKYARD_MANIFEST to the manifest path"
    )]
    ManifestNotFound,

    #[error("failed to read environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("invalid environment assignment '{0}' (expected KEY=VALUE)")]
    InvalidAssignment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
