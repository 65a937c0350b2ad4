use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read manifest: {path}\nreason: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("service '{service}' depends on unknown service '{dependency}'")]
    UnknownDependency { service: String, dependency: String },

    #[error("circular dependency detected: {0}")]
    CircularDependency(String),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
