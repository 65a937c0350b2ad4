//! Manifest loader

use crate::error::{ManifestError, Result};
use crate::model::Manifest;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Read and parse a manifest file.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    debug!("Reading manifest");
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let manifest = parse_manifest(&content)?;
    info!(services = manifest.services.len(), "Manifest loaded");

    Ok(manifest)
}

/// Parse manifest YAML and name each service after its key.
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    let mut manifest: Manifest = serde_yaml::from_str(content)?;

    for (name, service) in manifest.services.iter_mut() {
        service.name = name.clone();
    }

    Ok(manifest)
}
