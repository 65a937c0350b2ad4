//! Build argument discovery
//!
//! Scans a Dockerfile for `ARG NAME[=default]` declarations so matching
//! values from the run environment can be forwarded as `--build-arg`.

use crate::error::{BuildError, Result};
use std::path::Path;

const ARG_DIRECTIVE: &str = "ARG";

/// Names of all build arguments declared in `dockerfile`, in order of appearance.
pub fn scan_build_args(dockerfile: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(dockerfile).map_err(|source| BuildError::ReadFile {
        path: dockerfile.to_path_buf(),
        source,
    })?;

    Ok(parse_build_args(&content))
}

/// Extract declared argument names from Dockerfile text.
pub fn parse_build_args(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            if tokens.next() != Some(ARG_DIRECTIVE) {
                return None;
            }
            let declaration = tokens.next()?;
            let name = declaration
                .split_once('=')
                .map_or(declaration, |(name, _)| name);
            Some(name.to_string())
        })
        .collect()
}
