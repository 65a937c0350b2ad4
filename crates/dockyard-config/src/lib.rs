pub mod error;

pub use error::*;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Manifest file names, in lookup priority order.
pub const MANIFEST_CANDIDATES: [&str; 4] = [
    "dockyard.yml",
    "dockyard.yaml",
    "docker-compose.yml",
    "docker-compose.yaml",
];

/// Locate the manifest file.
///
/// Lookup order:
/// 1. `DOCKYARD_MANIFEST` environment variable (direct path)
/// 2. current directory: dockyard.yml, dockyard.yaml, docker-compose.yml, docker-compose.yaml
pub fn find_manifest_file() -> Result<PathBuf> {
    if let Ok(manifest_path) = std::env::var("DOCKYARD_MANIFEST") {
        let path = PathBuf::from(manifest_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "DOCKYARD_MANIFEST points at a missing file: {}",
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;
    find_manifest_file_in(&current_dir)
}

/// Locate the manifest file inside `dir`.
pub fn find_manifest_file_in(dir: &Path) -> Result<PathBuf> {
    MANIFEST_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
        .ok_or(ConfigError::ManifestNotFound)
}

/// Default cache-store root.
///
/// `DOCKYARD_CACHE_DIR` wins; otherwise `<platform cache dir>/dockyard/build`.
pub fn default_cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DOCKYARD_CACHE_DIR") {
        return Ok(PathBuf::from(dir));
    }

    dirs::cache_dir()
        .map(|dir| dir.join("dockyard").join("build"))
        .ok_or(ConfigError::CacheDirNotFound)
}

/// Container tool binary (`DOCKYARD_DOCKER`, default `docker`).
pub fn docker_binary() -> String {
    std::env::var("DOCKYARD_DOCKER")
        .ok()
        .filter(|bin| !bin.trim().is_empty())
        .unwrap_or_else(|| "docker".to_string())
}

/// Load a `.env`-style file into an environment mapping.
///
/// The process environment is left untouched.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let env_error = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let env = dotenvy::from_path_iter(path)
        .map_err(env_error)?
        .collect::<std::result::Result<HashMap<_, _>, _>>()
        .map_err(env_error)?;

    tracing::debug!("Loaded {} variables from {}", env.len(), path.display());
    Ok(env)
}

/// Parse a single `KEY=VALUE` assignment (as given with `-e`).
pub fn parse_assignment(assignment: &str) -> Result<(String, String)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.is_empty() && !key.contains(char::is_whitespace) => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidAssignment(assignment.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_find_manifest_file_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("docker-compose.yml"), "services: {}").unwrap();
        fs::write(temp_dir.path().join("dockyard.yml"), "services: {}").unwrap();

        let result = find_manifest_file_in(temp_dir.path()).unwrap();
        assert!(result.ends_with("dockyard.yml"));
    }

    #[test]
    fn test_find_manifest_file_compose_fallback() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("docker-compose.yaml"), "services: {}").unwrap();

        let result = find_manifest_file_in(temp_dir.path()).unwrap();
        assert!(result.ends_with("docker-compose.yaml"));
    }

    #[test]
    fn test_find_manifest_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();

        let result = find_manifest_file_in(temp_dir.path());
        assert!(matches!(result, Err(ConfigError::ManifestNotFound)));
    }

    #[test]
    #[serial]
    fn test_find_manifest_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manifest = temp_dir.path().join("custom.yml");
        fs::write(&manifest, "services: {}").unwrap();

        temp_env::with_var("DOCKYARD_MANIFEST", Some(manifest.as_os_str()), || {
            let result = find_manifest_file().unwrap();
            assert_eq!(result, manifest);
        });
    }

    #[test]
    #[serial]
    fn test_default_cache_dir_env_override() {
        temp_env::with_var("DOCKYARD_CACHE_DIR", Some("/tmp/dockyard-cache"), || {
            assert_eq!(
                default_cache_dir().unwrap(),
                PathBuf::from("/tmp/dockyard-cache")
            );
        });
    }

    #[test]
    #[serial]
    fn test_docker_binary() {
        temp_env::with_var("DOCKYARD_DOCKER", None::<&str>, || {
            assert_eq!(docker_binary(), "docker");
        });
        temp_env::with_var("DOCKYARD_DOCKER", Some("podman"), || {
            assert_eq!(docker_binary(), "podman");
        });
    }

    fn write_env(content: &str) -> (tempfile::TempDir, PathBuf) {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(".env");
        fs::write(&path, content).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_load_env_file() {
        let (_dir, path) = write_env(
            "\
# comment
TOKEN=secret

export REGION=us-east-1
QUOTED=\"hello world\"
SINGLE='x=y'
EMPTY=
",
        );

        let env = load_env_file(&path).unwrap();
        assert_eq!(env.len(), 5);
        assert_eq!(env["TOKEN"], "secret");
        assert_eq!(env["REGION"], "us-east-1");
        assert_eq!(env["QUOTED"], "hello world");
        assert_eq!(env["SINGLE"], "x=y");
        assert_eq!(env["EMPTY"], "");
    }

    #[test]
    fn test_load_env_file_inline_comment_and_substitution() {
        let (_dir, path) =
            write_env("DOCKYARD_TEST_TOKEN=abc # rotated weekly\nBASE=${DOCKYARD_TEST_TOKEN}-v2\n");

        let env = load_env_file(&path).unwrap();
        assert_eq!(env["DOCKYARD_TEST_TOKEN"], "abc");
        assert_eq!(env["BASE"], "abc-v2");
    }

    #[test]
    fn test_load_env_file_multiline_quoted_value() {
        let (_dir, path) = write_env("KEY=\"line one\nline two\"\nNEXT=1\n");

        let env = load_env_file(&path).unwrap();
        assert_eq!(env["KEY"], "line one\nline two");
        assert_eq!(env["NEXT"], "1");
    }

    #[test]
    fn test_load_env_file_invalid_line() {
        let (_dir, path) = write_env("TOKEN=secret\nnot an assignment\n");

        let result = load_env_file(&path);
        assert!(matches!(result, Err(ConfigError::EnvFile { .. })));
    }

    #[test]
    fn test_load_env_file_missing() {
        let result = load_env_file(Path::new("/nonexistent/.env"));
        assert!(matches!(result, Err(ConfigError::EnvFile { .. })));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("TOKEN=a=b").unwrap(),
            ("TOKEN".to_string(), "a=b".to_string())
        );
        assert!(matches!(
            parse_assignment("TOKEN"),
            Err(ConfigError::InvalidAssignment(_))
        ));
    }
}
