//! Persistent build cache store
//!
//! A build may leave reusable artifacts under [`IMAGE_CACHE_PATH`] inside the
//! image. After a successful build that directory is extracted into
//! `<cache root>/<hash>`; before the next build with the same hash it is
//! staged back into `<project root>/.cache/build` where the Dockerfile can
//! pick it up. Everything here is best-effort: failures are reported to the
//! sink and never abort the run.

use crate::error::BuildError;
use crate::runner::{CommandRunner, DockerCommand, RunnerOptions};
use crate::sink::OutputSink;
use crate::transfer::copy_dir;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Cache directory inside built images.
pub const IMAGE_CACHE_PATH: &str = "/var/cache/build";

/// Local staging directory, relative to the project root.
pub const STAGING_CACHE_DIR: &str = ".cache/build";

/// Staging directory for a project.
pub fn staging_dir(project_root: &Path) -> PathBuf {
    project_root.join(STAGING_CACHE_DIR)
}

/// Suppresses the "no such file or directory" noise a cold cache produces.
pub fn is_missing_cache_line(line: &str) -> bool {
    line.contains("no such file or directory")
        && (line.contains(IMAGE_CACHE_PATH) || line.contains(STAGING_CACHE_DIR))
}

/// Hash-keyed directory of persisted build caches.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn entry_path(&self, hash: &str) -> PathBuf {
        self.root.join(hash)
    }

    /// Stage the entry for `hash` into `staging`.
    ///
    /// Returns `true` when a cache entry was copied. A missing entry is a
    /// normal cache miss.
    pub fn restore(&self, hash: &str, staging: &Path, sink: &dyn OutputSink) -> bool {
        let entry = self.entry_path(hash);

        match fs::metadata(&entry) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(hash, "Build cache miss");
                return false;
            }
            Err(e) => {
                sink.line(&BuildError::cache(e.into()).to_string());
                return false;
            }
        }

        if let Err(e) = fs::remove_dir_all(staging) {
            if e.kind() != io::ErrorKind::NotFound {
                sink.line(&BuildError::cache(e.into()).to_string());
            }
        }

        match copy_dir(&entry, staging) {
            Ok(()) => {
                tracing::info!(hash, "Restored build cache");
                true
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(hash, "Build cache vanished during restore: {}", e);
                false
            }
            Err(e) => {
                sink.line(&BuildError::cache(e).to_string());
                false
            }
        }
    }

    /// Extract [`IMAGE_CACHE_PATH`] from `image` into the entry for `hash`.
    ///
    /// Uses a temporary container named after the hash. Returns `true` when
    /// the entry was written.
    pub async fn persist<R: CommandRunner>(
        &self,
        runner: &R,
        sink: &dyn OutputSink,
        hash: &str,
        image: &str,
        options: &RunnerOptions,
    ) -> bool {
        let create = DockerCommand::new(["create", "--name", hash, image]);
        if let Err(e) = runner.run(sink, &create, options).await {
            sink.line(&BuildError::cache(e).to_string());
        }

        let entry = self.entry_path(hash);
        if let Err(e) = fs::remove_dir_all(&entry) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove stale cache {}: {}", entry.display(), e);
            }
        }
        if let Err(e) = fs::create_dir_all(&self.root) {
            sink.line(&BuildError::cache(e.into()).to_string());
        }

        let source = format!("{}:{}", hash, IMAGE_CACHE_PATH);
        let copy = DockerCommand::new([
            "cp".to_string(),
            source,
            entry.to_string_lossy().into_owned(),
        ]);
        let persisted = match runner.run(sink, &copy, options).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Cache extraction failed: {}", e);
                sink.line("ignoring build cache");
                false
            }
        };

        let remove = DockerCommand::new(["rm", hash]);
        if let Err(e) = runner.run(sink, &remove, options).await {
            sink.line(&BuildError::cache(e).to_string());
        }

        persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BufferSink;
    use tempfile::tempdir;

    #[test]
    fn test_is_missing_cache_line() {
        assert!(is_missing_cache_line(
            "COPY failed: stat /var/cache/build: no such file or directory"
        ));
        assert!(is_missing_cache_line(
            "lstat /tmp/app/.cache/build: no such file or directory"
        ));
        assert!(!is_missing_cache_line("Step 3/7 : COPY . /app"));
        assert!(!is_missing_cache_line(
            "open /app/main.go: no such file or directory"
        ));
    }

    #[test]
    fn test_restore_miss_is_silent() {
        let temp_dir = tempdir().unwrap();
        let store = CacheStore::new(temp_dir.path().join("store"));
        let staging = temp_dir.path().join("project/.cache/build");
        let sink = BufferSink::new();

        assert!(!store.restore("abc123", &staging, &sink));
        assert!(sink.lines().is_empty());
        assert!(!staging.exists());
    }

    #[test]
    fn test_restore_replaces_staging() {
        let temp_dir = tempdir().unwrap();
        let store = CacheStore::new(temp_dir.path().join("store"));
        let entry = store.entry_path("abc123");
        fs::create_dir_all(entry.join("deps")).unwrap();
        fs::write(entry.join("deps/lib.a"), "cached").unwrap();

        let staging = temp_dir.path().join("project/.cache/build");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("stale.txt"), "stale").unwrap();

        let sink = BufferSink::new();
        assert!(store.restore("abc123", &staging, &sink));

        assert!(sink.lines().is_empty());
        assert!(!staging.join("stale.txt").exists());
        assert_eq!(
            fs::read_to_string(staging.join("deps/lib.a")).unwrap(),
            "cached"
        );
    }

    #[test]
    fn test_restore_copy_failure_reported_not_fatal() {
        let temp_dir = tempdir().unwrap();
        let store = CacheStore::new(temp_dir.path().join("store"));
        fs::create_dir_all(temp_dir.path().join("store")).unwrap();
        // an entry that is a file, not a directory
        fs::write(store.entry_path("abc123"), "corrupt").unwrap();

        let staging = temp_dir.path().join("project/.cache/build");
        let sink = BufferSink::new();

        assert!(!store.restore("abc123", &staging, &sink));
        assert!(sink.contains("cache error: source is not a directory"));
    }
}
