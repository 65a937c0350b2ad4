use std::collections::HashMap;
use std::path::PathBuf;

/// Options for one orchestration run
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Reuse layer caches and local images; `false` passes `--no-cache` and always pulls
    pub cache: bool,
    /// Root of the persistent, hash-keyed build cache store
    pub cache_dir: Option<PathBuf>,
    /// Values forwarded to Dockerfile `ARG`s of the same name
    pub environment: HashMap<String, String>,
    /// Restrict the run to this service and its dependencies
    pub service: Option<String>,
    /// Echo every command line to the output sink
    pub verbose: bool,
}

impl BuildOptions {
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
