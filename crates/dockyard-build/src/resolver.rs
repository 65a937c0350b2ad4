use crate::build_args::scan_build_args;
use crate::error::Result;
use crate::transfer::clean;
use dockyard_core::Service;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// Resolves build paths and arguments relative to the manifest directory.
pub struct BuildResolver {
    project_root: PathBuf,
}

impl BuildResolver {
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Build context directory.
    ///
    /// Defaults to the project root when the service names no context.
    pub fn resolve_context(&self, service: &Service) -> PathBuf {
        match service.build_context() {
            Some(context) => clean(&self.project_root.join(context)),
            None => clean(&self.project_root),
        }
    }

    /// Dockerfile path, relative to the build context.
    ///
    /// Priority:
    /// 1. `build.dockerfile`
    /// 2. the service's legacy `dockerfile`
    /// 3. `Dockerfile`
    pub fn resolve_dockerfile(&self, service: &Service, context: &Path) -> PathBuf {
        let dockerfile = service
            .dockerfile_override()
            .unwrap_or(Path::new(DEFAULT_DOCKERFILE));
        clean(&context.join(dockerfile))
    }

    /// Merge build arguments.
    ///
    /// Starts from the service's explicit arguments; every `ARG` the
    /// Dockerfile declares that is present in `environment` is set or
    /// overridden from there. The result is sorted by name.
    pub fn resolve_build_args(
        &self,
        service: &Service,
        dockerfile: &Path,
        environment: &HashMap<String, String>,
    ) -> Result<BTreeMap<String, String>> {
        let mut args: BTreeMap<String, String> = service.build_args().into_iter().collect();

        for name in scan_build_args(dockerfile)? {
            if let Some(value) = environment.get(&name) {
                args.insert(name, value.clone());
            }
        }

        for key in args.keys() {
            self.validate_build_arg(key);
        }

        Ok(args)
    }

    /// Warn about build arguments that look like secrets.
    pub fn validate_build_arg(&self, key: &str) {
        let sensitive_patterns = ["password", "token", "secret", "api_key", "private_key"];

        let key_lower = key.to_lowercase();
        if sensitive_patterns.iter().any(|p| key_lower.contains(p)) {
            tracing::warn!(
                "Build argument '{}' may contain sensitive data; \
                 build arguments are recorded in the image history",
                key
            );
        }
    }
}

/// `--build-arg NAME=VALUE` pairs in name order.
pub fn build_arg_flags(args: &BTreeMap<String, String>) -> Vec<String> {
    args.iter()
        .flat_map(|(name, value)| ["--build-arg".to_string(), format!("{}={}", name, value)])
        .collect()
}
