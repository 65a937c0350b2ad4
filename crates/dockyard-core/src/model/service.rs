//! Service definition

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Service definition
///
/// YAML form:
/// ```yaml
/// web:
///   build:
///     context: ./web
///     dockerfile: Dockerfile.dev
///     args:
///       NODE_ENV: production
///   depends_on: [db]
/// db:
///   image: postgres:16
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Key of the service in the manifest; filled in by the loader.
    #[serde(skip)]
    pub name: String,
    /// External image reference. When set, the service is pulled, not built.
    pub image: Option<String>,
    /// Local build specification
    #[serde(default, deserialize_with = "deserialize_build")]
    pub build: Option<BuildConfig>,
    /// Legacy per-service Dockerfile override, used when `build.dockerfile` is absent
    pub dockerfile: Option<PathBuf>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// `name` or `name:alias`
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub environment: HashMap<String, String>,
}

/// Build configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build context, relative to the manifest directory. Defaults to `.`
    pub context: Option<PathBuf>,
    /// Dockerfile path, relative to the build context
    pub dockerfile: Option<PathBuf>,
    /// Explicit build arguments
    #[serde(default)]
    pub args: HashMap<String, String>,
}

/// `build: ./web` is shorthand for `build: { context: ./web }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BuildSpec {
    Context(PathBuf),
    Full(BuildConfig),
}

impl From<BuildSpec> for BuildConfig {
    fn from(spec: BuildSpec) -> Self {
        match spec {
            BuildSpec::Context(context) => BuildConfig {
                context: Some(context),
                ..Default::default()
            },
            BuildSpec::Full(config) => config,
        }
    }
}

fn deserialize_build<'de, D>(deserializer: D) -> Result<Option<BuildConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BuildSpec>::deserialize(deserializer)?.map(BuildConfig::from))
}

impl Service {
    /// Create an empty service with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Canonical destination tag: `{app}/{service}` with `_` replaced by `-`.
    pub fn tag(&self, app_name: &str) -> String {
        format!("{}/{}", app_name, self.name.replace('_', "-"))
    }

    /// Build context as written in the manifest, if any.
    pub fn build_context(&self) -> Option<&Path> {
        self.build.as_ref().and_then(|b| b.context.as_deref())
    }

    /// Dockerfile override: `build.dockerfile` first, then the legacy `dockerfile` key.
    pub fn dockerfile_override(&self) -> Option<&Path> {
        self.build
            .as_ref()
            .and_then(|b| b.dockerfile.as_deref())
            .or(self.dockerfile.as_deref())
    }

    /// Explicit build arguments (empty when the service has no build section).
    pub fn build_args(&self) -> HashMap<String, String> {
        self.build
            .as_ref()
            .map(|b| b.args.clone())
            .unwrap_or_default()
    }

    /// Names of the services this one must come after.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = self.depends_on.iter().map(String::as_str).collect();
        for link in &self.links {
            let name = link.split(':').next().unwrap_or(link);
            if !deps.contains(&name) {
                deps.push(name);
            }
        }
        deps
    }

    /// Content hash of the build inputs.
    ///
    /// Two services with the same context, Dockerfile and build arguments
    /// share a hash regardless of their names or map ordering.
    pub fn build_hash(&self) -> String {
        let args: BTreeMap<String, String> = self.build_args().into_iter().collect();
        let canonical = serde_json::json!({
            "context": self.build_context().map(|p| p.to_string_lossy().into_owned()),
            "dockerfile": self.dockerfile_override().map(|p| p.to_string_lossy().into_owned()),
            "args": args,
        });

        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }
}
