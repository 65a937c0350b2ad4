use crate::cache::{CacheStore, is_missing_cache_line, staging_dir};
use crate::error::{BuildError, Result};
use crate::options::BuildOptions;
use crate::report::ServiceOutcome;
use crate::resolver::{BuildResolver, build_arg_flags};
use crate::runner::{CommandRunner, DockerCommand, RunnerOptions};
use crate::sink::OutputSink;
use dockyard_core::Service;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Builds services from their local context.
///
/// Holds the per-run memo of content hash → destination tag, so a service
/// whose build inputs match an earlier one is tagged instead of rebuilt.
pub struct ImageBuilder<'a, R: CommandRunner> {
    runner: &'a R,
    resolver: BuildResolver,
    cache_store: Option<CacheStore>,
    built: HashMap<String, String>,
}

impl<'a, R: CommandRunner> ImageBuilder<'a, R> {
    pub fn new(runner: &'a R, project_root: PathBuf, cache_store: Option<CacheStore>) -> Self {
        Self {
            runner,
            resolver: BuildResolver::new(project_root),
            cache_store,
            built: HashMap::new(),
        }
    }

    /// Tag already produced for `hash` in this run.
    pub fn memoized(&self, hash: &str) -> Option<&str> {
        self.built.get(hash).map(String::as_str)
    }

    /// Build (or tag) one service.
    pub async fn build(
        &mut self,
        service: &Service,
        app_name: &str,
        sink: &dyn OutputSink,
        options: &BuildOptions,
    ) -> Result<ServiceOutcome> {
        let hash = service.build_hash();
        let tag = service.tag(app_name);

        if let Some(source) = self.memoized(&hash).map(str::to_string) {
            tracing::info!(service = %service.name, %source, "Build inputs unchanged; tagging");
            let command = DockerCommand::new(["tag", source.as_str(), tag.as_str()]);
            self.runner
                .run(sink, &command, &RunnerOptions::verbose(options.verbose))
                .await
                .map_err(BuildError::build)?;

            return Ok(ServiceOutcome::Tagged {
                service: service.name.clone(),
                tag,
                source,
            });
        }

        let context = self.resolver.resolve_context(service);
        let dockerfile = self.resolver.resolve_dockerfile(service, &context);

        if let Some(store) = &self.cache_store {
            store.restore(&hash, &staging_dir(self.resolver.project_root()), sink);
        }

        let args = self
            .resolver
            .resolve_build_args(service, &dockerfile, &options.environment)?;

        tracing::info!(service = %service.name, %tag, "Building image");
        let command = build_command(!options.cache, &args, &dockerfile, &tag, &context);
        let runner_options = RunnerOptions::verbose(options.verbose).with_filter(|line| {
            if is_missing_cache_line(line) {
                None
            } else {
                Some(line.to_string())
            }
        });

        self.runner
            .run(sink, &command, &runner_options)
            .await
            .map_err(BuildError::build)?;

        if let Some(store) = &self.cache_store {
            store
                .persist(self.runner, sink, &hash, &tag, &runner_options)
                .await;
        }

        self.built.insert(hash, tag.clone());

        Ok(ServiceOutcome::Built {
            service: service.name.clone(),
            tag,
        })
    }
}

/// `build [--no-cache] [--build-arg NAME=VALUE]... -f <dockerfile> -t <tag> <context>`
pub fn build_command(
    no_cache: bool,
    args: &BTreeMap<String, String>,
    dockerfile: &Path,
    tag: &str,
    context: &Path,
) -> DockerCommand {
    let mut command = vec!["build".to_string()];

    if no_cache {
        command.push("--no-cache".to_string());
    }

    command.extend(build_arg_flags(args));
    command.push("-f".to_string());
    command.push(dockerfile.to_string_lossy().into_owned());
    command.push("-t".to_string());
    command.push(tag.to_string());
    command.push(context.to_string_lossy().into_owned());

    DockerCommand::new(command)
}
