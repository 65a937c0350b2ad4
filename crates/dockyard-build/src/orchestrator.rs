use crate::builder::ImageBuilder;
use crate::cache::CacheStore;
use crate::error::Result;
use crate::options::BuildOptions;
use crate::plan::BuildPlan;
use crate::puller::ImagePuller;
use crate::report::BuildReport;
use crate::runner::{CommandRunner, RunnerOptions};
use crate::sink::OutputSink;
use dockyard_core::Manifest;
use std::path::Path;
use tracing::instrument;

/// Turns a manifest into tagged images.
///
/// Services are processed one at a time: every build in run order, then
/// every external image. The first fatal error aborts the run.
pub struct Orchestrator<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> Orchestrator<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Build or pull every service of `manifest`.
    ///
    /// `dir` is the manifest directory; build contexts resolve against it.
    #[instrument(skip_all, fields(app = app_name, dir = %dir.display()))]
    pub async fn build(
        &self,
        manifest: &Manifest,
        dir: &Path,
        app_name: &str,
        sink: &dyn OutputSink,
        options: &BuildOptions,
    ) -> Result<BuildReport> {
        let services = manifest.run_order(options.service.as_deref())?;
        let plan = BuildPlan::new(&services, app_name);
        let mut report = BuildReport::default();

        if plan.is_empty() {
            tracing::info!("No services to build or pull");
            return Ok(report);
        }

        let cache_store = options.cache_dir.as_ref().map(CacheStore::new);
        let mut builder = ImageBuilder::new(&self.runner, dir.to_path_buf(), cache_store);

        for service in &plan.builds {
            let outcome = builder.build(service, app_name, sink, options).await?;
            report.push(outcome);
        }

        let puller = ImagePuller::new(&self.runner);
        let runner_options = RunnerOptions::verbose(options.verbose);

        for (image, targets) in &plan.pulls {
            let outcomes = puller
                .pull(image, targets, options.cache, sink, &runner_options)
                .await?;
            for outcome in outcomes {
                report.push(outcome);
            }
        }

        tracing::info!(
            services = report.len(),
            builds = report.builds(),
            pulls = report.pulls(),
            "Build run complete"
        );

        Ok(report)
    }
}
