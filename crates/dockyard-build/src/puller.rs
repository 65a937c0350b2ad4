//! External image pulls
//!
//! Each distinct image is pulled at most once per run, then tagged for every
//! service that references it.

use crate::error::{BuildError, Result};
use crate::plan::PullTarget;
use crate::report::ServiceOutcome;
use crate::runner::{CommandRunner, DockerCommand, RunnerOptions};
use crate::sink::OutputSink;

pub struct ImagePuller<'a, R: CommandRunner> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> ImagePuller<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Whether any local image matches `image`.
    pub async fn image_exists(&self, image: &str) -> Result<bool> {
        let output = self
            .runner
            .combined_output(&DockerCommand::new(["images", "-q", image]))
            .await
            .map_err(BuildError::build)?;

        Ok(!output.trim().is_empty())
    }

    /// Pull `image` if needed and tag it for every target, in order.
    ///
    /// The pull is skipped only when `cache` is set and the image is
    /// already present locally.
    pub async fn pull(
        &self,
        image: &str,
        targets: &[PullTarget],
        cache: bool,
        sink: &dyn OutputSink,
        options: &RunnerOptions,
    ) -> Result<Vec<ServiceOutcome>> {
        let exists = self.image_exists(image).await?;
        let pulled = !cache || !exists;

        if pulled {
            tracing::info!(image, "Pulling image");
            self.runner
                .run(sink, &DockerCommand::new(["pull", image]), options)
                .await
                .map_err(BuildError::build)?;
        } else {
            tracing::info!(image, "Using local image");
        }

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let command = DockerCommand::new(["tag", image, target.tag.as_str()]);
            self.runner
                .run(sink, &command, options)
                .await
                .map_err(BuildError::build)?;

            outcomes.push(ServiceOutcome::Pulled {
                service: target.service.clone(),
                tag: target.tag.clone(),
                image: image.to_string(),
                pulled,
            });
        }

        Ok(outcomes)
    }
}
