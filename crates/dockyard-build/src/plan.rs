//! Build planning
//!
//! Splits the run-ordered services into images to pull and services to build.

use dockyard_core::Service;
use std::collections::BTreeMap;

/// A destination a pulled image must be tagged as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullTarget {
    pub service: String,
    pub tag: String,
}

/// What one run has to do.
#[derive(Debug, Default)]
pub struct BuildPlan<'a> {
    /// Normalized image reference → destinations, in run order.
    /// Keyed by a sorted map so pulls happen in a reproducible order.
    pub pulls: BTreeMap<String, Vec<PullTarget>>,
    /// Services built from a local context, in run order.
    pub builds: Vec<&'a Service>,
}

impl<'a> BuildPlan<'a> {
    pub fn new(services: &[&'a Service], app_name: &str) -> Self {
        let mut plan = BuildPlan::default();

        for &service in services {
            match service.image.as_deref() {
                Some(image) if !image.is_empty() => {
                    plan.pulls
                        .entry(normalize_image(image))
                        .or_default()
                        .push(PullTarget {
                            service: service.name.clone(),
                            tag: service.tag(app_name),
                        });
                }
                _ => plan.builds.push(service),
            }
        }

        tracing::debug!(
            pulls = plan.pulls.len(),
            builds = plan.builds.len(),
            "Build plan ready"
        );

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.pulls.is_empty() && self.builds.is_empty()
    }
}

/// Make an implicit `:latest` explicit.
///
/// Only the last path segment is inspected, so a registry port
/// (`localhost:5000/app`) is not mistaken for a tag.
///
/// # Examples
/// - `redis` -> `redis:latest`
/// - `redis:7` -> `redis:7`
/// - `localhost:5000/app` -> `localhost:5000/app:latest`
pub fn normalize_image(image: &str) -> String {
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    if last_segment.contains(':') {
        image.to_string()
    } else {
        format!("{}:latest", image)
    }
}
