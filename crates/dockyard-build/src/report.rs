/// How a service ended up with its destination tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    /// Built from its local context.
    Built { service: String, tag: String },
    /// Same build inputs as an earlier service in this run; tagged from its image.
    Tagged {
        service: String,
        tag: String,
        source: String,
    },
    /// External image tagged for the service. `pulled` is false when a
    /// local copy was reused.
    Pulled {
        service: String,
        tag: String,
        image: String,
        pulled: bool,
    },
}

impl ServiceOutcome {
    pub fn service(&self) -> &str {
        match self {
            ServiceOutcome::Built { service, .. }
            | ServiceOutcome::Tagged { service, .. }
            | ServiceOutcome::Pulled { service, .. } => service,
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            ServiceOutcome::Built { tag, .. }
            | ServiceOutcome::Tagged { tag, .. }
            | ServiceOutcome::Pulled { tag, .. } => tag,
        }
    }
}

/// Result of one orchestration run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub outcomes: Vec<ServiceOutcome>,
}

impl BuildReport {
    pub fn push(&mut self, outcome: ServiceOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcome(&self, service: &str) -> Option<&ServiceOutcome> {
        self.outcomes.iter().find(|o| o.service() == service)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of build command invocations.
    pub fn builds(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ServiceOutcome::Built { .. }))
            .count()
    }

    /// Number of pull command invocations.
    pub fn pulls(&self) -> usize {
        let mut images: Vec<&str> = self
            .outcomes
            .iter()
            .filter_map(|o| match o {
                ServiceOutcome::Pulled {
                    image,
                    pulled: true,
                    ..
                } => Some(image.as_str()),
                _ => None,
            })
            .collect();
        images.sort_unstable();
        images.dedup();
        images.len()
    }
}
