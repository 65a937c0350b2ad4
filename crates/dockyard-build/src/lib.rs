//! Dockyard image build orchestration
//!
//! Turns the services of a manifest into tagged container images: external
//! images are pulled once and tagged per service, local contexts are built
//! with Dockerfile `ARG`s filled from the run environment, identical builds
//! are deduplicated by content hash, and a hash-keyed build cache directory
//! is carried across runs.

pub mod build_args;
pub mod builder;
pub mod cache;
pub mod error;
pub mod options;
pub mod orchestrator;
pub mod plan;
pub mod puller;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod sink;
pub mod transfer;

pub use build_args::scan_build_args;
pub use builder::{ImageBuilder, build_command};
pub use cache::CacheStore;
pub use error::{BuildError, Result};
pub use options::BuildOptions;
pub use orchestrator::Orchestrator;
pub use plan::{BuildPlan, PullTarget, normalize_image};
pub use puller::ImagePuller;
pub use report::{BuildReport, ServiceOutcome};
pub use resolver::BuildResolver;
pub use runner::{CommandRunner, DockerCommand, LineFilter, ProcessRunner, RunnerOptions};
pub use sink::{BufferSink, ConsoleSink, OutputSink};
pub use transfer::copy_dir;
