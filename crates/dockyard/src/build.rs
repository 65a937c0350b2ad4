use colored::Colorize;
use dockyard_build::{
    BuildError, BuildOptions, BuildReport, ConsoleSink, Orchestrator, ProcessRunner,
    ServiceOutcome,
};
use dockyard_config::ConfigError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct BuildArgs {
    pub service: Option<String>,
    pub app: Option<String>,
    pub no_cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub persist_cache: bool,
    pub env_file: Option<PathBuf>,
    pub env: Vec<String>,
    pub verbose: bool,
}

pub async fn handle_build_command(args: BuildArgs) -> anyhow::Result<()> {
    let manifest_path = dockyard_config::find_manifest_file()?;
    let manifest = dockyard_core::load_manifest(&manifest_path)?;
    let project_root = project_root(&manifest_path)?;

    let app_name = match args.app {
        Some(app) => app,
        None => default_app_name(&project_root),
    };

    let environment = build_environment(&project_root, args.env_file.as_deref(), &args.env)?;

    let cache_dir = match (args.cache_dir, args.persist_cache) {
        (Some(dir), _) => Some(dir),
        (None, true) => Some(dockyard_config::default_cache_dir()?),
        (None, false) => None,
    };

    let mut options = BuildOptions::default()
        .with_cache(!args.no_cache)
        .with_verbose(args.verbose);
    options.environment = environment;
    options.service = args.service;
    options.cache_dir = cache_dir;

    println!("{}", "Building images...".green());
    println!("Manifest: {}", manifest_path.display().to_string().cyan());
    println!("App: {}", app_name.cyan());
    if let Some(dir) = &options.cache_dir {
        println!("Build cache: {}", dir.display().to_string().cyan());
    }
    println!();

    let runner = ProcessRunner::with_program(dockyard_config::docker_binary());
    let orchestrator = Orchestrator::new(runner);
    let report = orchestrator
        .build(&manifest, &project_root, &app_name, &ConsoleSink, &options)
        .await?;

    print_summary(&report);

    Ok(())
}

/// Directory the manifest lives in; build contexts resolve against it.
fn project_root(manifest_path: &Path) -> anyhow::Result<PathBuf> {
    let path = if manifest_path.is_absolute() {
        manifest_path.to_path_buf()
    } else {
        std::env::current_dir()?.join(manifest_path)
    };

    Ok(path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn default_app_name(project_root: &Path) -> String {
    project_root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string())
}

/// `.env`-style file first, then `-e KEY=VALUE` overrides.
fn build_environment(
    project_root: &Path,
    env_file: Option<&Path>,
    assignments: &[String],
) -> anyhow::Result<HashMap<String, String>> {
    let mut environment = match env_file {
        Some(path) => dockyard_config::load_env_file(path)?,
        None => {
            let default = project_root.join(".env");
            if default.is_file() {
                dockyard_config::load_env_file(&default)?
            } else {
                HashMap::new()
            }
        }
    };

    for assignment in assignments {
        let (key, value) = dockyard_config::parse_assignment(assignment)?;
        environment.insert(key, value);
    }

    Ok(environment)
}

fn print_summary(report: &BuildReport) {
    println!();
    for outcome in &report.outcomes {
        match outcome {
            ServiceOutcome::Built { service, tag } => {
                println!("  {} {} built {}", "✓".green(), service.cyan(), tag);
            }
            ServiceOutcome::Tagged {
                service,
                tag,
                source,
            } => {
                println!(
                    "  {} {} tagged {} (same build as {})",
                    "✓".green(),
                    service.cyan(),
                    tag,
                    source
                );
            }
            ServiceOutcome::Pulled {
                service,
                tag,
                image,
                pulled,
            } => {
                let how = if *pulled { "pulled" } else { "local" };
                println!(
                    "  {} {} {} {} → {}",
                    "✓".green(),
                    service.cyan(),
                    how,
                    image,
                    tag
                );
            }
        }
    }

    println!();
    println!(
        "{} {} services ({} builds, {} pulls)",
        "Done:".green().bold(),
        report.len(),
        report.builds(),
        report.pulls()
    );
}

pub fn error_message(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<BuildError>() {
        return e.user_message();
    }
    if let Some(ConfigError::ManifestNotFound) = err.downcast_ref::<ConfigError>() {
        return format!(
            "No manifest found.\n\
             \n\
             Create one of {} in the current directory, or set DOCKYARD_MANIFEST.",
            dockyard_config::MANIFEST_CANDIDATES.join(", ")
        );
    }
    format!("{:#}", err)
}
