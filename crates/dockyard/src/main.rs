mod build;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockyard")]
#[command(about = "Build and pull every image a compose-style manifest needs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build local services and pull external images
    Build {
        /// Only this service and its dependencies
        service: Option<String>,
        /// Application name used as the tag prefix (default: manifest directory name)
        #[arg(long, env = "DOCKYARD_APP")]
        app: Option<String>,
        /// Disable the layer cache and always pull external images
        #[arg(long)]
        no_cache: bool,
        /// Carry the build cache across runs in this directory
        #[arg(long, value_name = "DIR", conflicts_with = "persist_cache")]
        cache_dir: Option<PathBuf>,
        /// Carry the build cache across runs in the default cache directory
        #[arg(long)]
        persist_cache: bool,
        /// Environment file for build arguments (default: .env next to the manifest)
        #[arg(long, value_name = "FILE")]
        env_file: Option<PathBuf>,
        /// Build argument source, overrides the environment file
        #[arg(short = 'e', long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
        /// Echo every container tool command
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("dockyard {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Build {
            service,
            app,
            no_cache,
            cache_dir,
            persist_cache,
            env_file,
            env,
            verbose,
        } => {
            init_tracing(verbose);

            let args = build::BuildArgs {
                service,
                app,
                no_cache,
                cache_dir,
                persist_cache,
                env_file,
                env,
                verbose,
            };

            if let Err(e) = build::handle_build_command(args).await {
                eprintln!();
                eprintln!("{} {}", "✗".red().bold(), build::error_message(&e));
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
