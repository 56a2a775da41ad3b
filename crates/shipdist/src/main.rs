//! shipdist CLI - build a deployable dist/ directory from a static site.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "shipdist")]
#[command(about = "Copy a static site into dist/ and minify its HTML and CSS")]
#[command(version)]
pub struct Cli {
    /// Project root containing src/, shared/ and the config file
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Path to config file (defaults to shipdist.toml under the root)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (defaults to config or "dist")
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip minification
    #[arg(long)]
    no_minify: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let minify = if cli.no_minify { Some(false) } else { None };
    match commands::build::run(cli.root, cli.config, cli.output, minify).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
