//! # crawl-cli
//!
//! Collects the tarball URLs of an npm package's transitive dependency
//! closure.
//!
//! This is the main entry point for the crawl CLI tool. It handles command
//! parsing, sets up logging and error handling, and dispatches to the
//! appropriate command handlers.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use crawl_core::error::{CrawlError, CrawlResult};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{CommandContext, GlobalOptions};
use output::errors::ErrorFormatter;

/// Collect the tarball URLs an npm package needs
#[derive(Parser)]
#[command(name = "crawl", version, about = "Collect npm dependency tarball URLs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Registry base URL
    #[arg(long, global = true, value_name = "URL")]
    pub registry: Option<String>,

    /// Give up after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Also write the artifact list to a file, one URL per line
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,

    /// Print the result as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a package from the registry
    Resolve {
        /// Package specifier, e.g. `left-pad`, `react@^18`, `@types/node@20`
        spec: String,
        /// Version range, overriding one given in the specifier
        #[arg(short, long)]
        range: Option<String>,
        /// Follow the package's devDependencies
        #[arg(long)]
        dev: bool,
        /// Follow the package's peerDependencies
        #[arg(long)]
        peer: bool,
    },
    /// Resolve the dependencies of a local package.json
    Manifest {
        /// package.json or its directory; defaults to the nearest one
        path: Option<Utf8PathBuf>,
        /// Follow devDependencies
        #[arg(long)]
        dev: bool,
        /// Follow peerDependencies
        #[arg(long)]
        peer: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting crawl v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> CrawlResult<()> {
    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CrawlError::io("Failed to create async runtime".to_string(), e))?;

    let globals = GlobalOptions {
        registry: cli.registry,
        deadline_secs: cli.deadline,
        output: cli.output,
        json: cli.json,
    };

    rt.block_on(async {
        let ctx = CommandContext::new(globals)?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "crawl={level},crawl_config={level},crawl_registry={level},crawl_resolver={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("crawl encountered an unexpected error: {}", panic_info);
        eprintln!("crawl crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/crawl-tools/crawl/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
