//! Command implementations and dispatch logic.
//!
//! Each command is an async function that takes a CommandContext.

use std::collections::HashMap;
use std::sync::Arc;

use camino::Utf8PathBuf;
use crawl_config::{CliOverrides, ConfigLayering, ConfigLoader, CrawlConfig};
use crawl_core::error::{CrawlError, CrawlResult};
use crawl_registry::RegistryClient;
use crawl_resolver::{ResolveOptions, Resolver};
use tracing::{debug, info};

pub mod manifest;
pub mod report;
pub mod resolve;

#[cfg(test)]
mod tests;

use crate::{output::OutputHandler, Commands};

/// Flags that apply to every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// `--registry`
    pub registry: Option<String>,
    /// `--deadline`
    pub deadline_secs: Option<u64>,
    /// `--output`
    pub output: Option<Utf8PathBuf>,
    /// `--json`
    pub json: bool,
}

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    pub globals: GlobalOptions,
    /// `CRAWL_*` environment variables
    pub env: HashMap<String, String>,
    pub loader: ConfigLoader,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(globals: GlobalOptions) -> CrawlResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| CrawlError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| CrawlError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("{} is not valid UTF-8", path.display()),
        })?;

        Ok(Self {
            loader: ConfigLoader::new(cwd.clone()),
            cwd,
            output: OutputHandler::new(),
            globals,
            env: ConfigLayering::collect_env_overrides(),
        })
    }

    /// Load the layered configuration with this command's flags on top
    pub async fn load_config(&self, dev: bool, peer: bool) -> CrawlResult<CrawlConfig> {
        let overrides = CliOverrides {
            registry: self.globals.registry.clone(),
            deadline_secs: self.globals.deadline_secs,
            dev,
            peer,
        };

        let (config, sources) = self.loader.load(&self.env, &overrides).await?;
        debug!(?sources, registry = %config.registry.url, "using configuration");
        Ok(config)
    }

    /// Build a resolver over the configured registry
    pub fn resolver(&self, config: &CrawlConfig) -> CrawlResult<Resolver> {
        let client = RegistryClient::with_config(config.registry_config())?;
        let resolver = Resolver::new(Arc::new(client));

        Ok(match config.deadline() {
            Some(deadline) => resolver.with_deadline(deadline),
            None => resolver,
        })
    }
}

/// Dependency classes of the root the configuration asks for
pub fn resolve_options(config: &CrawlConfig) -> ResolveOptions {
    ResolveOptions {
        include_dev: config.resolve.dev,
        include_peer: config.resolve.peer,
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> CrawlResult<()> {
    match command {
        Commands::Resolve {
            spec,
            range,
            dev,
            peer,
        } => {
            info!("Resolving {} (range: {:?}, dev: {}, peer: {})", spec, range, dev, peer);
            resolve::execute(&spec, range, dev, peer, ctx).await
        }
        Commands::Manifest { path, dev, peer } => {
            info!("Resolving manifest {:?} (dev: {}, peer: {})", path, dev, peer);
            manifest::execute(path, dev, peer, ctx).await
        }
    }
}
