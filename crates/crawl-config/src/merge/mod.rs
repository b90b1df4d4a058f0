//! Configuration layering, fallback logic, and environment overrides
//!
//! Layers, lowest priority first: built-in defaults, the global
//! `~/.crawl/config.toml`, the nearest project `crawl.toml`, `CRAWL_*`
//! environment variables, command line flags. File layers merge key by key,
//! so a project file only needs the settings it changes.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crawl_core::error::CrawlError;

use crate::json::PackageJson;
use crate::toml::{from_table, load_table, validate_config, CrawlConfig};
use crate::ConfigResult;

/// Project configuration file name
pub const PROJECT_CONFIG: &str = "crawl.toml";

/// Manifest file name
pub const MANIFEST: &str = "package.json";

const ENV_REGISTRY: &str = "CRAWL_REGISTRY";
const ENV_MAX_RETRIES: &str = "CRAWL_MAX_RETRIES";
const ENV_DEADLINE_SECS: &str = "CRAWL_DEADLINE_SECS";
const ENV_CONCURRENCY: &str = "CRAWL_CONCURRENCY";

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project crawl.toml file
    Project(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

/// Settings given on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    /// `--registry`
    pub registry: Option<String>,
    /// `--deadline`
    pub deadline_secs: Option<u64>,
    /// `--dev`
    pub dev: bool,
    /// `--peer`
    pub peer: bool,
}

/// Main configuration loading interface
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Home directory holding `.crawl/config.toml`
    home: Option<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        let home = dirs::home_dir().and_then(|home| Utf8PathBuf::try_from(home).ok());
        Self { cwd, home }
    }

    /// Use a different home directory for the global config
    pub fn with_home(mut self, home: Option<Utf8PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Find a file in the working directory or its ancestors
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(filename))
            .find(|candidate| candidate.is_file())
    }

    /// Location of the global configuration file
    pub fn global_config_path(&self) -> Option<Utf8PathBuf> {
        self.home
            .as_ref()
            .map(|home| home.join(".crawl").join("config.toml"))
    }

    /// Load every configuration layer and merge them
    pub async fn load(
        &self,
        env: &HashMap<String, String>,
        cli: &CliOverrides,
    ) -> ConfigResult<(CrawlConfig, Vec<ConfigSource>)> {
        let mut layering = ConfigLayering::new();

        if let Some(path) = self.global_config_path().filter(|path| path.is_file()) {
            let table = load_table(&path).await?;
            layering.add_file(ConfigSource::Global(path), table);
        }

        if let Some(path) = self.resolve_config_path(PROJECT_CONFIG) {
            let table = load_table(&path).await?;
            layering.add_file(ConfigSource::Project(path), table);
        }

        let (config, sources) = layering.merge(env, cli)?;
        debug!(?sources, "configuration loaded");
        Ok((config, sources))
    }

    /// Load a package.json.
    ///
    /// `path` may name the file or its directory and is taken relative to
    /// the working directory. Without a path the nearest package.json
    /// walking up from the working directory is used.
    pub async fn load_manifest(
        &self,
        path: Option<&Utf8Path>,
    ) -> ConfigResult<(Utf8PathBuf, PackageJson)> {
        let path = match path {
            Some(path) => {
                let path = self.cwd.join(path);
                if path.is_dir() {
                    path.join(MANIFEST)
                } else {
                    path
                }
            }
            None => self
                .resolve_config_path(MANIFEST)
                .ok_or_else(|| CrawlError::ConfigValidation {
                    field: "manifest".to_string(),
                    reason: format!(
                        "No {} found in {} or parent directories",
                        MANIFEST, self.cwd
                    ),
                })?,
        };

        let manifest = crate::json::load_from_file(&path).await?;
        debug!(path = %path, "manifest loaded");
        Ok((path, manifest))
    }
}

/// Configuration layering and merging
#[derive(Debug, Default)]
pub struct ConfigLayering {
    /// File layers merged so far
    table: ::toml::Table,
    /// Files that contributed, in merge order
    sources: Vec<ConfigSource>,
}

impl ConfigLayering {
    /// Create a new configuration layering system
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a file layer over the layers added before it
    pub fn add_file(&mut self, source: ConfigSource, table: ::toml::Table) {
        merge_tables(&mut self.table, table);
        self.sources.push(source);
    }

    /// Apply environment and CLI overrides on top of the file layers
    pub fn merge(
        self,
        env: &HashMap<String, String>,
        cli: &CliOverrides,
    ) -> ConfigResult<(CrawlConfig, Vec<ConfigSource>)> {
        let mut config = from_table(self.table)?;
        let mut sources = self.sources;

        sources.extend(Self::apply_env_overrides(&mut config, env)?);

        if Self::apply_cli_overrides(&mut config, cli) {
            sources.push(ConfigSource::CommandLine);
        }

        validate_config(&config)?;
        Ok((config, sources))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        config: &mut CrawlConfig,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<Vec<ConfigSource>> {
        let mut applied = Vec::new();

        for key in [ENV_REGISTRY, ENV_MAX_RETRIES, ENV_DEADLINE_SECS, ENV_CONCURRENCY] {
            let Some(value) = overrides.get(key) else {
                continue;
            };

            match key {
                ENV_REGISTRY => config.registry.url = value.trim().to_string(),
                ENV_MAX_RETRIES => config.retry.max_retries = parse_env(key, value)?,
                ENV_DEADLINE_SECS => config.resolve.deadline_secs = Some(parse_env(key, value)?),
                ENV_CONCURRENCY => config.registry.max_concurrent_requests = parse_env(key, value)?,
                _ => continue,
            }
            applied.push(ConfigSource::Environment(key.to_string()));
        }

        Ok(applied)
    }

    /// Apply CLI flag overrides, returning whether any was set
    fn apply_cli_overrides(config: &mut CrawlConfig, overrides: &CliOverrides) -> bool {
        let mut applied = false;

        if let Some(registry) = &overrides.registry {
            config.registry.url = registry.clone();
            applied = true;
        }
        if let Some(deadline) = overrides.deadline_secs {
            config.resolve.deadline_secs = Some(deadline);
            applied = true;
        }
        if overrides.dev {
            config.resolve.dev = true;
            applied = true;
        }
        if overrides.peer {
            config.resolve.peer = true;
            applied = true;
        }

        applied
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("CRAWL_"))
            .collect()
    }
}

/// Merge `overlay` into `base`, descending into tables present in both
fn merge_tables(base: &mut ::toml::Table, overlay: ::toml::Table) {
    for (key, value) in overlay {
        match value {
            ::toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(::toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, ::toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

fn parse_env<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| CrawlError::ConfigValidation {
        field: key.to_string(),
        reason: format!("'{}' is not valid: {}", value, e),
    })
}
