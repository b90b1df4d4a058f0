//! Rendering of a finished resolution.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crawl_core::error::{CrawlError, CrawlResult};
use crawl_registry::CacheStats;
use crawl_resolver::{Resolver, SkippedPackage};
use serde_json::json;

use super::CommandContext;

/// Everything a command prints about one resolution
#[derive(Debug)]
pub struct Report {
    pub artifacts: BTreeSet<String>,
    pub skipped: Vec<SkippedPackage>,
    pub stats: CacheStats,
    pub elapsed: Duration,
}

impl Report {
    /// Gather the outcome of a resolution started at `started`
    pub fn collect(resolver: &Resolver, artifacts: BTreeSet<String>, started: Instant) -> Self {
        Self {
            artifacts,
            skipped: resolver.skipped(),
            stats: resolver.session().cache().stats(),
            elapsed: started.elapsed(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "artifacts": self.artifacts,
            "skipped": self.skipped,
            "stats": {
                "packages": self.stats.entries,
                "registryFetches": self.stats.registry_fetches,
                "cacheHits": self.stats.cache_hits,
                "elapsedMs": self.elapsed.as_millis() as u64,
            }
        })
    }

    /// Artifact list as written by `--output`
    pub fn artifact_list(&self) -> String {
        let mut list = String::new();
        for url in &self.artifacts {
            list.push_str(url);
            list.push('\n');
        }
        list
    }

    /// Print the report and write the output file if one was requested
    pub async fn emit(&self, ctx: &CommandContext) -> CrawlResult<()> {
        if ctx.globals.json {
            ctx.output.result(&format!("{:#}", self.to_json()));
        } else {
            for url in &self.artifacts {
                ctx.output.result(url);
            }
        }

        for skipped in &self.skipped {
            ctx.output.warn(&format!("skipped {}: {}", skipped.specifier, skipped.reason));
        }

        if let Some(path) = &ctx.globals.output {
            let path = ctx.cwd.join(path);
            tokio::fs::write(&path, self.artifact_list())
                .await
                .map_err(|e| CrawlError::io(format!("Failed to write {}", path), e))?;
            ctx.output.info(&format!("Wrote {}", path));
        }

        ctx.output.success(&format!(
            "{} artifacts in {:.2}s ({} registry fetches, {} cache hits)",
            self.artifacts.len(),
            self.elapsed.as_secs_f64(),
            self.stats.registry_fetches,
            self.stats.cache_hits,
        ));
        Ok(())
    }
}
