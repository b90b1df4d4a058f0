//! `crawl resolve` command implementation.
//!
//! Resolves a package specifier against the registry and reports the
//! tarball URLs of its dependency closure.

use std::time::Instant;

use crawl_core::error::CrawlResult;
use crawl_core::types::DependencySpecifier;

use super::report::Report;
use super::{resolve_options, CommandContext};

/// Execute the `crawl resolve` command
pub async fn execute(
    spec: &str,
    range: Option<String>,
    dev: bool,
    peer: bool,
    ctx: &CommandContext,
) -> CrawlResult<()> {
    let started = Instant::now();

    let mut specifier = DependencySpecifier::parse(spec)?;
    if range.is_some() {
        specifier = specifier.with_range(range);
    }

    let config = ctx.load_config(dev, peer).await?;
    let resolver = ctx.resolver(&config)?;

    ctx.output.step("🔍", &format!("Resolving {}", specifier));
    let artifacts = resolver
        .resolve_by_specifier(&specifier, resolve_options(&config))
        .await?;

    Report::collect(&resolver, artifacts, started).emit(ctx).await
}
