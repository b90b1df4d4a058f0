//! `crawl manifest` command implementation.
//!
//! Resolves the dependencies declared in a local package.json.

use std::time::Instant;

use camino::Utf8PathBuf;
use crawl_core::error::CrawlResult;

use super::report::Report;
use super::{resolve_options, CommandContext};

/// Execute the `crawl manifest` command
pub async fn execute(
    path: Option<Utf8PathBuf>,
    dev: bool,
    peer: bool,
    ctx: &CommandContext,
) -> CrawlResult<()> {
    let started = Instant::now();

    let config = ctx.load_config(dev, peer).await?;
    let (path, manifest) = ctx.loader.load_manifest(path.as_deref()).await?;
    let options = resolve_options(&config);

    ctx.output.step(
        "📦",
        &format!(
            "Resolving {} dependencies of {}",
            manifest.dependency_count(&options.classes()),
            path
        ),
    );

    let resolver = ctx.resolver(&config)?;
    let artifacts = resolver
        .resolve_from_document(&manifest.to_version_record(), options)
        .await?;

    Report::collect(&resolver, artifacts, started).emit(ctx).await
}
