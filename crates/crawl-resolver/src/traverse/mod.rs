//! Concurrent dependency traversal
//!
//! Every dependency edge of a record is resolved at the same time: fetch the
//! package document through the session cache, pick a version, then recurse
//! into that version's own edges. A record's future completes only after all
//! of its children have, so dropping the root future cancels the whole tree.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::{debug, error, info, trace};

use crawl_core::error::CrawlError;
use crawl_core::types::{DependencyClass, DependencySpecifier};
use crawl_registry::{Lookup, PackageSource, VersionRecord};

use crate::semver::select_version;
use crate::session::{Session, SkippedPackage};
use crate::ResolverResult;

/// Edges followed below the root record
const TRANSITIVE: &[DependencyClass] = &[DependencyClass::Production];

/// Which dependency classes of the root record to follow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Follow `devDependencies` of the root
    pub include_dev: bool,
    /// Follow `peerDependencies` of the root
    pub include_peer: bool,
}

impl ResolveOptions {
    /// Classes followed on the root record
    pub fn classes(&self) -> Vec<DependencyClass> {
        DependencyClass::selected(self.include_dev, self.include_peer)
    }
}

/// Dependency traversal over a package source
pub struct Resolver {
    /// Where package documents come from
    source: Arc<dyn PackageSource>,
    /// State shared by every branch
    session: Arc<Session>,
    /// Upper bound on one entry point call
    deadline: Option<Duration>,
}

impl Resolver {
    /// Create a resolver with a fresh session
    pub fn new(source: Arc<dyn PackageSource>) -> Self {
        Self::with_session(source, Arc::new(Session::new()))
    }

    /// Create a resolver that shares an existing session
    pub fn with_session(source: Arc<dyn PackageSource>, session: Arc<Session>) -> Self {
        Self {
            source,
            session,
            deadline: None,
        }
    }

    /// Abort an entry point call that runs longer than `deadline`
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Session this resolver accumulates into
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Edges skipped so far in this session
    pub fn skipped(&self) -> Vec<SkippedPackage> {
        self.session.skipped()
    }

    /// Resolve a package specifier and collect the tarballs of its closure.
    ///
    /// Returns a snapshot of every tarball collected in this session.
    /// A root that cannot be satisfied is logged and skipped, not an error,
    /// and yields an empty set.
    pub async fn resolve_by_specifier(
        &self,
        specifier: &DependencySpecifier,
        options: ResolveOptions,
    ) -> ResolverResult<BTreeSet<String>> {
        let classes = options.classes();
        let selected = self
            .run(self.resolve_edge(&specifier.name, specifier.range.as_deref(), None, &classes))
            .await?;

        Ok(if selected {
            self.session.artifacts()
        } else {
            BTreeSet::new()
        })
    }

    /// Collect the tarballs of the closure of an already loaded record,
    /// such as a local `package.json`.
    pub async fn resolve_from_document(
        &self,
        record: &VersionRecord,
        options: ResolveOptions,
    ) -> ResolverResult<BTreeSet<String>> {
        let classes = options.classes();
        let name = record.name.as_deref().unwrap_or("<root>");
        self.run(self.accumulate(name, record, &classes)).await?;
        Ok(self.session.artifacts())
    }

    /// Drive a traversal to completion under the configured deadline.
    ///
    /// Returns whether the root record was selected.
    async fn run<F>(&self, traversal: F) -> ResolverResult<bool>
    where
        F: Future<Output = ResolverResult<bool>>,
    {
        let started = Instant::now();

        let selected = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, traversal)
                .await
                .map_err(|_| CrawlError::DeadlineExceeded {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                })??,
            None => traversal.await?,
        };

        let stats = self.session.cache().stats();
        info!(
            artifacts = self.session.artifact_count(),
            cache_hits = stats.cache_hits,
            registry_fetches = stats.registry_fetches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "resolution complete"
        );
        Ok(selected)
    }

    /// Resolve one edge: fetch (memoized), select a version, recurse.
    ///
    /// `class` is `None` for the root request. The selected record follows
    /// the edges of the classes in `follow`. Yields `false` when the edge
    /// was skipped.
    fn resolve_edge<'a>(
        &'a self,
        name: &'a str,
        range: Option<&'a str>,
        class: Option<DependencyClass>,
        follow: &'a [DependencyClass],
    ) -> BoxFuture<'a, ResolverResult<bool>> {
        async move {
            let label = class.map(|class| class.log_label()).unwrap_or("");
            let shown_range = range.unwrap_or("");

            let (document, lookup) = self
                .session
                .cache()
                .get_or_fetch(name, |number| {
                    info!(source = "registry", hit = number, "retrieving {}{} {}", label, name, shown_range);
                    self.source.fetch_document(name)
                })
                .await?;
            if let Lookup::Cached(number) = lookup {
                info!(source = "cache", hit = number, "retrieving {}{} {}", label, name, shown_range);
            }

            let version = match select_version(name, &document, range) {
                Ok(version) => version,
                Err(e) => return self.skip(name, range, class, e),
            };
            let Some(record) = document.record(&version) else {
                let missing = CrawlError::MissingVersionRecord {
                    name: name.to_string(),
                    version,
                };
                return self.skip(name, range, class, missing);
            };

            debug!(name, version = %version, "selected version");
            self.accumulate(name, record, follow).await
        }
        .boxed()
    }

    /// Collect a record's tarball and resolve its edges concurrently
    fn accumulate<'a>(
        &'a self,
        name: &'a str,
        record: &'a VersionRecord,
        follow: &'a [DependencyClass],
    ) -> BoxFuture<'a, ResolverResult<bool>> {
        async move {
            if !self.session.visit(name, record) {
                trace!(name, version = %record.version, "already visited");
                return Ok(true);
            }

            let branches: Vec<_> = record
                .edges_for(follow)
                .map(|(class, dependency, range)| {
                    self.resolve_edge(dependency, Some(range), Some(class), TRANSITIVE)
                })
                .collect();

            try_join_all(branches).await?;
            Ok(true)
        }
        .boxed()
    }

    /// Absorb a resolution failure for one edge, or pass it on
    fn skip(
        &self,
        name: &str,
        range: Option<&str>,
        class: Option<DependencyClass>,
        failure: CrawlError,
    ) -> ResolverResult<bool> {
        if !failure.is_recoverable() {
            return Err(failure);
        }

        error!(
            package = name,
            range = range.unwrap_or("latest"),
            "failed to retrieve version of package: {}",
            failure
        );
        self.session.record_skip(SkippedPackage {
            specifier: DependencySpecifier {
                name: name.to_string(),
                range: range.map(str::to_string),
            },
            class,
            reason: failure.to_string(),
        });
        Ok(false)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("session", &self.session)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
