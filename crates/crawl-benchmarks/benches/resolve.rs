//! Dependency traversal and version selection benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crawl_benchmarks::fixtures::{layered_registry, package_name, version_strings};
use crawl_benchmarks::{criterion_config, runtime};
use crawl_core::types::DependencySpecifier;
use crawl_resolver::{ResolveOptions, Resolver, VersionSelector};
use node_semver::Range;

/// Full traversal with a fresh session per iteration
fn bench_traversal(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("traversal");

    for (layers, width) in [(4, 10), (6, 50), (8, 200)] {
        let registry = Arc::new(layered_registry(layers, width, 5));
        let root = DependencySpecifier::latest(package_name(0, 0));

        group.throughput(Throughput::Elements((layers * width) as u64));
        group.bench_with_input(
            BenchmarkId::new("layered", format!("{}x{}", layers, width)),
            &root,
            |b, root| {
                b.iter(|| {
                    let resolver = Resolver::new(registry.clone());
                    let artifacts = rt
                        .block_on(resolver.resolve_by_specifier(root, ResolveOptions::default()))
                        .unwrap();
                    black_box(artifacts.len())
                });
            },
        );
    }

    group.finish();
}

/// Second resolution over a warm session
fn bench_warm_session(c: &mut Criterion) {
    let rt = runtime();
    let registry = Arc::new(layered_registry(6, 50, 5));
    let root = DependencySpecifier::latest(package_name(0, 0));
    let resolver = Resolver::new(registry);
    rt.block_on(resolver.resolve_by_specifier(&root, ResolveOptions::default()))
        .unwrap();

    c.bench_function("warm_session", |b| {
        b.iter(|| {
            black_box(
                rt.block_on(resolver.resolve_by_specifier(&root, ResolveOptions::default()))
                    .unwrap(),
            )
        });
    });
}

/// Max-satisfying lookups over documents of different sizes
fn bench_version_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_selection");
    let ranges: Vec<Range> = ["^1.2.0", "~3.4.0", ">=2.0.0 <5.0.0", "1.x || 4.x", "*"]
        .iter()
        .map(|raw| Range::parse(raw).unwrap())
        .collect();

    for count in [10, 100, 1000] {
        let versions = version_strings(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("versions", count), &versions, |b, versions| {
            b.iter(|| {
                let selector = VersionSelector::new(versions.iter().map(String::as_str));
                for range in &ranges {
                    black_box(selector.max_satisfying(range));
                }
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_traversal, bench_warm_session, bench_version_selection
}
criterion_main!(benches);
