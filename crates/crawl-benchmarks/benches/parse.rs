//! Parsing benchmarks: registry documents, specifiers, configuration

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crawl_benchmarks::criterion_config;
use crawl_benchmarks::fixtures::document_json;
use crawl_core::types::DependencySpecifier;
use crawl_registry::PackageDocument;

fn bench_document_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_parsing");

    for count in [10, 100, 1000] {
        let json = document_json("lib-a", count);
        group.throughput(Throughput::Bytes(json.len() as u64));

        group.bench_with_input(BenchmarkId::new("versions", count), &json, |b, json| {
            b.iter(|| black_box(serde_json::from_str::<PackageDocument>(json).unwrap()));
        });
    }

    group.finish();
}

fn bench_specifier_parsing(c: &mut Criterion) {
    let inputs = [
        "left-pad",
        "react@^18.2.0",
        "@types/node@>=18 <21",
        "@babel/core",
        "lodash@latest",
    ];

    c.bench_function("specifier_parsing", |b| {
        b.iter(|| {
            for input in &inputs {
                black_box(DependencySpecifier::parse(input).unwrap());
            }
        });
    });
}

fn bench_config_parsing(c: &mut Criterion) {
    let toml = r#"
[registry]
url = "https://npm.internal.example"
max-concurrent-requests = 16

[retry]
max-retries = 2
max-timeout-retries = 6

[resolve]
dev = true
deadline-secs = 60
"#;
    let manifest = r#"{
        "name": "my-project",
        "version": "1.0.0",
        "dependencies": { "lib-a": "^1.0.0", "lib-b": "^3.0.0", "@types/node": "^20.0.0" },
        "devDependencies": { "test-tool": "^9.9.9" }
    }"#;

    c.bench_function("crawl_toml", |b| {
        b.iter(|| black_box(crawl_config::toml::parse_crawl_toml(toml).unwrap()));
    });
    c.bench_function("package_json", |b| {
        b.iter(|| black_box(crawl_config::json::parse_package_json(manifest).unwrap()));
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_document_parsing, bench_specifier_parsing, bench_config_parsing
}
criterion_main!(benches);
