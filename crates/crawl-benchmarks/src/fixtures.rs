//! Synthetic registries and documents

use crawl_registry::MemoryRegistry;

/// Name of the package at `index` within `layer`
pub fn package_name(layer: usize, index: usize) -> String {
    format!("pkg-{}-{}", layer, index)
}

/// Registry shaped as `layers` rows of `width` packages.
///
/// Every package depends on `fanout` packages of the next row, so most
/// edges land on a package another branch already requested. The root is
/// `pkg-0-0`.
pub fn layered_registry(layers: usize, width: usize, fanout: usize) -> MemoryRegistry {
    let registry = MemoryRegistry::new();

    for layer in 0..layers {
        for index in 0..width {
            let dependencies: Vec<(String, &str)> = if layer + 1 < layers {
                (0..fanout)
                    .map(|offset| (package_name(layer + 1, (index + offset) % width), "^1.0.0"))
                    .collect()
            } else {
                Vec::new()
            };
            let edges: Vec<(&str, &str)> = dependencies
                .iter()
                .map(|(name, range)| (name.as_str(), *range))
                .collect();

            let name = package_name(layer, index);
            registry
                .publish(&name, "1.0.0", &edges)
                .publish(&name, "1.1.0", &edges)
                .publish(&name, "2.0.0", &[]);
            registry.tag(&name, "latest", "1.1.0");
        }
    }

    registry
}

/// Registry document JSON with `count` published versions
pub fn document_json(name: &str, count: usize) -> String {
    let versions: serde_json::Map<_, _> = version_strings(count)
        .into_iter()
        .map(|version| {
            let record = serde_json::json!({
                "name": name,
                "version": version,
                "dependencies": { "lib-a": "^1.0.0", "lib-b": "~2.3.0" },
                "devDependencies": { "test-tool": "^9.0.0" },
                "dist": {
                    "tarball": format!("https://registry.npmjs.org/{0}/-/{0}-{1}.tgz", name, version),
                    "shasum": "0000000000000000000000000000000000000000"
                }
            });
            (version, record)
        })
        .collect();

    serde_json::json!({
        "name": name,
        "dist-tags": { "latest": "1.0.0" },
        "versions": versions,
    })
    .to_string()
}

/// `count` distinct version strings, including some prereleases
pub fn version_strings(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let version = format!("{}.{}.{}", i / 100, (i / 10) % 10, i % 10);
            if i % 7 == 0 {
                format!("{}-beta.{}", version, i % 3)
            } else {
                version
            }
        })
        .collect()
}
