//! Unit tests for CLI commands.

use super::*;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::output::OutputHandler;

fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test command context in a temporary directory
fn create_test_context(temp_dir: &TempDir, globals: GlobalOptions) -> CommandContext {
    let cwd = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    CommandContext {
        loader: ConfigLoader::new(cwd.clone()).with_home(None),
        cwd,
        output: OutputHandler::new(),
        globals,
        env: HashMap::new(),
    }
}

fn tarball(server: &MockServer, name: &str, version: &str) -> String {
    format!("{}/{}/-/{}-{}.tgz", server.uri(), name, name, version)
}

async fn publish(server: &MockServer, name: &str, versions: &[(&str, serde_json::Value)]) {
    let latest = versions.last().map(|(version, _)| *version).unwrap();
    let documents: serde_json::Map<_, _> = versions
        .iter()
        .map(|(version, dependencies)| {
            (
                version.to_string(),
                serde_json::json!({
                    "name": name,
                    "version": version,
                    "dependencies": dependencies,
                    "dist": { "tarball": tarball(server, name, version) }
                }),
            )
        })
        .collect();

    Mock::given(method("GET"))
        .and(path(format!("/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": name,
            "dist-tags": { "latest": latest },
            "versions": documents,
        })))
        .mount(server)
        .await;
}

async fn example_registry() -> MockServer {
    let server = MockServer::start().await;
    publish(
        &server,
        "app",
        &[("1.0.0", serde_json::json!({ "lib-a": "^1.0.0", "lib-b": "latest" }))],
    )
    .await;
    publish(
        &server,
        "lib-a",
        &[
            ("1.0.0", serde_json::json!({})),
            ("1.2.0", serde_json::json!({ "lib-b": "^3.0.0" })),
        ],
    )
    .await;
    publish(
        &server,
        "lib-b",
        &[("3.0.0", serde_json::json!({})), ("3.1.0", serde_json::json!({}))],
    )
    .await;
    publish(&server, "test-tool", &[("1.0.0", serde_json::json!({}))]).await;
    server
}

#[tokio::test]
async fn test_resolve_writes_output_file() {
    let server = example_registry().await;
    let temp_dir = create_temp_dir();
    let ctx = create_test_context(
        &temp_dir,
        GlobalOptions {
            registry: Some(server.uri()),
            output: Some(Utf8PathBuf::from("artifacts.txt")),
            ..GlobalOptions::default()
        },
    );

    resolve::execute("app", None, false, false, &ctx).await.unwrap();

    let written = std::fs::read_to_string(temp_dir.path().join("artifacts.txt")).unwrap();
    let lines: Vec<_> = written.lines().collect();
    assert_eq!(
        lines,
        vec![
            tarball(&server, "app", "1.0.0"),
            tarball(&server, "lib-a", "1.2.0"),
            tarball(&server, "lib-b", "3.1.0"),
        ]
    );
}

#[tokio::test]
async fn test_resolve_with_range_flag() {
    let server = example_registry().await;
    let temp_dir = create_temp_dir();
    let ctx = create_test_context(
        &temp_dir,
        GlobalOptions {
            registry: Some(server.uri()),
            output: Some(Utf8PathBuf::from("out.txt")),
            json: true,
            ..GlobalOptions::default()
        },
    );

    resolve::execute("lib-a@^1.2.0", Some("1.0.0".to_string()), false, false, &ctx)
        .await
        .unwrap();

    let written = std::fs::read_to_string(temp_dir.path().join("out.txt")).unwrap();
    assert_eq!(written, format!("{}\n", tarball(&server, "lib-a", "1.0.0")));
}

#[tokio::test]
async fn test_resolve_invalid_specifier() {
    let temp_dir = create_temp_dir();
    let ctx = create_test_context(&temp_dir, GlobalOptions::default());

    let result = resolve::execute("@scope", None, false, false, &ctx).await;
    assert!(matches!(result, Err(CrawlError::InvalidSpecifier { .. })));
}

#[tokio::test]
async fn test_resolve_rejects_bad_registry() {
    let temp_dir = create_temp_dir();
    let ctx = create_test_context(
        &temp_dir,
        GlobalOptions {
            registry: Some("ftp://registry.example.com".to_string()),
            ..GlobalOptions::default()
        },
    );

    let result = resolve::execute("app", None, false, false, &ctx).await;
    assert!(matches!(result, Err(CrawlError::ConfigValidation { .. })));
}

#[tokio::test]
async fn test_manifest_with_dev_dependencies() {
    let server = example_registry().await;
    let temp_dir = create_temp_dir();
    std::fs::write(
        temp_dir.path().join("package.json"),
        r#"{
            "name": "my-project",
            "version": "0.1.0",
            "dependencies": { "lib-a": "^1.0.0" },
            "devDependencies": { "test-tool": "^9.9.9" }
        }"#,
    )
    .unwrap();

    let ctx = create_test_context(
        &temp_dir,
        GlobalOptions {
            registry: Some(server.uri()),
            output: Some(Utf8PathBuf::from("artifacts.txt")),
            ..GlobalOptions::default()
        },
    );

    manifest::execute(None, true, false, &ctx).await.unwrap();

    // test-tool has no 9.x release, so it is skipped
    let written = std::fs::read_to_string(temp_dir.path().join("artifacts.txt")).unwrap();
    assert_eq!(written.lines().count(), 2);
    assert!(!written.contains("test-tool"));
}

#[tokio::test]
async fn test_manifest_uses_project_config() {
    let server = example_registry().await;
    let temp_dir = create_temp_dir();
    std::fs::write(
        temp_dir.path().join("package.json"),
        r#"{ "devDependencies": { "test-tool": "*" } }"#,
    )
    .unwrap();
    std::fs::write(
        temp_dir.path().join("crawl.toml"),
        format!("[registry]\nurl = \"{}\"\n\n[resolve]\ndev = true\n", server.uri()),
    )
    .unwrap();

    let ctx = create_test_context(
        &temp_dir,
        GlobalOptions {
            output: Some(Utf8PathBuf::from("artifacts.txt")),
            ..GlobalOptions::default()
        },
    );

    manifest::execute(Some(Utf8PathBuf::from(".")), false, false, &ctx)
        .await
        .unwrap();

    let written = std::fs::read_to_string(temp_dir.path().join("artifacts.txt")).unwrap();
    assert_eq!(written, format!("{}\n", tarball(&server, "test-tool", "1.0.0")));
}

#[tokio::test]
async fn test_manifest_missing() {
    let temp_dir = create_temp_dir();
    let ctx = create_test_context(&temp_dir, GlobalOptions::default());

    let result = manifest::execute(Some(Utf8PathBuf::from("nope.json")), false, false, &ctx).await;
    assert!(matches!(result, Err(CrawlError::Io { .. })));
}

#[tokio::test]
async fn test_context_resolver_applies_deadline() {
    let temp_dir = create_temp_dir();
    let ctx = create_test_context(
        &temp_dir,
        GlobalOptions {
            deadline_secs: Some(3),
            ..GlobalOptions::default()
        },
    );

    let config = ctx.load_config(true, false).await.unwrap();
    assert_eq!(config.deadline(), Some(Duration::from_secs(3)));
    assert!(resolve_options(&config).include_dev);
    assert!(ctx.resolver(&config).is_ok());
}

#[test]
fn test_report_json_shape() {
    let report = report::Report {
        artifacts: ["https://r.example/a.tgz".to_string()].into_iter().collect(),
        skipped: Vec::new(),
        stats: crawl_registry::CacheStats {
            entries: 1,
            cache_hits: 0,
            registry_fetches: 1,
        },
        elapsed: Duration::from_millis(12),
    };

    let value = report.to_json();
    assert_eq!(value["artifacts"][0], "https://r.example/a.tgz");
    assert_eq!(value["stats"]["registryFetches"], 1);
    assert_eq!(report.artifact_list(), "https://r.example/a.tgz\n");
}
