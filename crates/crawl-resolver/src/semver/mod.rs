//! Version selection against npm version ranges
//!
//! Picks the concrete version a (name, range) edge resolves to: the
//! `latest` dist-tag when no range is given, otherwise the highest
//! published version satisfying the range.

use node_semver::{Range, Version};

use crawl_core::error::CrawlError;
use crawl_registry::PackageDocument;

use crate::ResolverResult;

/// Version selector for finding best matching versions
#[derive(Debug, Clone)]
pub struct VersionSelector<'a> {
    /// Parsed published versions, sorted in descending order
    available: Vec<(Version, &'a str)>,
}

impl<'a> VersionSelector<'a> {
    /// Create a selector over published version strings.
    ///
    /// Strings that are not valid semver are ignored.
    pub fn new(versions: impl IntoIterator<Item = &'a str>) -> Self {
        let mut available: Vec<_> = versions
            .into_iter()
            .filter_map(|raw| Version::parse(raw).ok().map(|parsed| (parsed, raw)))
            .collect();
        available.sort_by(|a, b| b.0.cmp(&a.0));
        Self { available }
    }

    /// Highest version satisfying `range`
    pub fn max_satisfying(&self, range: &Range) -> Option<&'a str> {
        self.available
            .iter()
            .find(|(version, _)| range.satisfies(version))
            .map(|(_, raw)| *raw)
    }
}

/// Select the version of `name` an edge with `range` resolves to.
///
/// A range naming a dist-tag (`next`, `beta`) selects that tag. An empty
/// range behaves like `*`. Ranges that do not parse (git URLs, `file:`
/// specs) and ranges nothing satisfies yield `NoSatisfyingVersion`.
pub fn select_version(
    name: &str,
    document: &PackageDocument,
    range: Option<&str>,
) -> ResolverResult<String> {
    let no_match = |range: &str| CrawlError::NoSatisfyingVersion {
        name: name.to_string(),
        range: range.to_string(),
    };

    let Some(range) = range.map(str::trim) else {
        return document
            .latest()
            .map(str::to_string)
            .ok_or_else(|| no_match("latest"));
    };

    if let Some(tagged) = document.dist_tag(range) {
        return Ok(tagged.to_string());
    }

    let expression = if range.is_empty() { "*" } else { range };
    let parsed = Range::parse(expression).map_err(|_| no_match(range))?;

    VersionSelector::new(document.version_strings())
        .max_satisfying(&parsed)
        .map(str::to_string)
        .ok_or_else(|| no_match(range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn document(versions: &[&str], latest: &str) -> PackageDocument {
        serde_json::from_value(serde_json::json!({
            "dist-tags": { "latest": latest, "next": "2.0.0" },
            "versions": versions
                .iter()
                .map(|v| (v.to_string(), serde_json::json!({ "version": v })))
                .collect::<serde_json::Map<_, _>>(),
        }))
        .unwrap()
    }

    fn create_document() -> PackageDocument {
        document(
            &["1.0.0", "1.1.0", "1.2.0", "2.0.0-alpha.1", "2.0.0", "2.1.0"],
            "1.2.0",
        )
    }

    #[test]
    fn test_version_selector_ignores_invalid_versions() {
        let selector = VersionSelector::new(["1.0.0", "not-a-version", "2.0.0"]);
        let any = Range::parse("*").unwrap();
        assert_eq!(selector.max_satisfying(&any), Some("2.0.0"));
        assert_eq!(
            selector.max_satisfying(&Range::parse("<2.0.0").unwrap()),
            Some("1.0.0")
        );
    }

    #[test]
    fn test_absent_range_selects_latest_tag() {
        let doc = create_document();
        // latest is deliberately not the highest published version
        assert_eq!(select_version("lib-a", &doc, None).unwrap(), "1.2.0");
    }

    #[test]
    fn test_caret_range_selects_max_satisfying() {
        let doc = create_document();
        assert_eq!(select_version("lib-a", &doc, Some("^1.0.0")).unwrap(), "1.2.0");
        assert_eq!(select_version("lib-a", &doc, Some("~1.1.0")).unwrap(), "1.1.0");
        assert_eq!(select_version("lib-a", &doc, Some(">=1.0.0 <2.0.0")).unwrap(), "1.2.0");
        assert_eq!(select_version("lib-a", &doc, Some("1.x || 2.x")).unwrap(), "2.1.0");
    }

    #[test]
    fn test_prereleases_excluded_unless_requested() {
        let doc = document(&["1.0.0", "2.0.0-alpha.1"], "1.0.0");
        assert_eq!(select_version("lib-a", &doc, Some(">=1.0.0")).unwrap(), "1.0.0");
        assert_eq!(
            select_version("lib-a", &doc, Some(">=2.0.0-alpha.0")).unwrap(),
            "2.0.0-alpha.1"
        );
    }

    #[test]
    fn test_wildcards() {
        let doc = create_document();
        assert_eq!(select_version("lib-a", &doc, Some("*")).unwrap(), "2.1.0");
        assert_eq!(select_version("lib-a", &doc, Some("")).unwrap(), "2.1.0");
    }

    #[test]
    fn test_dist_tag_range() {
        let doc = create_document();
        assert_eq!(select_version("lib-a", &doc, Some("next")).unwrap(), "2.0.0");
        assert_eq!(select_version("lib-a", &doc, Some("latest")).unwrap(), "1.2.0");
    }

    #[test]
    fn test_no_satisfying_version() {
        let doc = document(&["1.0.0"], "1.0.0");
        match select_version("test-tool", &doc, Some("^9.9.9")) {
            Err(CrawlError::NoSatisfyingVersion { name, range }) => {
                assert_eq!(name, "test-tool");
                assert_eq!(range, "^9.9.9");
            }
            other => panic!("Expected NoSatisfyingVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_range() {
        let doc = document(&["1.0.0"], "1.0.0");
        let result = select_version("lib-a", &doc, Some("git+https://example.com/lib-a.git"));
        assert!(matches!(result, Err(CrawlError::NoSatisfyingVersion { .. })));
    }

    #[test]
    fn test_document_without_latest_tag() {
        let doc: PackageDocument = serde_json::from_str(r#"{ "versions": {} }"#).unwrap();
        assert!(select_version("empty", &doc, None).is_err());
    }

    proptest! {
        #[test]
        fn selected_version_is_the_highest_match(
            versions in proptest::collection::btree_set((0u64..4, 0u64..4, 0u64..4), 1..12),
            major in 1u64..4,
        ) {
            let strings: Vec<String> = versions
                .iter()
                .map(|(a, b, c)| format!("{}.{}.{}", a, b, c))
                .collect();
            let refs: Vec<&str> = strings.iter().map(String::as_str).collect();
            let doc = document(&refs, refs[0]);
            let range = format!("^{}.0.0", major);

            let expected = versions
                .iter()
                .filter(|(a, _, _)| *a == major)
                .max()
                .map(|(a, b, c)| format!("{}.{}.{}", a, b, c));

            match select_version("pkg", &doc, Some(&range)) {
                Ok(selected) => prop_assert_eq!(Some(selected), expected),
                Err(_) => prop_assert!(expected.is_none()),
            }
        }
    }
}
