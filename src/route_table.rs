//! Path-prefix routing table
//!
//! Maps an incoming request path to a (provider, cache policy) mapping.
//! Mappings are flattened at build time into an ordered prefix list and
//! resolution is a linear first-match-wins scan with ordinal,
//! case-insensitive comparison. Mapping counts are tens, not thousands,
//! so a scan beats a trie and keeps registration order observable: a
//! `/a/` mapping registered before `/a/b/` shadows it, and that ordering
//! is part of the contract rather than something to silently "fix".

use crate::error::{DeliveryError, Result};
use crate::models::CachePolicy;
use crate::provider::ResourceProvider;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One route: a set of path prefixes bound to a provider and cache policy
pub struct RouteMapping {
    /// Normalized relative prefixes (lower-cased, leading slash, deduped)
    pub prefixes: Vec<String>,
    pub provider: Arc<dyn ResourceProvider>,
    pub policy: CachePolicy,
    /// Whether request paths under this mapping encode a transformation
    /// via the virtual path scheme
    pub decodes_transforms: bool,
}

impl RouteMapping {
    pub fn new(
        prefixes: Vec<String>,
        provider: Arc<dyn ResourceProvider>,
        policy: CachePolicy,
    ) -> Self {
        RouteMapping {
            prefixes,
            provider,
            policy,
            decodes_transforms: false,
        }
    }

    pub fn with_transforms(mut self) -> Self {
        self.decodes_transforms = true;
        self
    }
}

/// A resolved route: the mapping plus the path remainder after its prefix
pub struct RouteMatch<'a> {
    pub mapping: &'a RouteMapping,
    /// Request path after the matched prefix, without a leading slash;
    /// this is the provider-relative logical path (or virtual path)
    pub remainder: &'a str,
}

/// Ordered prefix routing table, validated eagerly at build time
pub struct RouteTable {
    global_prefix: String,
    mappings: Vec<RouteMapping>,
    /// Flattened (prefix, mapping index) pairs in registration order
    entries: Vec<(String, usize)>,
}

impl RouteTable {
    /// Build and validate a routing table
    ///
    /// Fails fast with a configuration error when the mapping set is
    /// empty, any mapping has no usable prefix, any prefix lacks a leading
    /// slash, or a mapping selects a `Public`/`Private` cache policy
    /// (shared-cache headers are unsafe for per-request keyed content).
    pub fn new(global_prefix: impl Into<String>, mappings: Vec<RouteMapping>) -> Result<Self> {
        let global_prefix = global_prefix.into().trim_end_matches('/').to_string();

        if mappings.is_empty() {
            return Err(DeliveryError::Config(
                "route table requires at least one mapping".to_string(),
            ));
        }

        let mut normalized_mappings = Vec::with_capacity(mappings.len());
        let mut entries = Vec::new();

        for (index, mut mapping) in mappings.into_iter().enumerate() {
            if !mapping.policy.is_allowed() {
                return Err(DeliveryError::Config(format!(
                    "mapping {}: cache policy '{}' is not allowed; use no-cache or no-store",
                    index,
                    mapping.policy.cache_control()
                )));
            }

            let mut seen = HashSet::new();
            let mut prefixes = Vec::new();
            for raw in &mapping.prefixes {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if !trimmed.starts_with('/') {
                    return Err(DeliveryError::Config(format!(
                        "mapping {}: prefix '{}' must start with '/'",
                        index, trimmed
                    )));
                }
                let lowered = trimmed.to_ascii_lowercase();
                if seen.insert(lowered.clone()) {
                    prefixes.push(lowered);
                }
            }

            if prefixes.is_empty() {
                return Err(DeliveryError::Config(format!(
                    "mapping {}: no non-empty path prefixes",
                    index
                )));
            }

            for prefix in &prefixes {
                entries.push((prefix.clone(), index));
            }
            mapping.prefixes = prefixes;
            normalized_mappings.push(mapping);
        }

        if entries.is_empty() {
            return Err(DeliveryError::Config(
                "route table has no usable path prefixes".to_string(),
            ));
        }

        Ok(RouteTable {
            global_prefix,
            mappings: normalized_mappings,
            entries,
        })
    }

    /// Resolve a request path to its first matching mapping
    ///
    /// The global prefix is stripped first; a path outside it never
    /// matches. Prefix comparison is ordinal and case-insensitive, and the
    /// first registered match wins.
    pub fn resolve<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a>> {
        let remainder = strip_prefix_ignore_case(path, &self.global_prefix)?;

        for (prefix, index) in &self.entries {
            if starts_with_ignore_case(remainder, prefix) {
                debug!("Route match: '{}' under prefix '{}'", path, prefix);
                return Some(RouteMatch {
                    mapping: &self.mappings[*index],
                    remainder: remainder[prefix.len()..].trim_start_matches('/'),
                });
            }
        }
        None
    }

    pub fn global_prefix(&self) -> &str {
        &self.global_prefix
    }
}

// Providers are trait objects, so show the routing shape instead
impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("global_prefix", &self.global_prefix)
            .field("entries", &self.entries)
            .finish()
    }
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

fn strip_prefix_ignore_case<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    if starts_with_ignore_case(path, prefix) {
        Some(&path[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FileProvider;

    fn provider() -> Arc<dyn ResourceProvider> {
        Arc::new(FileProvider::new("/tmp"))
    }

    fn mapping(prefixes: &[&str], policy: CachePolicy) -> RouteMapping {
        RouteMapping::new(
            prefixes.iter().map(|s| s.to_string()).collect(),
            provider(),
            policy,
        )
    }

    #[test]
    fn test_resolve_basic() {
        let table = RouteTable::new(
            "/files",
            vec![mapping(&["/images/"], CachePolicy::NoCache)],
        )
        .unwrap();

        let matched = table.resolve("/files/images/cat.jpg").unwrap();
        assert_eq!(matched.remainder, "cat.jpg");
        assert_eq!(matched.mapping.policy, CachePolicy::NoCache);
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let table = RouteTable::new(
            "/files",
            vec![mapping(&["/images/"], CachePolicy::NoCache)],
        )
        .unwrap();

        assert!(table.resolve("/FILES/Images/cat.jpg").is_some());
    }

    #[test]
    fn test_resolve_outside_global_prefix() {
        let table = RouteTable::new(
            "/files",
            vec![mapping(&["/images/"], CachePolicy::NoCache)],
        )
        .unwrap();

        assert!(table.resolve("/static/images/cat.jpg").is_none());
    }

    #[test]
    fn test_resolve_unmapped_path() {
        let table = RouteTable::new(
            "/files",
            vec![mapping(&["/images/"], CachePolicy::NoCache)],
        )
        .unwrap();

        assert!(table.resolve("/files/docs/readme.txt").is_none());
    }

    #[test]
    fn test_first_match_wins_over_more_specific() {
        // /a/ registered first shadows /a/b/ entirely; registration order
        // decides, not specificity
        let table = RouteTable::new(
            "/files",
            vec![
                mapping(&["/a/"], CachePolicy::NoCache),
                mapping(&["/a/b/"], CachePolicy::NoStore),
            ],
        )
        .unwrap();

        let matched = table.resolve("/files/a/b/x").unwrap();
        assert_eq!(matched.mapping.policy, CachePolicy::NoCache);
        assert_eq!(matched.remainder, "b/x");
    }

    #[test]
    fn test_empty_global_prefix() {
        let table =
            RouteTable::new("", vec![mapping(&["/images/"], CachePolicy::NoCache)]).unwrap();
        assert!(table.resolve("/images/cat.jpg").is_some());
    }

    #[test]
    fn test_prefixes_are_deduplicated() {
        let table = RouteTable::new(
            "/files",
            vec![mapping(&["/images/", "/IMAGES/", "  "], CachePolicy::NoCache)],
        )
        .unwrap();
        assert_eq!(table.mappings[0].prefixes, vec!["/images/".to_string()]);
    }

    #[test]
    fn test_rejects_empty_mapping_set() {
        let err = RouteTable::new("/files", vec![]).unwrap_err();
        assert!(matches!(err, DeliveryError::Config(_)));
    }

    #[test]
    fn test_rejects_mapping_without_prefixes() {
        let err =
            RouteTable::new("/files", vec![mapping(&["", "  "], CachePolicy::NoCache)]).unwrap_err();
        assert!(matches!(err, DeliveryError::Config(_)));
    }

    #[test]
    fn test_rejects_prefix_without_leading_slash() {
        let err =
            RouteTable::new("/files", vec![mapping(&["images/"], CachePolicy::NoCache)]).unwrap_err();
        assert!(matches!(err, DeliveryError::Config(_)));
    }

    #[test]
    fn test_debug_shows_routing_shape() {
        let table = RouteTable::new(
            "/files",
            vec![mapping(&["/images/"], CachePolicy::NoCache)],
        )
        .unwrap();

        let rendered = format!("{:?}", table);
        assert!(rendered.contains("/files"));
        assert!(rendered.contains("/images/"));
    }

    #[test]
    fn test_rejects_public_and_private_policies() {
        for policy in [CachePolicy::Public, CachePolicy::Private] {
            let err = RouteTable::new("/files", vec![mapping(&["/images/"], policy)]).unwrap_err();
            assert!(matches!(err, DeliveryError::Config(_)));
        }
    }
}
