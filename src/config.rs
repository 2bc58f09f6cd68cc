//! Configuration management for the delivery pipeline

use crate::error::{DeliveryError, Result};
use crate::models::CachePolicy;
use crate::provider::{FileProvider, TransformProvider};
use crate::route_table::{RouteMapping, RouteTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Top-level configuration for the delivery pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Global path prefix under which all mappings are nested (default: "/files")
    #[serde(default = "default_global_prefix")]
    pub global_prefix: String,

    /// Root directory of the on-disk artifact cache
    #[serde(default = "default_cache_root")]
    pub cache_root: String,

    /// Ordered route mappings; first match wins
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,

    /// Listen address for the demo server binary
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

/// One configured route mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Relative path prefixes, each with a leading slash
    pub prefixes: Vec<String>,

    /// Root directory the file provider serves from
    pub source_root: String,

    /// Whether paths under this mapping encode image transformations
    #[serde(default)]
    pub transforms: bool,

    /// Cache policy (default: no-cache with validators)
    #[serde(default = "default_policy")]
    pub policy: CachePolicy,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        DeliveryConfig {
            global_prefix: default_global_prefix(),
            cache_root: default_cache_root(),
            mappings: Vec::new(),
            listen_address: default_listen_address(),
        }
    }
}

impl DeliveryConfig {
    /// Load configuration from a YAML file
    ///
    /// The loaded configuration is validated before being returned, so a
    /// bad file fails here and never reaches request handling.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DeliveryError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: DeliveryConfig = serde_yaml::from_str(&content).map_err(|e| {
            DeliveryError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Enforced eagerly, before any provider or route table is built:
    /// - the mapping set must be non-empty
    /// - every mapping needs at least one non-empty prefix, each starting
    ///   with '/'
    /// - every mapping needs a source root
    /// - `public` and `private` cache policies are rejected
    pub fn validate(&self) -> Result<()> {
        if self.cache_root.trim().is_empty() {
            return Err(DeliveryError::Config(
                "cache_root must not be empty".to_string(),
            ));
        }

        if self.mappings.is_empty() {
            return Err(DeliveryError::Config(
                "at least one mapping is required".to_string(),
            ));
        }

        for (index, mapping) in self.mappings.iter().enumerate() {
            if mapping.prefixes.iter().all(|p| p.trim().is_empty()) {
                return Err(DeliveryError::Config(format!(
                    "mapping {}: no non-empty path prefixes",
                    index
                )));
            }
            for prefix in &mapping.prefixes {
                let trimmed = prefix.trim();
                if !trimmed.is_empty() && !trimmed.starts_with('/') {
                    return Err(DeliveryError::Config(format!(
                        "mapping {}: prefix '{}' must start with '/'",
                        index, trimmed
                    )));
                }
            }
            if mapping.source_root.trim().is_empty() {
                return Err(DeliveryError::Config(format!(
                    "mapping {}: source_root must not be empty",
                    index
                )));
            }
            if !mapping.policy.is_allowed() {
                return Err(DeliveryError::Config(format!(
                    "mapping {}: cache policy '{}' is not allowed; use no-cache or no-store",
                    index,
                    mapping.policy.cache_control()
                )));
            }
        }

        Ok(())
    }

    /// Build the route table this configuration describes
    ///
    /// File providers are rooted at each mapping's `source_root`; mappings
    /// flagged with `transforms` get a pass-through transform wrapper that
    /// a real codec replaces when one is wired in programmatically.
    pub fn build_route_table(&self) -> Result<RouteTable> {
        let mut mappings = Vec::with_capacity(self.mappings.len());
        for mapping_config in &self.mappings {
            let files: Arc<FileProvider> = Arc::new(FileProvider::new(&mapping_config.source_root));
            let mapping = if mapping_config.transforms {
                RouteMapping::new(
                    mapping_config.prefixes.clone(),
                    Arc::new(TransformProvider::passthrough(files)),
                    mapping_config.policy,
                )
                .with_transforms()
            } else {
                RouteMapping::new(mapping_config.prefixes.clone(), files, mapping_config.policy)
            };
            mappings.push(mapping);
        }
        RouteTable::new(self.global_prefix.clone(), mappings)
    }
}

// Default value functions for serde
fn default_global_prefix() -> String {
    "/files".to_string()
}

fn default_cache_root() -> String {
    "/var/cache/artifact-delivery".to_string()
}

fn default_listen_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_policy() -> CachePolicy {
    CachePolicy::NoCache
}
