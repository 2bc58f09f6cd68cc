//! Artifact Delivery Pipeline
//!
//! A computed-artifact cache and conditional-delivery pipeline for serving
//! expensively produced byte payloads (resized images, generated files,
//! any file-like resource) through an HTTP request path.
//!
//! # Overview
//!
//! Incoming request paths are matched against a prefix routing table that
//! binds each prefix to a resource provider and a cache policy. Resolved
//! requests are served from a sharded on-disk artifact cache keyed by a
//! deterministic digest of every output-affecting parameter; cached copies
//! are invalidated when the backing source changes. Responses carry
//! `ETag` / `Last-Modified` validators and honor `If-None-Match` /
//! `If-Modified-Since`, so unchanged content is answered with a bodiless
//! `304` without touching the payload on disk.
//!
//! # Architecture
//!
//! - [`DeliveryHandler`]: per-request orchestration and the conditional-GET
//!   state machine
//! - [`RouteTable`]: validated, ordered, first-match-wins prefix routing
//! - [`ArtifactCache`]: sharded disk store with source-staleness
//!   invalidation
//! - [`ResourceProvider`]: capability interface producing bytes, lengths
//!   and timestamps ([`FileProvider`], [`TransformProvider`])
//! - [`conditional`]: pure ETag / HTTP-date codec
//! - [`cache_key`]: deterministic key derivation
//! - [`virtual_path`]: codec for the transformation URL scheme
//! - [`DeliveryMetrics`]: runtime counters
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use artifact_delivery::{ArtifactCache, DeliveryConfig, DeliveryHandler};
//! use http::HeaderMap;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeliveryConfig::from_file("artifact_delivery.yaml")?;
//! let handler = DeliveryHandler::new(
//!     config.build_route_table()?,
//!     ArtifactCache::new(&config.cache_root),
//! );
//!
//! let outcome = handler
//!     .handle("/files/images/cat.jpg", &HeaderMap::new(), &CancellationToken::new())
//!     .await?;
//! println!("status: {}", outcome.status());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from a YAML file and validated eagerly; an
//! invalid mapping set or a `public`/`private` cache policy fails at
//! startup, never at request time:
//!
//! ```yaml
//! global_prefix: /files
//! cache_root: /var/cache/artifact-delivery
//! listen_address: 127.0.0.1:8080
//! mappings:
//!   - prefixes: ["/images/"]
//!     source_root: /srv/images
//!     transforms: true
//!   - prefixes: ["/docs/"]
//!     source_root: /srv/docs
//!     policy: no-store
//! ```
//!
//! # Non-goals
//!
//! Range requests (`206` partial content) are not supported: a `Range`
//! header is ignored and the full body is served. There is no reverse
//! proxying and no shared-cache (`public`/`private`) header emission.

pub mod artifact_cache;
pub mod cache_key;
pub mod conditional;
pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod models;
pub mod provider;
pub mod route_table;
pub mod virtual_path;

// Re-export commonly used types
pub use artifact_cache::{ArtifactCache, ResolvedArtifact};
pub use config::{DeliveryConfig, MappingConfig};
pub use error::{DeliveryError, Result};
pub use handler::DeliveryHandler;
pub use metrics::{DeliveryMetrics, MetricsSnapshot};
pub use models::{
    CachePolicy, CachedArtifact, DeliveryOutcome, ImageTransform, OutputFormat, ResizeMode,
    SourceMetadata, TransformRequest,
};
pub use provider::{FileProvider, ProducedArtifact, ResourceProvider, TransformProvider};
pub use route_table::{RouteMapping, RouteMatch, RouteTable};
