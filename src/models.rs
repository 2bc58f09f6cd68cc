//! Core data models for the artifact delivery pipeline

use crate::error::{DeliveryError, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// Resize behavior for image-style transformation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Crop to fill the target dimensions exactly
    Crop,
    /// Pad to the target dimensions, preserving aspect ratio
    Pad,
    /// Shrink to fit within the target dimensions
    Max,
    /// Stretch to the target dimensions, ignoring aspect ratio
    Stretch,
}

impl ResizeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeMode::Crop => "crop",
            ResizeMode::Pad => "pad",
            ResizeMode::Max => "max",
            ResizeMode::Stretch => "stretch",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "crop" => Ok(ResizeMode::Crop),
            "pad" => Ok(ResizeMode::Pad),
            "max" => Ok(ResizeMode::Max),
            "stretch" => Ok(ResizeMode::Stretch),
            other => Err(DeliveryError::NotFound(format!(
                "unknown resize mode: {}",
                other
            ))),
        }
    }
}

/// Output encoding for image-style transformation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpg,
    Png,
    Gif,
    Webp,
}

impl OutputFormat {
    /// File extension used for cached artifacts and virtual paths
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Webp => "image/webp",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "png" => Ok(OutputFormat::Png),
            "gif" => Ok(OutputFormat::Gif),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(DeliveryError::NotFound(format!(
                "unknown output format: {}",
                other
            ))),
        }
    }
}

/// Parameters of an image-style transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageTransform {
    pub width: u32,
    pub height: u32,
    pub mode: ResizeMode,
    pub format: OutputFormat,
}

/// Immutable description of one requested artifact
///
/// A plain file request carries only the provider-relative source path; an
/// image-style request additionally carries every parameter that affects
/// the output bytes. The request is only ever used to derive a cache key
/// and to drive the provider; it is never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformRequest {
    /// Provider-relative logical path of the source resource
    pub source_path: String,
    /// Transformation parameters, absent for plain file requests
    pub transform: Option<ImageTransform>,
}

impl TransformRequest {
    /// Create a plain file request
    pub fn file(source_path: impl Into<String>) -> Self {
        TransformRequest {
            source_path: source_path.into(),
            transform: None,
        }
    }

    /// Create an image transformation request
    pub fn image(source_path: impl Into<String>, transform: ImageTransform) -> Self {
        TransformRequest {
            source_path: source_path.into(),
            transform: Some(transform),
        }
    }

    /// File extension for the artifact this request produces
    ///
    /// Transformed artifacts take the output format's extension; plain file
    /// artifacts keep the source extension.
    pub fn artifact_extension(&self) -> String {
        match &self.transform {
            Some(t) => t.format.extension().to_string(),
            None => std::path::Path::new(&self.source_path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("bin")
                .to_string(),
        }
    }
}

/// Timestamps of a source resource, as reported by its provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    pub last_modified: SystemTime,
    pub created: SystemTime,
}

impl SourceMetadata {
    /// True when either timestamp is newer than the given cache write time
    pub fn is_newer_than(&self, cached_at: SystemTime) -> bool {
        self.last_modified > cached_at || self.created > cached_at
    }
}

/// A stored artifact on disk, addressed by its cache key
///
/// Only metadata is carried here; the body is read lazily by the delivery
/// handler so that a 304 response never touches the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    /// Cache key, also the filename stem under the shard directory
    pub key: String,
    /// Shard-qualified path under the cache root
    pub path: PathBuf,
    /// Last-write timestamp of the cached copy
    pub last_modified: SystemTime,
    /// Payload length in bytes
    pub length: u64,
}

/// Per-route rule governing cache headers and validators
///
/// `Public` and `Private` exist so configuration can name them, but both
/// are rejected at validation time: artifacts are keyed per request and
/// must not land in shared HTTP caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Emit `Cache-Control: no-cache` plus `ETag` / `Last-Modified`
    NoCache,
    /// Emit `Cache-Control: no-store`, no validators
    NoStore,
    /// Disallowed; rejected at configuration time
    Public,
    /// Disallowed; rejected at configuration time
    Private,
}

impl CachePolicy {
    /// Whether this policy is allowed for dynamically keyed content
    pub fn is_allowed(&self) -> bool {
        matches!(self, CachePolicy::NoCache | CachePolicy::NoStore)
    }

    /// `Cache-Control` header value for this policy
    pub fn cache_control(&self) -> &'static str {
        match self {
            CachePolicy::NoCache => "no-cache",
            CachePolicy::NoStore => "no-store",
            CachePolicy::Public => "public",
            CachePolicy::Private => "private",
        }
    }

    /// Whether `ETag` / `Last-Modified` validators are emitted
    pub fn sends_validators(&self) -> bool {
        matches!(self, CachePolicy::NoCache)
    }
}

/// Terminal state of one pass through the delivery pipeline
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// 200: full body with content and cache headers
    Delivered { headers: HeaderMap, body: Bytes },
    /// 304: validators matched, no body
    NotModified { headers: HeaderMap },
    /// 404: no artifact, deliberately silent
    NotFound,
    /// No route matched; the next handler in the chain owns the request
    PassThrough,
}

impl DeliveryOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            DeliveryOutcome::Delivered { .. } => StatusCode::OK,
            DeliveryOutcome::NotModified { .. } => StatusCode::NOT_MODIFIED,
            DeliveryOutcome::NotFound => StatusCode::NOT_FOUND,
            DeliveryOutcome::PassThrough => StatusCode::NOT_FOUND,
        }
    }
}
