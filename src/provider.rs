//! Resource provider capability interface
//!
//! A provider is the pipeline's only source of bytes: given a logical,
//! provider-relative path it can report source timestamps and produce the
//! full payload. The cache and delivery layers depend solely on this seam,
//! so how bytes are ultimately produced (plain file read, image transcode)
//! stays fully decoupled from caching and HTTP semantics.

use crate::error::{DeliveryError, Result};
use crate::models::{ImageTransform, SourceMetadata, TransformRequest};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A produced payload together with its content type
#[derive(Debug)]
pub struct ProducedArtifact {
    pub body: Bytes,
    pub content_type: String,
}

/// Capability interface for producing artifact bytes
///
/// Both operations are asynchronous and cancellable, and may fail with
/// `NotFound` or `AccessDenied`; the delivery handler collapses those two
/// into one silent outcome.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Stat the source resource
    ///
    /// Returns `Ok(None)` when the resource does not exist. Errors are
    /// reserved for conditions other than plain absence.
    async fn metadata(&self, source_path: &str) -> Result<Option<SourceMetadata>>;

    /// Produce the full payload for a request
    async fn produce(
        &self,
        request: &TransformRequest,
        cancel: &CancellationToken,
    ) -> Result<ProducedArtifact>;
}

/// Provider serving plain files under a root directory
pub struct FileProvider {
    root: PathBuf,
}

impl FileProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileProvider { root: root.into() }
    }

    /// Map a logical path into the root, rejecting escapes
    ///
    /// Any path that is empty, absolute, or contains a parent component is
    /// reported as not found rather than as a distinct rejection.
    fn resolve_path(&self, source_path: &str) -> Result<PathBuf> {
        let trimmed = source_path.trim_start_matches('/');
        let relative = Path::new(trimmed);
        if trimmed.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(DeliveryError::NotFound(source_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResourceProvider for FileProvider {
    async fn metadata(&self, source_path: &str) -> Result<Option<SourceMetadata>> {
        let path = match self.resolve_path(source_path) {
            Ok(p) => p,
            Err(_) => return Ok(None),
        };
        match fs::metadata(&path).await {
            Ok(meta) => {
                let last_modified = meta.modified()?;
                // Creation time is not available on every filesystem
                let created = meta.created().unwrap_or(last_modified);
                Ok(Some(SourceMetadata {
                    last_modified,
                    created,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DeliveryError::from_source_io(e, source_path)),
        }
    }

    async fn produce(
        &self,
        request: &TransformRequest,
        cancel: &CancellationToken,
    ) -> Result<ProducedArtifact> {
        let path = self.resolve_path(&request.source_path)?;
        debug!("Producing file artifact from {:?}", path);

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DeliveryError::Cancelled),
            read = fs::read(&path) => {
                read.map_err(|e| DeliveryError::from_source_io(e, &request.source_path))?
            }
        };

        let content_type = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(ProducedArtifact {
            body: Bytes::from(body),
            content_type,
        })
    }
}

/// Transformation function applied to raw source bytes
pub type TransformFn = dyn Fn(Bytes, &ImageTransform) -> Result<Bytes> + Send + Sync;

/// Provider that transforms the payload of an inner provider
///
/// The actual pixel-level codec lives behind [`TransformFn`]; this wrapper
/// only owns the sequencing: fetch raw bytes, apply the transform when the
/// request asks for one, and stamp the output content type.
pub struct TransformProvider {
    inner: Arc<dyn ResourceProvider>,
    transform: Arc<TransformFn>,
}

impl TransformProvider {
    pub fn new(inner: Arc<dyn ResourceProvider>, transform: Arc<TransformFn>) -> Self {
        TransformProvider { inner, transform }
    }

    /// Wrap a provider with an identity transform
    ///
    /// Useful for wiring the pipeline before a real codec is plugged in:
    /// virtual paths resolve and cache normally, bytes pass through
    /// unchanged.
    pub fn passthrough(inner: Arc<dyn ResourceProvider>) -> Self {
        TransformProvider {
            inner,
            transform: Arc::new(|body, _| Ok(body)),
        }
    }
}

#[async_trait]
impl ResourceProvider for TransformProvider {
    async fn metadata(&self, source_path: &str) -> Result<Option<SourceMetadata>> {
        self.inner.metadata(source_path).await
    }

    async fn produce(
        &self,
        request: &TransformRequest,
        cancel: &CancellationToken,
    ) -> Result<ProducedArtifact> {
        let raw_request = TransformRequest::file(request.source_path.clone());
        let raw = self.inner.produce(&raw_request, cancel).await?;

        match &request.transform {
            Some(t) => {
                let body = (self.transform)(raw.body, t)?;
                Ok(ProducedArtifact {
                    body,
                    content_type: t.format.content_type().to_string(),
                })
            }
            None => Ok(raw),
        }
    }
}
